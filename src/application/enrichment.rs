//! Enrichment phase: queue drainer
//!
//! Pulls every incident still staged in the enrichment queue, fetches its
//! three detail pages, and writes the merged fields plus the queue removal
//! in one transaction. Any fetch or parse failure is fatal for that
//! incident and commits nothing, so the entry stays queued and the next
//! drain pass retries it - at-least-once draining over an idempotent
//! overwrite.

use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::domain::docket::DetailFields;
use crate::domain::error::{CrawlError, CrawlResult};
use crate::infrastructure::config::CrawlerConfig;
use crate::infrastructure::docket_repository::DocketRepository;
use crate::infrastructure::http_client::HttpClient;
use crate::infrastructure::parsing::DetailParser;

#[derive(Clone)]
pub struct EnrichmentEngine {
    config: Arc<CrawlerConfig>,
    http: HttpClient,
    dockets: DocketRepository,
    parser: Arc<DetailParser>,
}

impl EnrichmentEngine {
    pub fn new(config: CrawlerConfig, pool: SqlitePool) -> CrawlResult<Self> {
        let http = HttpClient::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            http,
            dockets: DocketRepository::new(pool),
            parser: Arc::new(DetailParser::new()?),
        })
    }

    /// Drain the current incomplete set once. Returns how many incidents
    /// were completed; callers loop until the set is empty.
    pub async fn run(&self) -> CrawlResult<u64> {
        let pending = self.dockets.select_incomplete().await?;
        if pending.is_empty() {
            info!("enrichment queue is empty");
            return Ok(0);
        }
        info!(pending = pending.len(), "starting enrichment pass");

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_workers));
        let mut handles = Vec::with_capacity(pending.len());

        for entry in pending {
            let engine = self.clone();
            let semaphore = Arc::clone(&semaphore);
            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.unwrap();
                engine.enrich(entry.incident_id).await
            }));
        }

        let mut completed = 0u64;
        let mut first_error: Option<CrawlError> = None;
        for handle in handles {
            match handle.await {
                Ok(Ok(())) => completed += 1,
                Ok(Err(err)) => {
                    warn!(error = %err, unit = ?err.unit_id(), "enrichment unit failed");
                    first_error.get_or_insert(err);
                }
                Err(join_err) => {
                    first_error.get_or_insert(CrawlError::Configuration(format!(
                        "enrichment worker aborted: {join_err}"
                    )));
                }
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }

        info!(completed, "enrichment pass finished");
        Ok(completed)
    }

    /// Enrich one incident: three independent detail fetches, then one
    /// transactional write. Nothing partial is ever committed.
    pub async fn enrich(&self, incident_id: i64) -> CrawlResult<()> {
        let general_body = self.http.fetch_page(&self.config.detail_url(incident_id)).await?;
        let class_label = self.parser.parse_general(&general_body, incident_id)?;

        let parties_body = self.http.fetch_page(&self.config.parties_url(incident_id)).await?;
        let parties = self.parser.parse_parties(&parties_body, incident_id)?;

        let info_body = self.http.fetch_page(&self.config.info_url(incident_id)).await?;
        let info = self.parser.parse_info(&info_body, incident_id)?;

        let details = DetailFields {
            class_label,
            parties,
            subjects: info.subjects,
            origin_court: info.origin_court,
            origin_place: info.origin_place,
            origin_numbers: info.origin_numbers,
        };

        let today = Utc::now().date_naive();
        self.dockets.write_details(incident_id, &details, today).await?;
        info!(incident_id, "incident enriched");
        Ok(())
    }
}
