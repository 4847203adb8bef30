//! Discovery phase: range scanner + bounded worker pool
//!
//! One pass probes the next `[start, start + step)` interval of the id
//! space, one worker task per id. Each worker fetches the listing page,
//! turns its rows into docket records and, per row, advances the class
//! checkpoint, upserts the docket and stages it in the enrichment queue.
//! The pass made progress iff re-reading the checkpoint with the same mode
//! yields a different start - callers loop until it does not.
//!
//! Failure policy: the first fatal error is surfaced only after every
//! dispatched worker has finished; siblings are never cancelled, and the
//! rows they already wrote stay valid because every write is idempotent.

use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::domain::docket::ScanMode;
use crate::domain::error::{CrawlError, CrawlResult};
use crate::infrastructure::checkpoint_repository::CheckpointRepository;
use crate::infrastructure::config::CrawlerConfig;
use crate::infrastructure::docket_repository::DocketRepository;
use crate::infrastructure::http_client::HttpClient;
use crate::infrastructure::parsing::ListingParser;

#[derive(Clone)]
pub struct DiscoveryEngine {
    config: Arc<CrawlerConfig>,
    http: HttpClient,
    checkpoints: CheckpointRepository,
    dockets: DocketRepository,
    parser: Arc<ListingParser>,
}

impl DiscoveryEngine {
    pub fn new(config: CrawlerConfig, pool: SqlitePool) -> CrawlResult<Self> {
        let http = HttpClient::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            http,
            checkpoints: CheckpointRepository::new(pool.clone()),
            dockets: DocketRepository::new(pool),
            parser: Arc::new(ListingParser::new()?),
        })
    }

    /// Run one discovery pass. Returns whether the pass made progress;
    /// `false` is terminal for this mode until new ids appear.
    pub async fn run(&self, mode: ScanMode) -> CrawlResult<bool> {
        if let ScanMode::Category(class_code) = &mode {
            if class_code.is_empty() {
                return Err(CrawlError::Configuration(
                    "category scan mode requires a class code".to_string(),
                ));
            }
        }
        if self.config.step < 1 {
            return Err(CrawlError::Configuration(format!(
                "step must be at least 1, got {}",
                self.config.step
            )));
        }

        let start = self.checkpoints.read(&mode).await?;
        let end = start + self.config.step;
        info!(?mode, start, end, "starting discovery pass");

        // Category mode scans for that class only; otherwise the configured
        // filter (if any) applies.
        let class_filter = match &mode {
            ScanMode::Category(class_code) => Some(class_code.clone()),
            _ => self.config.class_filter.clone(),
        };

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_workers));
        let mut handles = Vec::with_capacity(self.config.step as usize);

        for source_id in start..end {
            let engine = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let class_filter = class_filter.clone();
            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.unwrap();
                engine.discover_filtered(source_id, class_filter.as_deref()).await
            }));
        }

        // All workers are awaited before any error is surfaced; partial
        // results already written stay valid.
        let mut total_found = 0u64;
        let mut first_error: Option<CrawlError> = None;
        for handle in handles {
            match handle.await {
                Ok(Ok(count)) => total_found += u64::from(count),
                Ok(Err(err)) => {
                    warn!(error = %err, unit = ?err.unit_id(), "discovery unit failed");
                    first_error.get_or_insert(err);
                }
                Err(join_err) => {
                    first_error.get_or_insert(CrawlError::Configuration(format!(
                        "discovery worker aborted: {join_err}"
                    )));
                }
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }

        let after = self.checkpoints.read(&mode).await?;
        if after == start {
            info!(start, "no new ids found in current range");
            Ok(false)
        } else {
            info!(total_found, start, after, "discovery pass advanced");
            Ok(true)
        }
    }

    /// Probe one id of the id space. Returns how many references the
    /// listing page yielded; zero is a normal outcome, not an error.
    pub async fn discover(&self, source_id: i64) -> CrawlResult<u32> {
        self.discover_filtered(source_id, self.config.class_filter.as_deref())
            .await
    }

    async fn discover_filtered(
        &self,
        source_id: i64,
        class_filter: Option<&str>,
    ) -> CrawlResult<u32> {
        let url = self.config.listing_url(source_id);
        let body = self.http.fetch_page(&url).await?;

        let today = Utc::now().date_naive();
        let records = self
            .parser
            .parse(&body, source_id, today, class_filter)?;

        let mut found = 0u32;
        for record in &records {
            // Fixed per-row write order: checkpoint, docket upsert, queue.
            self.checkpoints
                .advance(&record.class_code, source_id)
                .await?;
            self.dockets.upsert_discovered(record).await?;
            self.dockets.enqueue(record.incident_id, source_id).await?;
            found += 1;
        }

        if found > 0 {
            info!(source_id, found, "discovered references");
        }
        Ok(found)
    }
}
