//! End-to-end crawl flows against a stub portal
//!
//! Discovery and enrichment run against a wiremock server and a temporary
//! sqlite database, exercising the full fetch -> parse -> persist path.

use anyhow::Result;
use chrono::NaiveDate;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tribunal_crawler::domain::docket::{ChannelKind, ScanMode, VisibilityKind};
use tribunal_crawler::infrastructure::checkpoint_repository::CheckpointRepository;
use tribunal_crawler::infrastructure::database_connection::DatabaseConnection;
use tribunal_crawler::infrastructure::docket_repository::DocketRepository;
use tribunal_crawler::{CrawlError, CrawlerConfig, DiscoveryEngine, EnrichmentEngine};

struct Harness {
    _db_dir: TempDir,
    server: MockServer,
    config: CrawlerConfig,
    pool: sqlx::SqlitePool,
}

impl Harness {
    async fn new(step: i64) -> Result<Self> {
        let server = MockServer::start().await;
        let db_dir = tempfile::tempdir()?;
        let database_url = format!("sqlite:{}", db_dir.path().join("crawl.db").display());

        let db = DatabaseConnection::new(&database_url).await?;
        db.migrate().await?;

        let config = CrawlerConfig {
            base_url: server.uri(),
            step,
            max_concurrent_workers: 8,
            request_timeout_seconds: 5,
            database_url,
            ..Default::default()
        };

        Ok(Self {
            _db_dir: db_dir,
            server,
            config,
            pool: db.pool().clone(),
        })
    }

    fn checkpoints(&self) -> CheckpointRepository {
        CheckpointRepository::new(self.pool.clone())
    }

    fn dockets(&self) -> DocketRepository {
        DocketRepository::new(self.pool.clone())
    }

    fn discovery(&self) -> DiscoveryEngine {
        DiscoveryEngine::new(self.config.clone(), self.pool.clone()).unwrap()
    }

    fn enrichment(&self) -> EnrichmentEngine {
        EnrichmentEngine::new(self.config.clone(), self.pool.clone()).unwrap()
    }

    /// Every listing id not mocked explicitly yields an empty result page.
    async fn mount_empty_listing_fallback(&self) {
        Mock::given(method("GET"))
            .and(path("/listarProcessos.asp"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><body><p>nenhum resultado</p></body></html>"),
            )
            .with_priority(50)
            .mount(&self.server)
            .await;
    }

    async fn mount_listing(&self, source_id: i64, body: &str) {
        Mock::given(method("GET"))
            .and(path("/listarProcessos.asp"))
            .and(query_param("numeroProcesso", source_id.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .with_priority(1)
            .mount(&self.server)
            .await;
    }
}

fn listing_row(incident_id: i64, class_and_number: &str, channel: &str, visibility: &str) -> String {
    format!(
        r#"<html><body><table>
            <tr><th>Processo</th><th>Número</th><th>Data</th><th>Meio</th><th>Tipo</th></tr>
            <tr>
              <td><a href="detalhe.asp?incidente={incident_id}">{class_and_number}</a></td>
              <td>0008944-23.2020.1.00.0000</td>
              <td>01/01/2020</td>
              <td>{channel}</td>
              <td>{visibility}</td>
            </tr>
        </table></body></html>"#
    )
}

#[tokio::test]
async fn discovery_extracts_and_checkpoints_a_reference() -> Result<()> {
    let harness = Harness::new(200).await?;
    harness.mount_empty_listing_fallback().await;
    // Pre-existing checkpoint puts the scan window at [100, 300).
    harness.checkpoints().advance("ADI", 100).await?;
    harness
        .mount_listing(150, &listing_row(5688839, "ADI 6341", "Eletrônico", "Público"))
        .await;

    let progressed = harness.discovery().run(ScanMode::Highest).await?;
    assert!(progressed);

    let record = harness.dockets().get_docket(5688839).await?.unwrap();
    assert_eq!(record.source_id, 150);
    assert_eq!(record.class_code, "ADI");
    assert_eq!(record.channel, ChannelKind::Electronic);
    assert_eq!(record.visibility, VisibilityKind::Public);
    assert_eq!(
        record.filed_date,
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
    );

    let checkpoint = harness
        .checkpoints()
        .read(&ScanMode::Category("ADI".to_string()))
        .await?;
    assert_eq!(checkpoint, 150);

    let queued = harness.dockets().select_incomplete().await?;
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].incident_id, 5688839);
    Ok(())
}

#[tokio::test]
async fn fully_scanned_range_reports_no_progress() -> Result<()> {
    let harness = Harness::new(50).await?;
    harness.mount_empty_listing_fallback().await;
    harness
        .mount_listing(20, &listing_row(1111, "HC 1234", "Físico", "Sigiloso"))
        .await;

    assert!(harness.discovery().run(ScanMode::Highest).await?);
    assert_eq!(harness.checkpoints().read(&ScanMode::Highest).await?, 20);

    // Second pass re-sees id 20 inside [20, 70) but finds nothing higher:
    // the checkpoint must not move and the pass reports no progress.
    assert!(!harness.discovery().run(ScanMode::Highest).await?);
    assert_eq!(harness.checkpoints().read(&ScanMode::Highest).await?, 20);

    // Re-discovery stayed idempotent: still exactly one docket, one entry.
    assert_eq!(harness.dockets().count_dockets().await?, 1);
    assert_eq!(harness.dockets().select_incomplete().await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn unknown_enum_label_fails_the_batch_without_writing() -> Result<()> {
    let harness = Harness::new(10).await?;
    harness.mount_empty_listing_fallback().await;
    harness
        .mount_listing(3, &listing_row(2222, "ADI 1", "Desconhecido", "Público"))
        .await;

    let err = harness.discovery().run(ScanMode::Highest).await.unwrap_err();
    assert!(matches!(err, CrawlError::UnknownEnumValue { .. }));

    assert!(harness.dockets().get_docket(2222).await?.is_none());
    assert_eq!(harness.checkpoints().read(&ScanMode::Highest).await?, 1);
    Ok(())
}

#[tokio::test]
async fn failing_unit_does_not_cancel_siblings() -> Result<()> {
    let harness = Harness::new(10).await?;
    harness.mount_empty_listing_fallback().await;
    // Id 4 serves a blank body (unparseable), id 7 a valid row.
    harness.mount_listing(4, "   ").await;
    harness
        .mount_listing(7, &listing_row(3333, "RE 555", "Eletrônico", "Público"))
        .await;

    let err = harness.discovery().run(ScanMode::Highest).await.unwrap_err();
    match err {
        CrawlError::InvalidSource { source_id } => assert_eq!(source_id, 4),
        other => panic!("expected InvalidSource, got {other:?}"),
    }

    // The sibling's writes survived the batch failure.
    assert!(harness.dockets().get_docket(3333).await?.is_some());
    assert_eq!(
        harness
            .checkpoints()
            .read(&ScanMode::Category("RE".to_string()))
            .await?,
        7
    );
    Ok(())
}

#[tokio::test]
async fn nonpositive_step_is_a_configuration_error() -> Result<()> {
    // A hand-edited config can carry a negative step; the pass must fail
    // up front instead of dispatching any workers.
    let harness = Harness::new(-5).await?;

    let err = harness.discovery().run(ScanMode::Highest).await.unwrap_err();
    assert!(matches!(err, CrawlError::Configuration(_)));
    assert!(harness.server.received_requests().await.unwrap().is_empty());
    assert_eq!(harness.checkpoints().read(&ScanMode::Highest).await?, 1);
    Ok(())
}

#[tokio::test]
async fn category_mode_scans_from_that_class_checkpoint() -> Result<()> {
    let harness = Harness::new(10).await?;
    harness.mount_empty_listing_fallback().await;
    harness.checkpoints().advance("ADI", 500).await?;
    harness.checkpoints().advance("HC", 40).await?;
    harness
        .mount_listing(42, &listing_row(4444, "HC 777", "Físico", "Público"))
        .await;

    let progressed = harness
        .discovery()
        .run(ScanMode::Category("HC".to_string()))
        .await?;
    assert!(progressed);
    assert_eq!(
        harness
            .checkpoints()
            .read(&ScanMode::Category("HC".to_string()))
            .await?,
        42
    );
    Ok(())
}

async fn mount_detail_pages(
    harness: &Harness,
    incident_id: i64,
    general: &str,
    parties: &str,
    info: &str,
) {
    for (page, body) in [
        ("/detalhe.asp", general),
        ("/abaPartes.asp", parties),
        ("/abaInformacoes.asp", info),
    ] {
        Mock::given(method("GET"))
            .and(path(page))
            .and(query_param("incidente", incident_id.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&harness.server)
            .await;
    }
}

const GENERAL_PAGE: &str = r#"<html><body>
    <div class="processo-classe">AÇÃO DIRETA DE INCONSTITUCIONALIDADE</div>
</body></html>"#;

const PARTIES_PAGE: &str = r#"<html><body>
    <div class="parte">
      <div class="detalhe-parte">REQTE.(S)</div>
      <div class="nome-parte">PROCURADOR-GERAL DA REPÚBLICA</div>
    </div>
</body></html>"#;

const INFO_PAGE: &str = r#"<html><body>
    <ul style="list-style:none;">
      <li>DIREITO TRIBUTÁRIO || Contribuições</li>
    </ul>
    <div><span>Órgão de Origem:</span><span>TRIBUNAL DE JUSTIÇA</span></div>
    <div><span>Origem:</span><span>DF - DISTRITO FEDERAL</span></div>
    <div><span>Número de Origem:</span><span> 40018372 , 2013 </span></div>
</body></html>"#;

#[tokio::test]
async fn enrichment_drains_the_queue() -> Result<()> {
    let harness = Harness::new(10).await?;
    harness.mount_empty_listing_fallback().await;
    harness
        .mount_listing(5, &listing_row(9100, "ADI 6341", "Eletrônico", "Público"))
        .await;
    harness.discovery().run(ScanMode::Highest).await?;
    mount_detail_pages(&harness, 9100, GENERAL_PAGE, PARTIES_PAGE, INFO_PAGE).await;

    let completed = harness.enrichment().run().await?;
    assert_eq!(completed, 1);
    assert!(harness.dockets().select_incomplete().await?.is_empty());

    let details = harness.dockets().get_details(9100).await?.unwrap();
    assert_eq!(details.class_label, "AÇÃO DIRETA DE INCONSTITUCIONALIDADE");
    assert_eq!(
        details.parties,
        vec![(
            "REQTE.(S)".to_string(),
            "PROCURADOR-GERAL DA REPÚBLICA".to_string()
        )]
    );
    assert_eq!(
        details.subjects,
        vec!["DIREITO TRIBUTÁRIO; Contribuições".to_string()]
    );
    assert_eq!(details.origin_court, "TRIBUNAL DE JUSTIÇA");
    assert_eq!(details.origin_place, "DF - DISTRITO FEDERAL");
    assert_eq!(
        details.origin_numbers,
        vec!["40018372".to_string(), "2013".to_string()]
    );

    // A second drain pass finds nothing to do.
    assert_eq!(harness.enrichment().run().await?, 0);
    Ok(())
}

#[tokio::test]
async fn missing_origin_block_is_not_an_error() -> Result<()> {
    let harness = Harness::new(10).await?;
    harness.mount_empty_listing_fallback().await;
    harness
        .mount_listing(6, &listing_row(9200, "RE 1", "Físico", "Público"))
        .await;
    harness.discovery().run(ScanMode::Highest).await?;

    let bare_info = "<html><body><p>sem bloco de origem</p></body></html>";
    mount_detail_pages(&harness, 9200, GENERAL_PAGE, PARTIES_PAGE, bare_info).await;

    assert_eq!(harness.enrichment().run().await?, 1);
    let details = harness.dockets().get_details(9200).await?.unwrap();
    assert!(details.origin_numbers.is_empty());
    assert_eq!(details.origin_court, "");
    Ok(())
}

#[tokio::test]
async fn failed_enrichment_leaves_the_entry_queued() -> Result<()> {
    let harness = Harness::new(10).await?;
    harness.mount_empty_listing_fallback().await;
    harness
        .mount_listing(8, &listing_row(9300, "HC 2", "Físico", "Público"))
        .await;
    harness.discovery().run(ScanMode::Highest).await?;

    // The parties page is blank, so nothing may be committed.
    mount_detail_pages(&harness, 9300, GENERAL_PAGE, "  ", INFO_PAGE).await;

    let err = harness.enrichment().run().await.unwrap_err();
    assert!(matches!(err, CrawlError::Parse { incident_id: 9300, .. }));

    assert_eq!(harness.dockets().select_incomplete().await?.len(), 1);
    assert!(harness.dockets().get_details(9300).await?.is_none());
    Ok(())
}
