//! Crawler configuration
//!
//! One immutable value constructed at startup and passed explicitly into
//! each component; there is no ambient global. Loadable from a JSON file,
//! with defaults matching the portal's known-good parameters.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Portal root, e.g. `http://portal.stf.jus.br/processos`.
    pub base_url: String,

    /// How many ids one discovery pass probes.
    pub step: i64,

    /// Bounded worker pool size for both crawl phases.
    pub max_concurrent_workers: usize,

    /// Per-request timeout. Exceeding it fails that unit only.
    pub request_timeout_seconds: u64,

    pub user_agent: String,

    /// Sqlite database location, as a sqlx URL.
    pub database_url: String,

    /// Optional process-class filter for discovery; rows of other classes
    /// are skipped without side effects.
    pub class_filter: Option<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://portal.stf.jus.br/processos".to_string(),
            step: 200,
            max_concurrent_workers: 24,
            request_timeout_seconds: 60,
            user_agent: concat!(
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 ",
                "(KHTML, like Gecko) Chrome/97.0.4692.71 Safari/537.36"
            )
            .to_string(),
            database_url: "sqlite://data/tribunal.db".to_string(),
            class_filter: None,
        }
    }
}

impl CrawlerConfig {
    /// Load configuration from a JSON file, falling back to defaults for
    /// missing fields.
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Reject values a scan pass cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.step < 1 {
            anyhow::bail!("step must be at least 1, got {}", self.step);
        }
        if self.max_concurrent_workers == 0 {
            anyhow::bail!("max_concurrent_workers must be at least 1");
        }
        Ok(())
    }

    /// Listing page for one value of the scanned id space.
    pub fn listing_url(&self, source_id: i64) -> String {
        format!(
            "{}/listarProcessos.asp?classe=&numeroProcesso={}",
            self.base_url, source_id
        )
    }

    /// General-information detail page for an incident.
    pub fn detail_url(&self, incident_id: i64) -> String {
        format!("{}/detalhe.asp?incidente={}", self.base_url, incident_id)
    }

    /// Parties detail page for an incident.
    pub fn parties_url(&self, incident_id: i64) -> String {
        format!("{}/abaPartes.asp?incidente={}", self.base_url, incident_id)
    }

    /// Subject/origin detail page for an incident.
    pub fn info_url(&self, incident_id: i64) -> String {
        format!(
            "{}/abaInformacoes.asp?incidente={}",
            self.base_url, incident_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_parameters_match_portal_expectations() {
        let config = CrawlerConfig::default();
        assert_eq!(config.step, 200);
        assert_eq!(config.max_concurrent_workers, 24);
        assert_eq!(config.request_timeout_seconds, 60);
        assert!(config.class_filter.is_none());
    }

    #[test]
    fn url_builders_place_ids() {
        let config = CrawlerConfig {
            base_url: "http://localhost:8080".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.listing_url(42),
            "http://localhost:8080/listarProcessos.asp?classe=&numeroProcesso=42"
        );
        assert_eq!(
            config.detail_url(7),
            "http://localhost:8080/detalhe.asp?incidente=7"
        );
        assert_eq!(
            config.parties_url(7),
            "http://localhost:8080/abaPartes.asp?incidente=7"
        );
        assert_eq!(
            config.info_url(7),
            "http://localhost:8080/abaInformacoes.asp?incidente=7"
        );
    }

    #[tokio::test]
    async fn nonpositive_step_is_rejected_at_load() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.json");
        tokio::fs::write(&path, r#"{ "step": -5 }"#).await?;

        let err = CrawlerConfig::load(&path).await.unwrap_err();
        assert!(format!("{err:#}").contains("step must be at least 1"));
        Ok(())
    }

    #[tokio::test]
    async fn partial_config_file_falls_back_to_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.json");
        tokio::fs::write(&path, r#"{ "step": 50, "class_filter": "ADI" }"#).await?;

        let config = CrawlerConfig::load(&path).await?;
        assert_eq!(config.step, 50);
        assert_eq!(config.class_filter.as_deref(), Some("ADI"));
        assert_eq!(config.max_concurrent_workers, 24);
        Ok(())
    }
}
