//! Crawl error taxonomy
//!
//! Per-unit failures (one source id, one incident id) are isolated from
//! their batch: sibling workers are never cancelled, and the batch re-raises
//! the first failure only after every dispatched unit has finished. "Zero
//! rows on a listing page" is deliberately not an error - the id space is
//! sparse and empty pages are the common case.

use thiserror::Error;

pub type CrawlResult<T> = Result<T, CrawlError>;

#[derive(Error, Debug)]
pub enum CrawlError {
    /// Network or timeout failure while fetching a page. Fatal for the unit,
    /// never retried automatically; resumability comes from idempotent
    /// writes, not retry loops.
    #[error("transport failure for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The listing page for a source id could not be interpreted as a
    /// structured document at all.
    #[error("listing page for source id {source_id} is not a parseable document")]
    InvalidSource { source_id: i64 },

    /// A detail page was fetched but its expected structure was missing.
    #[error("failed to parse {what} for incident {incident_id}: {reason}")]
    Parse {
        incident_id: i64,
        what: &'static str,
        reason: String,
    },

    /// A categorical label on the page did not match the fixed mapping.
    /// Intentionally not defaulted: a silently guessed code would corrupt
    /// every statistic computed downstream.
    #[error("unknown {field} label: {label:?}")]
    UnknownEnumValue { field: String, label: String },

    /// Invalid invocation, surfaced before any work is dispatched.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CrawlError {
    /// Attach batch context to a per-unit error so callers can re-invoke
    /// with the offending id in hand.
    pub fn unit_id(&self) -> Option<i64> {
        match self {
            Self::InvalidSource { source_id } => Some(*source_id),
            Self::Parse { incident_id, .. } => Some(*incident_id),
            _ => None,
        }
    }
}
