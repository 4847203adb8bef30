//! Tribunal Crawler - incremental docket discovery and enrichment
//!
//! Walks a dense integer id space exposed by a paginated court records
//! portal, stages every discovered docket in a durable work queue, and
//! drains that queue in a second pass that attaches per-docket detail
//! fields. Progress is checkpointed per process class so repeated runs
//! resume instead of restarting.

// Module declarations
pub mod domain;
pub mod application;
pub mod infrastructure;

pub use application::discovery::DiscoveryEngine;
pub use application::enrichment::EnrichmentEngine;
pub use domain::error::{CrawlError, CrawlResult};
pub use infrastructure::config::CrawlerConfig;
