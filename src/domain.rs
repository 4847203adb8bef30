//! Domain layer - typed records and the crawl error taxonomy

pub mod docket;
pub mod error;

pub use docket::{
    ChannelKind, DetailFields, DocketRecord, QueueEntry, ScanMode, VisibilityKind,
};
pub use error::{CrawlError, CrawlResult};
