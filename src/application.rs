//! Application layer - the two crawl phases

pub mod discovery;
pub mod enrichment;
