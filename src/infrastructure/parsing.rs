//! HTML parsing for listing and detail pages
//!
//! Parsers are synchronous: workers fetch the page body first, then parse
//! it in one step, so no parsed tree ever crosses an await point.

pub mod listing_parser;
pub mod detail_parser;

pub use detail_parser::DetailParser;
pub use listing_parser::ListingParser;
