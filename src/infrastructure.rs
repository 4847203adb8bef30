//! Infrastructure layer - configuration, transport, persistence, parsing

pub mod config;
pub mod logging;
pub mod http_client;
pub mod text;
pub mod database_connection;
pub mod checkpoint_repository;
pub mod docket_repository;
pub mod parsing;

pub use config::CrawlerConfig;
pub use database_connection::DatabaseConnection;
pub use http_client::HttpClient;
