//! Infrastructure layer: configuration, logging, HTTP, HTML parsing and storage
//!
//! Everything here talks to something outside the process. The pipeline in
//! `application` only sees these through the types re-exported below.

pub mod config;
pub mod database_connection;
pub mod http_client;
pub mod logging;
pub mod parsing;
pub mod property_detail_repository;
pub mod registry_repository;
pub mod retry_manager;

// Re-export commonly used items
pub use config::{AppConfig, ConfigManager};
pub use database_connection::{
    ConnectionFactory, DatabaseConnection, DetailStore, SqliteConnectionFactory,
    SqliteDetailConnection, StoreError,
};
pub use http_client::{HttpClient, HttpClientConfig, PageResponse};
pub use logging::{get_log_directory, init_logging_with_config};
pub use parsing::{DetailExtractor, DetailPageSelectors, ParsingError, ParsingResult};
pub use property_detail_repository::PropertyDetailRepository;
pub use registry_repository::RegistryRepository;
pub use retry_manager::{RetryManager, RetryPolicy, RetryStats};
