//! Configuration infrastructure
//!
//! Contains configuration loading and management for assessor synchronization.
//!
//! Values are layered, later sources winning:
//! 1. Built-in defaults (`defaults` module)
//! 2. JSON config file in the user config directory
//! 3. Environment variables, e.g. `ASSESSOR_SYNC_DATABASE__URL`

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;
use tracing::info;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "ASSESSOR_SYNC";

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Assessor site access
    pub assessor: AssessorConfig,

    /// Registry + detail store
    pub database: DatabaseConfig,

    /// Upsert writer retry behavior
    pub writer: WriterConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Assessor website access settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessorConfig {
    /// Site root; detail pages live under `/pin/<padded-pin>`
    pub base_url: String,

    /// User agent string for HTTP requests
    pub user_agent: String,

    /// Request timeout in seconds
    pub request_timeout_seconds: u64,

    /// Upper bound on outbound requests per second (0 disables limiting)
    pub max_requests_per_second: u32,

    /// Whether to follow redirects
    pub follow_redirects: bool,
}

/// Datastore settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx connection URL
    pub url: String,

    /// Pool size for registry reads and schema setup
    pub max_connections: u32,

    /// Create missing tables on startup
    pub auto_migrate: bool,
}

/// Upsert writer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Total write attempts per record, first one included
    pub max_attempts: u32,

    /// Fixed pause before reconnecting, in milliseconds
    pub retry_delay_ms: u64,
}

impl WriterConfig {
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Logging configuration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs in the log file
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Log file name inside the log directory
    pub file_name: String,

    /// Log directory; empty means `logs/` next to the executable
    pub directory: String,

    /// Number of log files to keep (older files will be deleted)
    pub max_files: u32,

    /// Enable automatic log cleanup on startup
    pub auto_cleanup_logs: bool,

    /// Module-specific log level filters (e.g., "sqlx": "warn", "reqwest": "info")
    pub module_filters: HashMap<String, String>,
}

impl Default for AssessorConfig {
    fn default() -> Self {
        Self {
            base_url: assessor::BASE_URL.to_string(),
            user_agent: defaults::USER_AGENT.to_string(),
            request_timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            max_requests_per_second: defaults::MAX_REQUESTS_PER_SECOND,
            follow_redirects: true,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: defaults::DATABASE_URL.to_string(),
            max_connections: defaults::DB_MAX_CONNECTIONS,
            auto_migrate: true,
        }
    }
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::WRITE_MAX_ATTEMPTS,
            retry_delay_ms: defaults::WRITE_RETRY_DELAY_MS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            file_name: defaults::LOG_FILE_NAME.to_string(),
            directory: String::new(),
            max_files: defaults::LOG_MAX_FILES,
            auto_cleanup_logs: defaults::LOG_AUTO_CLEANUP,
            module_filters: {
                let mut filters = HashMap::new();
                filters.insert("sqlx".to_string(), "warn".to_string());
                filters.insert("reqwest".to_string(), "info".to_string());
                filters.insert("hyper".to_string(), "warn".to_string());
                filters
            },
        }
    }
}

/// Configuration manager for loading and saving settings
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join("assessor-sync");

        Ok(config_dir)
    }

    /// Create a configuration manager pointing at the default location
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;
        let config_path = config_dir.join("assessor_sync_config.json");

        Ok(Self { config_path })
    }

    /// Configuration manager for an explicit file
    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// Load configuration, writing defaults on first run
    pub async fn load_config(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            info!("🎉 Configuration file not found, creating default: {:?}", self.config_path);
            self.save_config(&AppConfig::default()).await?;
        }

        let config = Self::layered(&self.config_path)?;
        info!("Loaded configuration from: {:?}", self.config_path);
        Ok(config)
    }

    /// Merge defaults, the file at `path` (if present) and environment overrides
    pub fn layered(path: &std::path::Path) -> Result<AppConfig> {
        let defaults = config::Config::try_from(&AppConfig::default())
            .context("Failed to seed configuration defaults")?;

        let merged = config::Config::builder()
            .add_source(defaults)
            .add_source(
                config::File::from(path.to_path_buf())
                    .format(config::FileFormat::Json)
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build layered configuration")?;

        merged
            .try_deserialize::<AppConfig>()
            .context("Configuration file contains invalid values")
    }

    /// Save configuration to file
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }

        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;

        info!("Saved configuration to: {:?}", self.config_path);
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }
}

/// Assessor website URLs
pub mod assessor {
    /// Cook County Assessor site root
    pub const BASE_URL: &str = "https://www.cookcountyassessor.com";

    /// Path segment preceding the padded PIN
    pub const PIN_PATH: &str = "pin";

    /// Fragment the site uses to land on the address block
    pub const DETAIL_FRAGMENT: &str = "address";
}

/// Default configuration values
pub mod defaults {
    /// Default request timeout in seconds
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    /// Default outbound request cap
    pub const MAX_REQUESTS_PER_SECOND: u32 = 5;

    /// Default user agent
    pub const USER_AGENT: &str = "assessor-sync/0.2 (parcel registry refresh)";

    /// Default datastore; a SQLite file in the working directory
    pub const DATABASE_URL: &str = "sqlite://assessor_sync.db";

    /// Default pool size
    pub const DB_MAX_CONNECTIONS: u32 = 5;

    /// Default write attempts per record
    pub const WRITE_MAX_ATTEMPTS: u32 = 3;

    /// Default pause between write attempts (5 s)
    pub const WRITE_RETRY_DELAY_MS: u64 = 5000;

    // Log configuration defaults
    /// Default log level
    pub const LOG_LEVEL: &str = "info";

    /// Default JSON format setting
    pub const LOG_JSON_FORMAT: bool = false;

    /// Default console output setting
    pub const LOG_CONSOLE_OUTPUT: bool = true;

    /// Default file output setting
    pub const LOG_FILE_OUTPUT: bool = true;

    /// Default log file name
    pub const LOG_FILE_NAME: &str = "assessor-sync.log";

    /// Default maximum log files to keep
    pub const LOG_MAX_FILES: u32 = 5;

    /// Default auto cleanup logs setting
    pub const LOG_AUTO_CLEANUP: bool = true;
}

/// URL building helper functions
pub mod utils {
    use super::assessor::{DETAIL_FRAGMENT, PIN_PATH};
    use crate::domain::PaddedPin;

    /// Detail page URL: `<base>/pin/<padded>#address`
    pub fn detail_page_url(base_url: &str, pin: &PaddedPin) -> String {
        format!(
            "{}/{}/{}#{}",
            base_url.trim_end_matches('/'),
            PIN_PATH,
            pin,
            DETAIL_FRAGMENT
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RegistryPin;
    use tempfile::tempdir;

    #[test]
    fn test_detail_page_url() {
        let pin = RegistryPin::new("1234567890").pad();
        assert_eq!(
            utils::detail_page_url("https://www.cookcountyassessor.com/", &pin),
            "https://www.cookcountyassessor.com/pin/12345678900000#address"
        );
    }

    #[test]
    fn test_writer_defaults_match_retry_contract() {
        let writer = WriterConfig::default();
        assert_eq!(writer.max_attempts, 3);
        assert_eq!(writer.retry_delay(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_first_load_writes_defaults() -> Result<()> {
        let dir = tempdir()?;
        let manager = ConfigManager::with_path(dir.path().join("cfg/assessor_sync_config.json"));

        let config = manager.load_config().await?;
        assert!(manager.config_path().exists());
        assert_eq!(config.assessor.base_url, assessor::BASE_URL);
        Ok(())
    }

    #[tokio::test]
    async fn test_partial_file_keeps_other_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("assessor_sync_config.json");
        tokio::fs::write(&path, r#"{ "writer": { "max_attempts": 5 } }"#).await?;

        let config = ConfigManager::layered(&path)?;
        assert_eq!(config.writer.max_attempts, 5);
        assert_eq!(config.writer.retry_delay_ms, defaults::WRITE_RETRY_DELAY_MS);
        assert_eq!(config.database.url, defaults::DATABASE_URL);
        Ok(())
    }
}
