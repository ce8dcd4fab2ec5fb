// Database connection and pool management
// SQLite via sqlx: a pool for registry reads and schema setup, plus single
// connections handed out by a factory for the upsert writer.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Connection, SqliteConnection, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::PropertyDetailRecord;
use crate::infrastructure::property_detail_repository::{self, CREATE_PROPERTY_DETAILS_SQL};

const CREATE_PROPERTIES_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS properties (
        PropertyID INTEGER PRIMARY KEY AUTOINCREMENT,
        StreetNumber TEXT,
        PIN TEXT,
        Owner TEXT,
        Address TEXT,
        City TEXT,
        State TEXT,
        Zipcode TEXT,
        SquareFeet INTEGER,
        Link TEXT
    )
"#;

/// Detail store failures; every variant is treated as transient by the writer
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to connect to detail store: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("Failed to begin transaction: {0}")]
    Transaction(#[source] sqlx::Error),

    #[error("Upsert failed: {0}")]
    Query(#[source] sqlx::Error),

    #[error("Commit failed: {0}")]
    Commit(#[source] sqlx::Error),

    #[error("Invalid database URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// One open connection that can persist detail records
#[async_trait]
pub trait DetailStore: Send + Sized {
    /// Insert-or-update one record inside its own transaction
    async fn upsert_detail(&mut self, record: &PropertyDetailRecord) -> Result<(), StoreError>;

    /// Release the connection
    async fn close(self);
}

/// Produces fresh store connections; the writer calls it again after each failure
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    type Connection: DetailStore;

    async fn connect(&self) -> Result<Self::Connection, StoreError>;
}

/// SQLite-backed factory
#[derive(Debug, Clone)]
pub struct SqliteConnectionFactory {
    options: SqliteConnectOptions,
}

impl SqliteConnectionFactory {
    pub fn from_url(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| StoreError::InvalidUrl {
                url: database_url.to_string(),
                reason: e.to_string(),
            })?
            .create_if_missing(true);

        Ok(Self { options })
    }
}

#[async_trait]
impl ConnectionFactory for SqliteConnectionFactory {
    type Connection = SqliteDetailConnection;

    async fn connect(&self) -> Result<Self::Connection, StoreError> {
        let conn = SqliteConnection::connect_with(&self.options)
            .await
            .map_err(StoreError::Connect)?;
        debug!("Opened detail store connection");
        Ok(SqliteDetailConnection { conn })
    }
}

/// Single SQLite connection used for upserts
#[derive(Debug)]
pub struct SqliteDetailConnection {
    conn: SqliteConnection,
}

#[async_trait]
impl DetailStore for SqliteDetailConnection {
    async fn upsert_detail(&mut self, record: &PropertyDetailRecord) -> Result<(), StoreError> {
        let mut tx = self.conn.begin().await.map_err(StoreError::Transaction)?;

        property_detail_repository::execute_upsert(&mut *tx, record)
            .await
            .map_err(StoreError::Query)?;

        tx.commit().await.map_err(StoreError::Commit)
    }

    async fn close(self) {
        if let Err(e) = self.conn.close().await {
            warn!("Detail store connection did not close cleanly: {}", e);
        }
    }
}

pub struct DatabaseConnection {
    pool: SqlitePool,
}

impl DatabaseConnection {
    pub async fn new(database_url: &str) -> Result<Self> {
        Self::with_max_connections(database_url, 5).await
    }

    pub async fn with_max_connections(database_url: &str, max_connections: u32) -> Result<Self> {
        // Create database file directory if it doesn't exist
        let db_path = database_url
            .trim_start_matches("sqlite://")
            .trim_start_matches("sqlite:");

        if !db_path.starts_with(':') {
            if let Some(parent) = Path::new(db_path).parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await.with_context(|| {
                        format!("Failed to create database directory {parent:?}")
                    })?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {database_url}"))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open database: {database_url}"))?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the registry and detail tables if they are missing
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(CREATE_PROPERTIES_SQL)
            .execute(&self.pool)
            .await
            .context("Failed to create properties table")?;

        sqlx::query(CREATE_PROPERTY_DETAILS_SQL.as_str())
            .execute(&self.pool)
            .await
            .context("Failed to create property_details table")?;

        Ok(())
    }
}
