//! Read access to the `properties` registry

use anyhow::{Context, Result};
use sqlx::{Row, SqlitePool};
use tracing::warn;

use crate::domain::RegistryPin;

#[derive(Clone)]
pub struct RegistryRepository {
    pool: SqlitePool,
}

impl RegistryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Registry PINs in `PropertyID` order, duplicates kept.
    ///
    /// The column is text in most registries but some loaders stored integers;
    /// both decode. NULL PINs are skipped.
    pub async fn list_pins(&self) -> Result<Vec<RegistryPin>> {
        let rows = sqlx::query("SELECT PIN FROM properties ORDER BY PropertyID")
            .fetch_all(&self.pool)
            .await
            .context("Failed to read PINs from properties")?;

        let mut pins = Vec::with_capacity(rows.len());
        for row in rows {
            let pin = match row.try_get::<Option<String>, _>("PIN") {
                Ok(value) => value,
                Err(_) => row
                    .try_get::<Option<i64>, _>("PIN")
                    .context("PIN column is neither text nor integer")?
                    .map(|v| v.to_string()),
            };

            match pin {
                Some(pin) => pins.push(RegistryPin::from(pin)),
                None => warn!("Skipping registry row with NULL PIN"),
            }
        }

        Ok(pins)
    }

    /// Add a bare registry row; returns the new `PropertyID`
    pub async fn insert_pin(&self, pin: &str, address: Option<&str>) -> Result<i64> {
        let result = sqlx::query("INSERT INTO properties (PIN, Address) VALUES (?, ?)")
            .bind(pin)
            .bind(address)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to insert registry PIN {pin}"))?;

        Ok(result.last_insert_rowid())
    }
}
