//! Retrying upsert writer
//!
//! Owns the single store connection for a batch. A failed attempt (other than
//! the last) is followed by a pause, a fresh connection and another attempt.

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::PropertyDetailRecord;
use crate::infrastructure::{
    ConnectionFactory, DetailStore, RetryManager, RetryPolicy, RetryStats, StoreError,
};

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Write for PIN {pin} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        pin: i64,
        attempts: u32,
        #[source]
        last_error: StoreError,
    },
}

pub struct UpsertWriter<F: ConnectionFactory> {
    factory: F,
    connection: Option<F::Connection>,
    retry: RetryManager,
}

impl<F: ConnectionFactory> UpsertWriter<F> {
    /// Acquire the batch connection. Failure here is fatal for the run.
    pub async fn open(factory: F, policy: RetryPolicy) -> Result<Self> {
        let connection = factory
            .connect()
            .await
            .context("Failed to open detail store connection")?;

        Ok(Self {
            factory,
            connection: Some(connection),
            retry: RetryManager::new(policy),
        })
    }

    /// Upsert one record, retrying per policy. Returns the attempt that succeeded.
    pub async fn write(&mut self, record: &PropertyDetailRecord) -> Result<u32, WriteError> {
        let policy = *self.retry.policy();
        let slot = self.retry.begin_item(&record.pin.to_string());
        let mut reconnect_error: Option<StoreError> = None;
        let mut attempt = 0;

        loop {
            attempt += 1;

            // a failed reconnect is charged to this attempt
            let outcome = match reconnect_error.take() {
                Some(e) => Err(e),
                None => self.try_upsert(record).await,
            };

            let error = match outcome {
                Ok(()) => {
                    self.retry.record_attempt(slot, None);
                    return Ok(attempt);
                }
                Err(e) => e,
            };

            self.retry.record_attempt(slot, Some(error.to_string()));

            if !policy.allows_retry_after(attempt) {
                return Err(WriteError::RetriesExhausted {
                    pin: record.pin,
                    attempts: attempt,
                    last_error: error,
                });
            }

            warn!(
                "⚠️ Write attempt {}/{} for PIN {} failed: {}; retrying in {:?}",
                attempt, policy.max_attempts, record.pin, error, policy.delay
            );
            tokio::time::sleep(policy.delay).await;

            if let Err(e) = self.reconnect().await {
                reconnect_error = Some(e);
            }
        }
    }

    async fn try_upsert(&mut self, record: &PropertyDetailRecord) -> Result<(), StoreError> {
        let connection = match self.connection.take() {
            Some(connection) => connection,
            None => self.factory.connect().await?,
        };
        self.connection.insert(connection).upsert_detail(record).await
    }

    /// Drop the current connection and open a new one
    async fn reconnect(&mut self) -> Result<(), StoreError> {
        if let Some(old) = self.connection.take() {
            old.close().await;
        }
        self.connection = Some(self.factory.connect().await?);
        Ok(())
    }

    /// Release the connection and hand back the batch retry statistics
    pub async fn close(mut self) -> RetryStats {
        if let Some(connection) = self.connection.take() {
            connection.close().await;
        }

        let stats = self.retry.stats();
        info!(
            "Writer closed: {} records, {} attempts, {} recovered, {} exhausted",
            stats.total_items, stats.total_attempts, stats.recovered_items, stats.exhausted_items
        );
        stats
    }
}
