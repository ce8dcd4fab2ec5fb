//! Batch driver: fetch → extract → normalize → upsert, one PIN at a time

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::page_fetcher::{FetchOutcome, PageFetcher};
use super::upsert_writer::UpsertWriter;
use crate::domain::normalization::{normalize_identifier, page_pin};
use crate::domain::{ExtractedDetails, PaddedPin, RegistryPin, normalize_record};
use crate::infrastructure::{ConnectionFactory, DetailExtractor, RetryPolicy, RetryStats};

/// What happened to one PIN
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PinOutcome {
    Upserted { attempts: u32 },
    NotFound { status: u16 },
    TransportFailure { reason: String },
    InvalidPin,
    WriteFailed { attempts: u32, error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct PinResult {
    pub pin: String,
    pub padded: String,
    #[serde(flatten)]
    pub outcome: PinOutcome,
}

/// Counters and per-PIN results for one run
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total: usize,
    pub upserted: usize,
    pub not_found: usize,
    pub transport_failures: usize,
    pub invalid_pins: usize,
    pub write_failures: usize,
    pub unknown_labels: usize,
    pub orphan_values: usize,
    pub pin_mismatches: usize,
    pub retry: RetryStats,
    pub results: Vec<PinResult>,
}

impl BatchSummary {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            total: 0,
            upserted: 0,
            not_found: 0,
            transport_failures: 0,
            invalid_pins: 0,
            write_failures: 0,
            unknown_labels: 0,
            orphan_values: 0,
            pin_mismatches: 0,
            retry: RetryStats::default(),
            results: Vec::new(),
        }
    }

    fn record(&mut self, pin: &RegistryPin, padded: &PaddedPin, outcome: PinOutcome) {
        self.total += 1;
        match &outcome {
            PinOutcome::Upserted { .. } => self.upserted += 1,
            PinOutcome::NotFound { .. } => self.not_found += 1,
            PinOutcome::TransportFailure { .. } => self.transport_failures += 1,
            PinOutcome::InvalidPin => self.invalid_pins += 1,
            PinOutcome::WriteFailed { .. } => self.write_failures += 1,
        }
        self.results.push(PinResult {
            pin: pin.to_string(),
            padded: padded.to_string(),
            outcome,
        });
    }

    fn tally(&mut self, details: &ExtractedDetails) {
        self.unknown_labels += details.anomalies.unknown_labels.len();
        self.orphan_values += details.anomalies.orphan_values.len();
    }

    /// Skips and write failures; nothing here is fatal
    pub fn failures(&self) -> usize {
        self.total - self.upserted
    }
}

pub struct SyncService<P: PageFetcher> {
    fetcher: P,
    extractor: DetailExtractor,
}

impl<P: PageFetcher> SyncService<P> {
    pub fn new(fetcher: P, extractor: DetailExtractor) -> Self {
        Self { fetcher, extractor }
    }

    /// Run the batch sequentially.
    ///
    /// Only opening the writer can fail; once it is open every PIN ends in a
    /// [`PinOutcome`] and the writer is always closed.
    pub async fn run<F: ConnectionFactory>(
        &self,
        pins: &[(RegistryPin, PaddedPin)],
        factory: F,
        policy: RetryPolicy,
    ) -> Result<BatchSummary> {
        let mut summary = BatchSummary::new(Utc::now());
        let mut writer = UpsertWriter::open(factory, policy).await?;

        info!("🚀 Starting assessor sync for {} PINs", pins.len());

        for (pin, padded) in pins {
            let outcome = self.process_pin(&mut writer, &mut summary, pin, padded).await;
            log_outcome(pin, padded, &outcome);
            summary.record(pin, padded, outcome);
        }

        summary.retry = writer.close().await;
        summary.finished_at = Utc::now();

        info!(
            "✅ Sync finished: {} upserted, {} not found, {} transport failures, {} invalid, {} write failures",
            summary.upserted,
            summary.not_found,
            summary.transport_failures,
            summary.invalid_pins,
            summary.write_failures
        );
        Ok(summary)
    }

    async fn process_pin<F: ConnectionFactory>(
        &self,
        writer: &mut UpsertWriter<F>,
        summary: &mut BatchSummary,
        pin: &RegistryPin,
        padded: &PaddedPin,
    ) -> PinOutcome {
        let body = match self.fetcher.fetch(padded).await {
            FetchOutcome::Success(body) => body,
            FetchOutcome::NotFound(status) => return PinOutcome::NotFound { status },
            FetchOutcome::TransportFailure(reason) => {
                return PinOutcome::TransportFailure { reason };
            }
        };

        let details = self.extractor.extract(&body);
        summary.tally(&details);
        if !details.anomalies.is_empty() {
            debug!(
                "PIN {}: {} unknown labels, {} orphan values",
                padded,
                details.anomalies.unknown_labels.len(),
                details.anomalies.orphan_values.len()
            );
        }

        let record = match normalize_record(pin, &details) {
            Ok(record) => record,
            Err(e) => {
                warn!("{}", e);
                return PinOutcome::InvalidPin;
            }
        };

        if let Some(reported) = page_pin(&details) {
            if normalize_identifier(padded.as_str()) != Some(reported) {
                summary.pin_mismatches += 1;
                warn!(
                    "Page for {} reports PIN {}; keeping registry key {}",
                    padded, reported, record.pin
                );
            }
        }

        match writer.write(&record).await {
            Ok(attempts) => PinOutcome::Upserted { attempts },
            Err(e) => {
                let attempts = match &e {
                    super::WriteError::RetriesExhausted { attempts, .. } => *attempts,
                };
                PinOutcome::WriteFailed {
                    attempts,
                    error: e.to_string(),
                }
            }
        }
    }
}

fn log_outcome(pin: &RegistryPin, padded: &PaddedPin, outcome: &PinOutcome) {
    match outcome {
        PinOutcome::Upserted { attempts } => {
            info!(pin = %pin, padded = %padded, attempts, "upserted");
        }
        PinOutcome::NotFound { status } => {
            warn!(pin = %pin, padded = %padded, status, "skipped: detail page not available");
        }
        PinOutcome::TransportFailure { reason } => {
            warn!(pin = %pin, padded = %padded, reason = %reason, "skipped: fetch failed");
        }
        PinOutcome::InvalidPin => {
            warn!(pin = %pin, padded = %padded, "skipped: registry PIN is not numeric");
        }
        PinOutcome::WriteFailed { attempts, error } => {
            warn!(
                pin = %pin,
                padded = %padded,
                attempts,
                error = %error,
                "failed: write retries exhausted"
            );
        }
    }
}
