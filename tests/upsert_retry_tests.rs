//! Upsert writer retry behavior against a store that fails on demand

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tempfile::TempDir;

use assessor_sync_lib::application::{
    FetchOutcome, PageFetcher, PinOutcome, PinSupplier, SyncService, UpsertWriter, WriteError,
};
use assessor_sync_lib::domain::{PaddedPin, PropertyDetailRecord};
use assessor_sync_lib::infrastructure::{
    ConnectionFactory, DatabaseConnection, DetailExtractor, DetailStore, PropertyDetailRepository,
    RetryPolicy, SqliteConnectionFactory, SqliteDetailConnection, StoreError,
};

/// Shared failure budget: each upsert or connect consumes one while any remain
#[derive(Clone, Default)]
struct Faults {
    upserts: Arc<AtomicU32>,
    connects: Arc<AtomicU32>,
    connect_calls: Arc<AtomicU32>,
}

fn take(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

struct FlakyFactory {
    inner: SqliteConnectionFactory,
    faults: Faults,
}

struct FlakyConnection {
    inner: SqliteDetailConnection,
    faults: Faults,
}

#[async_trait]
impl ConnectionFactory for FlakyFactory {
    type Connection = FlakyConnection;

    async fn connect(&self) -> Result<Self::Connection, StoreError> {
        self.faults.connect_calls.fetch_add(1, Ordering::SeqCst);
        if take(&self.faults.connects) {
            return Err(StoreError::Connect(sqlx::Error::PoolTimedOut));
        }
        Ok(FlakyConnection {
            inner: self.inner.connect().await?,
            faults: self.faults.clone(),
        })
    }
}

#[async_trait]
impl DetailStore for FlakyConnection {
    async fn upsert_detail(&mut self, record: &PropertyDetailRecord) -> Result<(), StoreError> {
        if take(&self.faults.upserts) {
            return Err(StoreError::Query(sqlx::Error::Protocol(
                "injected write failure".to_string(),
            )));
        }
        self.inner.upsert_detail(record).await
    }

    async fn close(self) {
        self.inner.close().await;
    }
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        delay: Duration::from_millis(5),
    }
}

const CITY_PAGE: &str = concat!(
    r#"<span class="detail-row--label">City</span>"#,
    r#"<span class="detail-row--detail">Chicago</span>"#,
);

/// Every PIN gets the same one-field detail page
struct StaticFetcher;

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch(&self, _pin: &PaddedPin) -> FetchOutcome {
        FetchOutcome::Success(CITY_PAGE.to_string())
    }
}

struct Fixture {
    _dir: TempDir,
    db: DatabaseConnection,
    url: String,
    faults: Faults,
}

impl Fixture {
    async fn new() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let url = format!("sqlite:{}", dir.path().join("retry.db").display());
        let db = DatabaseConnection::new(&url).await?;
        db.migrate().await?;
        Ok(Self {
            _dir: dir,
            db,
            url,
            faults: Faults::default(),
        })
    }

    fn factory(&self) -> Result<FlakyFactory> {
        Ok(FlakyFactory {
            inner: SqliteConnectionFactory::from_url(&self.url)?,
            faults: self.faults.clone(),
        })
    }

    async fn writer(&self) -> Result<UpsertWriter<FlakyFactory>> {
        UpsertWriter::open(self.factory()?, fast_policy()).await
    }

    async fn rows(&self) -> Result<i64> {
        PropertyDetailRepository::new(self.db.pool().clone()).count().await
    }
}

#[tokio::test]
async fn two_failures_then_success_writes_one_row() -> Result<()> {
    let fixture = Fixture::new().await?;
    fixture.faults.upserts.store(2, Ordering::SeqCst);

    let mut writer = fixture.writer().await?;
    let attempts = writer.write(&PropertyDetailRecord::empty(10)).await?;
    let stats = writer.close().await;

    assert_eq!(attempts, 3);
    assert_eq!(stats.recovered_items, 1);
    assert_eq!(stats.failed_attempts, 2);
    assert_eq!(fixture.rows().await?, 1);
    // initial open + one reconnect per failure
    assert_eq!(fixture.faults.connect_calls.load(Ordering::SeqCst), 3);
    Ok(())
}

#[tokio::test]
async fn three_failures_exhaust_and_batch_moves_on() -> Result<()> {
    let fixture = Fixture::new().await?;
    fixture.faults.upserts.store(3, Ordering::SeqCst);

    let mut writer = fixture.writer().await?;
    let err = writer
        .write(&PropertyDetailRecord::empty(10))
        .await
        .unwrap_err();
    let WriteError::RetriesExhausted { pin, attempts, .. } = err;
    assert_eq!((pin, attempts), (10, 3));
    assert_eq!(fixture.rows().await?, 0);

    // the next record gets a fresh budget
    assert_eq!(writer.write(&PropertyDetailRecord::empty(11)).await?, 1);
    let stats = writer.close().await;

    assert_eq!(stats.exhausted_items, 1);
    assert_eq!(stats.first_try_items, 1);
    assert_eq!(fixture.rows().await?, 1);
    Ok(())
}

#[tokio::test]
async fn failed_reconnect_counts_as_an_attempt() -> Result<()> {
    let fixture = Fixture::new().await?;
    let mut writer = fixture.writer().await?;

    fixture.faults.upserts.store(1, Ordering::SeqCst);
    fixture.faults.connects.store(1, Ordering::SeqCst);

    // attempt 1: upsert fails; reconnect fails; attempt 2 charged; reconnect ok; attempt 3 succeeds
    let attempts = writer.write(&PropertyDetailRecord::empty(12)).await?;
    writer.close().await;

    assert_eq!(attempts, 3);
    assert_eq!(fixture.rows().await?, 1);
    Ok(())
}

#[tokio::test]
async fn open_failure_is_fatal() -> Result<()> {
    let fixture = Fixture::new().await?;
    fixture.faults.connects.store(1, Ordering::SeqCst);

    assert!(fixture.writer().await.is_err());
    Ok(())
}

#[tokio::test]
async fn single_attempt_policy_never_reconnects() -> Result<()> {
    let fixture = Fixture::new().await?;
    fixture.faults.upserts.store(1, Ordering::SeqCst);

    let mut writer = UpsertWriter::open(
        fixture.factory()?,
        RetryPolicy {
            max_attempts: 1,
            delay: Duration::from_secs(60),
        },
    )
    .await?;

    assert!(writer.write(&PropertyDetailRecord::empty(13)).await.is_err());
    writer.close().await;

    assert_eq!(fixture.faults.connect_calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn repeated_pin_is_counted_per_write() -> Result<()> {
    let fixture = Fixture::new().await?;
    let mut writer = fixture.writer().await?;

    assert_eq!(writer.write(&PropertyDetailRecord::empty(7)).await?, 1);
    assert_eq!(writer.write(&PropertyDetailRecord::empty(7)).await?, 1);
    let stats = writer.close().await;

    assert_eq!(stats.total_items, 2);
    assert_eq!(stats.first_try_items, 2);
    assert_eq!(stats.recovered_items, 0);
    assert_eq!(fixture.rows().await?, 1);
    Ok(())
}

#[tokio::test]
async fn exhausted_write_is_not_hidden_by_later_duplicate() -> Result<()> {
    let fixture = Fixture::new().await?;
    fixture.faults.upserts.store(3, Ordering::SeqCst);

    let mut writer = fixture.writer().await?;
    assert!(writer.write(&PropertyDetailRecord::empty(7)).await.is_err());
    assert_eq!(writer.write(&PropertyDetailRecord::empty(7)).await?, 1);
    let stats = writer.close().await;

    assert_eq!(stats.exhausted_items, 1);
    assert_eq!(stats.first_try_items, 1);
    assert_eq!(stats.recovered_items, 0);
    Ok(())
}

#[tokio::test]
async fn batch_reports_exhausted_write_and_keeps_going() -> Result<()> {
    let fixture = Fixture::new().await?;
    fixture.faults.upserts.store(3, Ordering::SeqCst);

    let service = SyncService::new(StaticFetcher, DetailExtractor::new()?);
    let pins = PinSupplier::from_args(["100", "200"]).padded();
    let summary = service.run(&pins, fixture.factory()?, fast_policy()).await?;

    assert!(matches!(
        summary.results[0].outcome,
        PinOutcome::WriteFailed { attempts: 3, .. }
    ));
    assert_eq!(summary.results[1].outcome, PinOutcome::Upserted { attempts: 1 });
    assert_eq!(summary.write_failures, 1);
    assert_eq!(summary.upserted, 1);
    assert_eq!(summary.retry.exhausted_items, 1);

    let repo = PropertyDetailRepository::new(fixture.db.pool().clone());
    assert_eq!(repo.count().await?, 1);
    assert!(repo.get_by_pin(100).await?.is_none());
    assert_eq!(
        repo.get_by_pin(200).await?.and_then(|r| r.city),
        Some("Chicago".to_string())
    );
    Ok(())
}
