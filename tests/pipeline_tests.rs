//! End-to-end pipeline tests: fake fetcher, real extractor, SQLite on disk

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tempfile::TempDir;

use assessor_sync_lib::application::{
    FetchOutcome, PageFetcher, PinOutcome, PinSupplier, SyncService,
};
use assessor_sync_lib::domain::{PaddedPin, PropertyDetailRecord};
use assessor_sync_lib::infrastructure::{
    DatabaseConnection, DetailExtractor, PropertyDetailRepository, RegistryRepository, RetryPolicy,
    SqliteConnectionFactory,
};

/// Serves canned outcomes keyed by padded PIN; unknown PINs are 404s
#[derive(Default)]
struct FakeFetcher {
    pages: HashMap<String, FetchOutcome>,
}

impl FakeFetcher {
    fn page(mut self, padded: &str, html: &str) -> Self {
        self.pages
            .insert(padded.to_string(), FetchOutcome::Success(html.to_string()));
        self
    }

    fn outcome(mut self, padded: &str, outcome: FetchOutcome) -> Self {
        self.pages.insert(padded.to_string(), outcome);
        self
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch(&self, pin: &PaddedPin) -> FetchOutcome {
        self.pages
            .get(pin.as_str())
            .cloned()
            .unwrap_or(FetchOutcome::NotFound(404))
    }
}

fn detail_page(rows: &[(&str, &str)]) -> String {
    let body: String = rows
        .iter()
        .map(|(label, value)| {
            format!(
                r#"<div class="detail-row"><span class="detail-row--label">{label}</span>
                   <span class="detail-row--detail">{value}</span></div>"#
            )
        })
        .collect();
    format!("<html><body><div id=\"address\">{body}</div></body></html>")
}

struct Fixture {
    _dir: TempDir,
    db: DatabaseConnection,
    url: String,
}

impl Fixture {
    async fn new() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let url = format!("sqlite:{}", dir.path().join("sync.db").display());
        let db = DatabaseConnection::new(&url).await?;
        db.migrate().await?;
        Ok(Self { _dir: dir, db, url })
    }

    fn factory(&self) -> Result<SqliteConnectionFactory> {
        Ok(SqliteConnectionFactory::from_url(&self.url)?)
    }

    fn details(&self) -> PropertyDetailRepository {
        PropertyDetailRepository::new(self.db.pool().clone())
    }
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        delay: Duration::from_millis(5),
    }
}

#[tokio::test]
async fn ten_digit_pin_is_padded_fetched_and_stored() -> Result<()> {
    let fixture = Fixture::new().await?;
    let fetcher = FakeFetcher::default().page(
        "12345678900000",
        &detail_page(&[("Address", "1 Main St"), ("Assessor Valuation", "$100,000")]),
    );
    let service = SyncService::new(fetcher, DetailExtractor::new()?);

    let supplier = PinSupplier::from_args(["1234567890"]);
    let summary = service
        .run(&supplier.padded(), fixture.factory()?, fast_policy())
        .await?;

    assert_eq!(summary.upserted, 1);
    assert_eq!(summary.results[0].padded, "12345678900000");

    let mut expected = PropertyDetailRecord::empty(1_234_567_890);
    expected.address = Some("1 Main St".into());
    expected.assessor_valuation = Some(100_000);
    assert_eq!(fixture.details().get_by_pin(1_234_567_890).await?, Some(expected));
    Ok(())
}

#[tokio::test]
async fn rerun_overwrites_row_including_nulls() -> Result<()> {
    let fixture = Fixture::new().await?;
    let pins = PinSupplier::from_args(["42"]).padded();

    let first = FakeFetcher::default().page(
        "42000000000000",
        &detail_page(&[
            ("City", "Chicago"),
            ("Building Square Footage", "1,200*"),
            ("Previous Board Certified", "$55,000"),
        ]),
    );
    SyncService::new(first, DetailExtractor::new()?)
        .run(&pins, fixture.factory()?, fast_policy())
        .await?;

    let second = FakeFetcher::default().page(
        "42000000000000",
        &detail_page(&[("City", "Evanston"), ("Building Square Footage", "n/a")]),
    );
    SyncService::new(second, DetailExtractor::new()?)
        .run(&pins, fixture.factory()?, fast_policy())
        .await?;

    let repo = fixture.details();
    assert_eq!(repo.count().await?, 1);

    let stored = repo.get_by_pin(42).await?.expect("row for PIN 42");
    assert_eq!(stored.city.as_deref(), Some("Evanston"));
    assert_eq!(stored.building_square_footage, None);
    assert_eq!(stored.previous_board_certified, None);
    Ok(())
}

#[tokio::test]
async fn fetch_failures_never_touch_the_store() -> Result<()> {
    let fixture = Fixture::new().await?;
    let fetcher = FakeFetcher::default()
        .outcome("11000000000000", FetchOutcome::NotFound(500))
        .outcome(
            "22000000000000",
            FetchOutcome::TransportFailure("connection reset".into()),
        )
        .page("33000000000000", &detail_page(&[("Age", "95")]));

    let service = SyncService::new(fetcher, DetailExtractor::new()?);
    let pins = PinSupplier::from_args(["11", "22", "33", "44"]).padded();
    let summary = service.run(&pins, fixture.factory()?, fast_policy()).await?;

    assert_eq!(summary.total, 4);
    assert_eq!(summary.upserted, 1);
    assert_eq!(summary.not_found, 2);
    assert_eq!(summary.transport_failures, 1);
    assert_eq!(summary.failures(), 3);
    assert_eq!(summary.results[0].outcome, PinOutcome::NotFound { status: 500 });
    assert_eq!(fixture.details().count().await?, 1);
    Ok(())
}

#[tokio::test]
async fn page_without_labels_stores_pin_only() -> Result<()> {
    let fixture = Fixture::new().await?;
    let fetcher = FakeFetcher::default().page(
        "77000000000000",
        "<html><body><span class=\"detail-row--detail\">orphan</span></body></html>",
    );

    let summary = SyncService::new(fetcher, DetailExtractor::new()?)
        .run(&PinSupplier::from_args(["77"]).padded(), fixture.factory()?, fast_policy())
        .await?;

    assert_eq!(summary.orphan_values, 1);
    assert_eq!(
        fixture.details().get_by_pin(77).await?,
        Some(PropertyDetailRecord::empty(77))
    );
    Ok(())
}

#[tokio::test]
async fn non_numeric_registry_pin_is_skipped() -> Result<()> {
    let fixture = Fixture::new().await?;
    let fetcher = FakeFetcher::default().page("ABC00000000000", &detail_page(&[("Age", "5")]));

    let summary = SyncService::new(fetcher, DetailExtractor::new()?)
        .run(&PinSupplier::from_args(["ABC"]).padded(), fixture.factory()?, fast_policy())
        .await?;

    assert_eq!(summary.invalid_pins, 1);
    assert_eq!(summary.results[0].outcome, PinOutcome::InvalidPin);
    assert_eq!(fixture.details().count().await?, 0);
    Ok(())
}

#[tokio::test]
async fn page_pin_mismatch_keeps_registry_key() -> Result<()> {
    let fixture = Fixture::new().await?;
    let fetcher = FakeFetcher::default().page(
        "12345678900000",
        &detail_page(&[("Pin", "99-99-999-999-9999"), ("City", "Cicero")]),
    );

    let summary = SyncService::new(fetcher, DetailExtractor::new()?)
        .run(
            &PinSupplier::from_args(["1234567890"]).padded(),
            fixture.factory()?,
            fast_policy(),
        )
        .await?;

    assert_eq!(summary.pin_mismatches, 1);
    let stored = fixture.details().get_by_pin(1_234_567_890).await?;
    assert_eq!(stored.and_then(|r| r.city), Some("Cicero".to_string()));
    Ok(())
}

#[tokio::test]
async fn registry_supplies_pins_in_order() -> Result<()> {
    let fixture = Fixture::new().await?;
    let registry = RegistryRepository::new(fixture.db.pool().clone());
    registry.insert_pin("2", None).await?;
    registry.insert_pin("1", None).await?;

    let supplier = PinSupplier::from_registry(&registry).await?;
    let fetcher = FakeFetcher::default()
        .page("10000000000000", &detail_page(&[("Township", "Rogers Park")]))
        .page("20000000000000", &detail_page(&[("Township", "Hyde Park")]));

    let summary = SyncService::new(fetcher, DetailExtractor::new()?)
        .run(&supplier.padded(), fixture.factory()?, fast_policy())
        .await?;

    let order: Vec<&str> = summary.results.iter().map(|r| r.pin.as_str()).collect();
    assert_eq!(order, vec!["2", "1"]);
    assert_eq!(summary.upserted, 2);
    Ok(())
}

#[tokio::test]
async fn summary_serializes_outcomes() -> Result<()> {
    let fixture = Fixture::new().await?;
    let service = SyncService::new(FakeFetcher::default(), DetailExtractor::new()?);

    let summary = service
        .run(&PinSupplier::from_args(["5"]).padded(), fixture.factory()?, fast_policy())
        .await?;

    let json = serde_json::to_value(&summary)?;
    assert_eq!(json["not_found"], 1);
    assert_eq!(json["results"][0]["outcome"], "not_found");
    assert_eq!(json["results"][0]["status"], 404);
    assert_eq!(json["results"][0]["padded"], "50000000000000");
    Ok(())
}
