//! `property_details` table access
//!
//! Column lists are generated from [`DetailField`] so the DDL, the upsert and
//! the row mapping cannot drift apart.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool};

use crate::domain::{DetailField, FieldKind, FieldValue, PropertyDetailRecord};

const TABLE: &str = "property_details";

fn quoted(field: DetailField) -> String {
    format!("\"{}\"", field.column())
}

fn column_list() -> String {
    DetailField::ALL
        .iter()
        .map(|f| quoted(*f))
        .collect::<Vec<_>>()
        .join(", ")
}

pub static CREATE_PROPERTY_DETAILS_SQL: Lazy<String> = Lazy::new(|| {
    let columns = DetailField::ALL
        .iter()
        .map(|field| {
            let sql_type = match field.kind() {
                FieldKind::Identifier => "INTEGER PRIMARY KEY",
                FieldKind::Area | FieldKind::Monetary => "INTEGER",
                FieldKind::Text => "TEXT",
            };
            format!("{} {}", quoted(*field), sql_type)
        })
        .collect::<Vec<_>>()
        .join(",\n    ");

    format!("CREATE TABLE IF NOT EXISTS {TABLE} (\n    {columns}\n)")
});

/// Insert-or-update keyed by `Pin`; every other column takes the new value, NULL included
pub static UPSERT_SQL: Lazy<String> = Lazy::new(|| {
    let placeholders = vec!["?"; DetailField::ALL.len()].join(", ");
    let assignments = DetailField::non_key()
        .map(|field| format!("{0} = excluded.{0}", quoted(field)))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {TABLE} ({}) VALUES ({placeholders}) ON CONFLICT({}) DO UPDATE SET {assignments}",
        column_list(),
        quoted(DetailField::Pin),
    )
});

static SELECT_BY_PIN_SQL: Lazy<String> = Lazy::new(|| {
    format!(
        "SELECT {} FROM {TABLE} WHERE {} = ?",
        column_list(),
        quoted(DetailField::Pin)
    )
});

/// Run the upsert on any SQLite executor (pool, connection or transaction)
pub async fn execute_upsert<'e, E>(
    executor: E,
    record: &PropertyDetailRecord,
) -> Result<u64, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let mut query = sqlx::query(UPSERT_SQL.as_str());
    for field in DetailField::ALL {
        query = match record.value(field) {
            FieldValue::Integer(value) => query.bind(value),
            FieldValue::Text(value) => query.bind(value),
        };
    }

    let result = query.execute(executor).await?;
    Ok(result.rows_affected())
}

#[derive(Clone)]
pub struct PropertyDetailRepository {
    pool: SqlitePool,
}

impl PropertyDetailRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Upsert one record in its own transaction
    pub async fn upsert(&self, record: &PropertyDetailRecord) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        execute_upsert(&mut *tx, record)
            .await
            .with_context(|| format!("Failed to upsert property detail {}", record.pin))?;
        tx.commit().await.context("Failed to commit property detail")?;
        Ok(())
    }

    pub async fn get_by_pin(&self, pin: i64) -> Result<Option<PropertyDetailRecord>> {
        let row = sqlx::query(SELECT_BY_PIN_SQL.as_str())
            .bind(pin)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch property detail")?;

        row.map(|r| Self::row_to_record(&r)).transpose()
    }

    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query(&format!("SELECT COUNT(*) AS count FROM {TABLE}"))
            .fetch_one(&self.pool)
            .await
            .context("Failed to count property details")?;

        Ok(row.try_get("count")?)
    }

    fn row_to_record(row: &SqliteRow) -> Result<PropertyDetailRecord> {
        use DetailField as F;

        let text = |field: DetailField| row.try_get::<Option<String>, _>(field.column());
        let int = |field: DetailField| row.try_get::<Option<i64>, _>(field.column());

        Ok(PropertyDetailRecord {
            pin: row.try_get(F::Pin.column())?,
            address: text(F::Address)?,
            city: text(F::City)?,
            township: text(F::Township)?,
            property_classification: text(F::PropertyClassification)?,
            square_footage: int(F::SquareFootage)?,
            neighborhood: text(F::Neighborhood)?,
            taxcode: text(F::Taxcode)?,
            next_scheduled_reassessment: text(F::NextScheduledReassessment)?,
            description: text(F::Description)?,
            age: text(F::Age)?,
            building_square_footage: int(F::BuildingSquareFootage)?,
            assessment_phase: text(F::AssessmentPhase)?,
            previous_board_certified: int(F::PreviousBoardCertified)?,
            status: text(F::Status)?,
            assessor_valuation: int(F::AssessorValuation)?,
            assessor_post_appeal_valuation: int(F::AssessorPostAppealValuation)?,
            appeal_number: text(F::AppealNumber)?,
            attorney_tax_representative: text(F::AttorneyTaxRepresentative)?,
            applicant: text(F::Applicant)?,
            result: text(F::Result)?,
            reason: text(F::Reason)?,
            tax_year: text(F::TaxYear)?,
            certificate_number: text(F::CertificateNumber)?,
            property_location: text(F::PropertyLocation)?,
            c_of_e_description: text(F::COfEDescription)?,
            comments: text(F::Comments)?,
            residence_type: text(F::ResidenceType)?,
            land_use: text(F::Use)?,
            apartments: text(F::Apartments)?,
            exterior_construction: text(F::ExteriorConstruction)?,
            full_baths: text(F::FullBaths)?,
            half_baths: text(F::HalfBaths)?,
            basement1: text(F::Basement1)?,
            attic: text(F::Attic)?,
            central_air: text(F::CentralAir)?,
            number_of_fireplaces: text(F::NumberOfFireplaces)?,
            garage_size_type2: text(F::GarageSizeType2)?,
        })
    }
}
