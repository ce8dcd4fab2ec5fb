//! Field normalization
//!
//! Turns raw page text into typed column values. Every rule is fail-soft:
//! text that does not fit the expected shape becomes `None`, not an error.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::label_value_page::ExtractedDetails;
use super::parcel::RegistryPin;
use super::property_detail::{DetailField, PropertyDetailRecord};

/// Whole dollars, optionally followed by a decimal tail that gets dropped
static MONETARY_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(-?\d+)(?:\.\d*)?$").expect("valid monetary regex"));

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("Registry PIN '{pin}' is not numeric")]
    InvalidPin { pin: String },
}

/// Strip separators (hyphens, whitespace) and parse as an integer
pub fn normalize_identifier(raw: &str) -> Option<i64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect();
    cleaned.parse().ok()
}

/// Strip thousands separators and trailing markers like `*`
pub fn normalize_area(raw: &str) -> Option<i64> {
    let cleaned: String = raw.chars().filter(|c| !matches!(c, ',' | '*')).collect();
    cleaned.trim().parse().ok()
}

/// Strip `$`, thousands separators and whitespace; keep whole dollars
pub fn normalize_currency(raw: &str) -> Option<i64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();

    MONETARY_SHAPE
        .captures(&cleaned)
        .and_then(|caps| caps.get(1))
        .and_then(|whole| whole.as_str().parse().ok())
}

pub fn normalize_text(raw: &str) -> String {
    raw.trim().to_string()
}

/// PIN the page itself reports, if it had a parseable `Pin` label
pub fn page_pin(details: &ExtractedDetails) -> Option<i64> {
    details.get(DetailField::Pin).and_then(normalize_identifier)
}

/// Build the stored record from extracted values.
///
/// The key always comes from the registry PIN; the page's own `Pin` value is
/// only used for consistency checks by the caller.
pub fn normalize_record(
    registry_pin: &RegistryPin,
    details: &ExtractedDetails,
) -> Result<PropertyDetailRecord, NormalizationError> {
    let pin = normalize_identifier(registry_pin.as_str()).ok_or_else(|| {
        NormalizationError::InvalidPin {
            pin: registry_pin.to_string(),
        }
    })?;

    let text = |field: DetailField| details.get(field).map(normalize_text);
    let area = |field: DetailField| details.get(field).and_then(normalize_area);
    let money = |field: DetailField| details.get(field).and_then(normalize_currency);

    Ok(PropertyDetailRecord {
        pin,
        address: text(DetailField::Address),
        city: text(DetailField::City),
        township: text(DetailField::Township),
        property_classification: text(DetailField::PropertyClassification),
        square_footage: area(DetailField::SquareFootage),
        neighborhood: text(DetailField::Neighborhood),
        taxcode: text(DetailField::Taxcode),
        next_scheduled_reassessment: text(DetailField::NextScheduledReassessment),
        description: text(DetailField::Description),
        age: text(DetailField::Age),
        building_square_footage: area(DetailField::BuildingSquareFootage),
        assessment_phase: text(DetailField::AssessmentPhase),
        previous_board_certified: money(DetailField::PreviousBoardCertified),
        status: text(DetailField::Status),
        assessor_valuation: money(DetailField::AssessorValuation),
        assessor_post_appeal_valuation: money(DetailField::AssessorPostAppealValuation),
        appeal_number: text(DetailField::AppealNumber),
        attorney_tax_representative: text(DetailField::AttorneyTaxRepresentative),
        applicant: text(DetailField::Applicant),
        result: text(DetailField::Result),
        reason: text(DetailField::Reason),
        tax_year: text(DetailField::TaxYear),
        certificate_number: text(DetailField::CertificateNumber),
        property_location: text(DetailField::PropertyLocation),
        c_of_e_description: text(DetailField::COfEDescription),
        comments: text(DetailField::Comments),
        residence_type: text(DetailField::ResidenceType),
        land_use: text(DetailField::Use),
        apartments: text(DetailField::Apartments),
        exterior_construction: text(DetailField::ExteriorConstruction),
        full_baths: text(DetailField::FullBaths),
        half_baths: text(DetailField::HalfBaths),
        basement1: text(DetailField::Basement1),
        attic: text(DetailField::Attic),
        central_air: text(DetailField::CentralAir),
        number_of_fireplaces: text(DetailField::NumberOfFireplaces),
        garage_size_type2: text(DetailField::GarageSizeType2),
    })
}
