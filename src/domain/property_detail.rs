//! Property detail record and the fixed label table of the assessor detail page

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a field's raw text is turned into a stored value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Parcel identifier, separators stripped
    Identifier,
    /// Square footage, thousands separators and markers stripped
    Area,
    /// Whole-dollar valuation
    Monetary,
    /// Stored as trimmed text
    Text,
}

/// Canonical fields of the detail page, in `property_details` column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DetailField {
    Pin,
    Address,
    City,
    Township,
    PropertyClassification,
    SquareFootage,
    Neighborhood,
    Taxcode,
    NextScheduledReassessment,
    Description,
    Age,
    BuildingSquareFootage,
    AssessmentPhase,
    PreviousBoardCertified,
    Status,
    AssessorValuation,
    AssessorPostAppealValuation,
    AppealNumber,
    AttorneyTaxRepresentative,
    Applicant,
    Result,
    Reason,
    TaxYear,
    CertificateNumber,
    PropertyLocation,
    COfEDescription,
    Comments,
    ResidenceType,
    Use,
    Apartments,
    ExteriorConstruction,
    FullBaths,
    HalfBaths,
    Basement1,
    Attic,
    CentralAir,
    NumberOfFireplaces,
    GarageSizeType2,
}

impl DetailField {
    pub const ALL: [Self; 38] = [
        Self::Pin,
        Self::Address,
        Self::City,
        Self::Township,
        Self::PropertyClassification,
        Self::SquareFootage,
        Self::Neighborhood,
        Self::Taxcode,
        Self::NextScheduledReassessment,
        Self::Description,
        Self::Age,
        Self::BuildingSquareFootage,
        Self::AssessmentPhase,
        Self::PreviousBoardCertified,
        Self::Status,
        Self::AssessorValuation,
        Self::AssessorPostAppealValuation,
        Self::AppealNumber,
        Self::AttorneyTaxRepresentative,
        Self::Applicant,
        Self::Result,
        Self::Reason,
        Self::TaxYear,
        Self::CertificateNumber,
        Self::PropertyLocation,
        Self::COfEDescription,
        Self::Comments,
        Self::ResidenceType,
        Self::Use,
        Self::Apartments,
        Self::ExteriorConstruction,
        Self::FullBaths,
        Self::HalfBaths,
        Self::Basement1,
        Self::Attic,
        Self::CentralAir,
        Self::NumberOfFireplaces,
        Self::GarageSizeType2,
    ];

    /// Label text exactly as it appears on the detail page
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pin => "Pin",
            Self::Address => "Address",
            Self::City => "City",
            Self::Township => "Township",
            Self::PropertyClassification => "Property Classification",
            Self::SquareFootage => "Square Footage (Land)",
            Self::Neighborhood => "Neighborhood",
            Self::Taxcode => "Taxcode",
            Self::NextScheduledReassessment => "Next Scheduled Reassessment",
            Self::Description => "Description",
            Self::Age => "Age",
            Self::BuildingSquareFootage => "Building Square Footage",
            Self::AssessmentPhase => "Assessment Phase",
            Self::PreviousBoardCertified => "Previous Board Certified",
            Self::Status => "Status",
            Self::AssessorValuation => "Assessor Valuation",
            Self::AssessorPostAppealValuation => "Assessor Post-Appeal Valuation",
            Self::AppealNumber => "Appeal Number",
            Self::AttorneyTaxRepresentative => "Attorney/Tax Representative",
            Self::Applicant => "Applicant",
            Self::Result => "Result",
            Self::Reason => "Reason",
            Self::TaxYear => "Tax Year",
            Self::CertificateNumber => "Certificate Number",
            Self::PropertyLocation => "Property Location",
            Self::COfEDescription => "C of E Description",
            Self::Comments => "Comments",
            Self::ResidenceType => "Residence Type",
            Self::Use => "Use",
            Self::Apartments => "Apartments",
            Self::ExteriorConstruction => "Exterior Construction",
            Self::FullBaths => "Full Baths",
            Self::HalfBaths => "Half Baths",
            Self::Basement1 => "Basement1",
            Self::Attic => "Attic",
            Self::CentralAir => "Central Air",
            Self::NumberOfFireplaces => "Number of Fireplaces",
            Self::GarageSizeType2 => "Garage Size/Type2",
        }
    }

    /// Column name in `property_details`
    pub const fn column(self) -> &'static str {
        match self {
            Self::Pin => "Pin",
            Self::Address => "Address",
            Self::City => "City",
            Self::Township => "Township",
            Self::PropertyClassification => "PropertyClassification",
            Self::SquareFootage => "SquareFootage",
            Self::Neighborhood => "Neighborhood",
            Self::Taxcode => "Taxcode",
            Self::NextScheduledReassessment => "NextScheduledReassessment",
            Self::Description => "Description",
            Self::Age => "Age",
            Self::BuildingSquareFootage => "BuildingSquareFootage",
            Self::AssessmentPhase => "AssessmentPhase",
            Self::PreviousBoardCertified => "PreviousBoardCertified",
            Self::Status => "Status",
            Self::AssessorValuation => "AssessorValuation",
            Self::AssessorPostAppealValuation => "AssessorPostAppealValuation",
            Self::AppealNumber => "AppealNumber",
            Self::AttorneyTaxRepresentative => "AttorneyTaxRepresentative",
            Self::Applicant => "Applicant",
            Self::Result => "Result",
            Self::Reason => "Reason",
            Self::TaxYear => "TaxYear",
            Self::CertificateNumber => "CertificateNumber",
            Self::PropertyLocation => "PropertyLocation",
            Self::COfEDescription => "COfEDescription",
            Self::Comments => "Comments",
            Self::ResidenceType => "ResidenceType",
            Self::Use => "Use",
            Self::Apartments => "Apartments",
            Self::ExteriorConstruction => "ExteriorConstruction",
            Self::FullBaths => "FullBaths",
            Self::HalfBaths => "HalfBaths",
            Self::Basement1 => "Basement1",
            Self::Attic => "Attic",
            Self::CentralAir => "CentralAir",
            Self::NumberOfFireplaces => "NumberOfFireplaces",
            Self::GarageSizeType2 => "GarageSizeType2",
        }
    }

    pub const fn kind(self) -> FieldKind {
        match self {
            Self::Pin => FieldKind::Identifier,
            Self::SquareFootage | Self::BuildingSquareFootage => FieldKind::Area,
            Self::PreviousBoardCertified
            | Self::AssessorValuation
            | Self::AssessorPostAppealValuation => FieldKind::Monetary,
            _ => FieldKind::Text,
        }
    }

    /// Exact-match lookup of a trimmed label
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.label() == label)
    }

    /// Every column except the key
    pub fn non_key() -> impl Iterator<Item = Self> {
        Self::ALL.into_iter().filter(|field| *field != Self::Pin)
    }
}

impl fmt::Display for DetailField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Borrowed, typed view of one column value for binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Integer(Option<i64>),
    Text(Option<&'a str>),
}

impl FieldValue<'_> {
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Integer(None) | Self::Text(None))
    }
}

/// One row of `property_details`; every non-key field is nullable
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PropertyDetailRecord {
    pub pin: i64,
    pub address: Option<String>,
    pub city: Option<String>,
    pub township: Option<String>,
    pub property_classification: Option<String>,
    pub square_footage: Option<i64>,
    pub neighborhood: Option<String>,
    pub taxcode: Option<String>,
    pub next_scheduled_reassessment: Option<String>,
    pub description: Option<String>,
    pub age: Option<String>,
    pub building_square_footage: Option<i64>,
    pub assessment_phase: Option<String>,
    pub previous_board_certified: Option<i64>,
    pub status: Option<String>,
    pub assessor_valuation: Option<i64>,
    pub assessor_post_appeal_valuation: Option<i64>,
    pub appeal_number: Option<String>,
    pub attorney_tax_representative: Option<String>,
    pub applicant: Option<String>,
    pub result: Option<String>,
    pub reason: Option<String>,
    pub tax_year: Option<String>,
    pub certificate_number: Option<String>,
    pub property_location: Option<String>,
    #[serde(rename = "COfEDescription")]
    pub c_of_e_description: Option<String>,
    pub comments: Option<String>,
    pub residence_type: Option<String>,
    #[serde(rename = "Use")]
    pub land_use: Option<String>,
    pub apartments: Option<String>,
    pub exterior_construction: Option<String>,
    pub full_baths: Option<String>,
    pub half_baths: Option<String>,
    pub basement1: Option<String>,
    pub attic: Option<String>,
    pub central_air: Option<String>,
    pub number_of_fireplaces: Option<String>,
    pub garage_size_type2: Option<String>,
}

impl PropertyDetailRecord {
    /// Record carrying only the key
    pub fn empty(pin: i64) -> Self {
        Self {
            pin,
            ..Self::default()
        }
    }

    /// Typed value of one column, in the shape the store binds it
    pub fn value(&self, field: DetailField) -> FieldValue<'_> {
        use DetailField as F;

        fn text(value: &Option<String>) -> FieldValue<'_> {
            FieldValue::Text(value.as_deref())
        }

        match field {
            F::Pin => FieldValue::Integer(Some(self.pin)),
            F::Address => text(&self.address),
            F::City => text(&self.city),
            F::Township => text(&self.township),
            F::PropertyClassification => text(&self.property_classification),
            F::SquareFootage => FieldValue::Integer(self.square_footage),
            F::Neighborhood => text(&self.neighborhood),
            F::Taxcode => text(&self.taxcode),
            F::NextScheduledReassessment => text(&self.next_scheduled_reassessment),
            F::Description => text(&self.description),
            F::Age => text(&self.age),
            F::BuildingSquareFootage => FieldValue::Integer(self.building_square_footage),
            F::AssessmentPhase => text(&self.assessment_phase),
            F::PreviousBoardCertified => FieldValue::Integer(self.previous_board_certified),
            F::Status => text(&self.status),
            F::AssessorValuation => FieldValue::Integer(self.assessor_valuation),
            F::AssessorPostAppealValuation => {
                FieldValue::Integer(self.assessor_post_appeal_valuation)
            }
            F::AppealNumber => text(&self.appeal_number),
            F::AttorneyTaxRepresentative => text(&self.attorney_tax_representative),
            F::Applicant => text(&self.applicant),
            F::Result => text(&self.result),
            F::Reason => text(&self.reason),
            F::TaxYear => text(&self.tax_year),
            F::CertificateNumber => text(&self.certificate_number),
            F::PropertyLocation => text(&self.property_location),
            F::COfEDescription => text(&self.c_of_e_description),
            F::Comments => text(&self.comments),
            F::ResidenceType => text(&self.residence_type),
            F::Use => text(&self.land_use),
            F::Apartments => text(&self.apartments),
            F::ExteriorConstruction => text(&self.exterior_construction),
            F::FullBaths => text(&self.full_baths),
            F::HalfBaths => text(&self.half_baths),
            F::Basement1 => text(&self.basement1),
            F::Attic => text(&self.attic),
            F::CentralAir => text(&self.central_air),
            F::NumberOfFireplaces => text(&self.number_of_fireplaces),
            F::GarageSizeType2 => text(&self.garage_size_type2),
        }
    }

    /// Number of non-key fields carrying a value
    pub fn populated_fields(&self) -> usize {
        DetailField::non_key()
            .filter(|field| !self.value(*field).is_null())
            .count()
    }
}
