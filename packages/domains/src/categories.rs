//! Category enumerations for the built-in statistical domains.
//!
//! Keys are `SCREAMING_SNAKE_CASE` and parse case-insensitively. Anything
//! that does not parse lands in the enum's `Other` variant (see
//! [`Category::parse_or_other`]).

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use ward_stats_indicator_models::Category;

/// How a household holds its dwelling.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum HousingTenure {
    /// Owned by the household.
    Owned,
    /// Rented from a private landlord.
    Rented,
    /// Provided by an employer or institution.
    Institutional,
    /// Occupied without a title.
    Squatter,
    /// Anything else.
    Other,
}

impl Category for HousingTenure {
    const OTHER: Self = Self::Other;

    fn all() -> &'static [Self] {
        &[
            Self::Owned,
            Self::Rented,
            Self::Institutional,
            Self::Squatter,
            Self::Other,
        ]
    }
}

/// Main crop grown by a farming household.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum AgricultureCrop {
    Paddy,
    Maize,
    Wheat,
    Millet,
    Pulses,
    Vegetables,
    Fruits,
    CashCrops,
    Other,
}

impl Category for AgricultureCrop {
    const OTHER: Self = Self::Other;

    fn all() -> &'static [Self] {
        &[
            Self::Paddy,
            Self::Maize,
            Self::Wheat,
            Self::Millet,
            Self::Pulses,
            Self::Vegetables,
            Self::Fruits,
            Self::CashCrops,
            Self::Other,
        ]
    }
}

/// Country a remittance-sending household member works in.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum RemittanceDestination {
    India,
    Qatar,
    SaudiArabia,
    Uae,
    Kuwait,
    Malaysia,
    SouthKorea,
    Japan,
    Australia,
    UnitedStates,
    UnitedKingdom,
    Other,
}

impl Category for RemittanceDestination {
    const OTHER: Self = Self::Other;

    fn all() -> &'static [Self] {
        &[
            Self::India,
            Self::Qatar,
            Self::SaudiArabia,
            Self::Uae,
            Self::Kuwait,
            Self::Malaysia,
            Self::SouthKorea,
            Self::Japan,
            Self::Australia,
            Self::UnitedStates,
            Self::UnitedKingdom,
            Self::Other,
        ]
    }
}

/// Vaccine dose recorded by the ward health post.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum ImmunizationIndicator {
    /// Given at birth.
    Bcg,
    /// DPT-HepB-Hib series.
    Pentavalent,
    /// Oral polio.
    Opv,
    /// Inactivated polio.
    Ipv,
    /// Pneumococcal conjugate.
    Pcv,
    Rota,
    /// Measles-rubella.
    MeaslesRubella,
    JapaneseEncephalitis,
    /// Typhoid conjugate.
    Tcv,
    Other,
}

impl Category for ImmunizationIndicator {
    const OTHER: Self = Self::Other;

    fn all() -> &'static [Self] {
        &[
            Self::Bcg,
            Self::Pentavalent,
            Self::Opv,
            Self::Ipv,
            Self::Pcv,
            Self::Rota,
            Self::MeaslesRubella,
            Self::JapaneseEncephalitis,
            Self::Tcv,
            Self::Other,
        ]
    }
}
