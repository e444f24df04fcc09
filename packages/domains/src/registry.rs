//! Domain registry: the built-in domains and their embedded TOML configs.
//!
//! Each `.toml` file in `packages/domains/configs/` is baked into the binary
//! at compile time via [`include_str!`]. Adding a domain means adding a
//! category enum, a TOML file and a [`Domain`] variant.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use ward_stats_engine::{Narrative, NumberFormatter, narrative, process_raw};
use ward_stats_indicator_models::{Category, RawIndicatorRow};

use crate::DomainError;
use crate::categories::{
    AgricultureCrop, HousingTenure, ImmunizationIndicator, RemittanceDestination,
};
use crate::domain_config::parse_domain_toml;

/// A registered statistical domain.
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Domain {
    /// Households by dwelling ownership ([`HousingTenure`]).
    HousingTenure,
    /// Farming households by main crop ([`AgricultureCrop`]).
    Agriculture,
    /// Migrant workers by destination country ([`RemittanceDestination`]).
    Remittance,
    /// Vaccine doses by antigen ([`ImmunizationIndicator`]).
    Immunization,
}

impl Domain {
    /// Returns all registered domains.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::HousingTenure,
            Self::Agriculture,
            Self::Remittance,
            Self::Immunization,
        ]
    }

    /// Looks up a domain by its key.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::UnknownDomain`] if no domain has that key.
    pub fn from_key(key: &str) -> Result<Self, DomainError> {
        key.trim()
            .parse()
            .map_err(|_| DomainError::UnknownDomain(key.to_string()))
    }

    /// The embedded TOML config for this domain.
    #[must_use]
    pub const fn config_toml(self) -> &'static str {
        match self {
            Self::HousingTenure => include_str!("../configs/housing_tenure.toml"),
            Self::Agriculture => include_str!("../configs/agriculture.toml"),
            Self::Remittance => include_str!("../configs/remittance.toml"),
            Self::Immunization => include_str!("../configs/immunization.toml"),
        }
    }
}

/// Per-invocation overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Replaces the configured top-N size.
    pub top_n: Option<usize>,
}

/// Output of [`run_domain`].
///
/// The result is kept as JSON so callers do not need to know the domain's
/// category type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainReport {
    /// The domain that produced the report.
    pub domain: Domain,
    /// Human-readable domain name.
    pub name: String,
    /// The serialized `ProcessedResult`.
    pub result: serde_json::Value,
    /// Generated sentences.
    pub narrative: Narrative,
}

/// Summary of a validated domain config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainSummary {
    /// The domain whose category enumeration was used.
    pub domain: Domain,
    /// Config identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// What the counts represent.
    pub description: Option<String>,
    /// Category keys of the domain enumeration.
    pub categories: Vec<String>,
    /// Configured group names.
    pub groups: Vec<String>,
    /// Configured score names.
    pub scores: Vec<String>,
}

/// Runs the full pipeline for `domain` over raw rows.
///
/// Category keys that are not part of the domain's enumeration are counted
/// in its `OTHER` bucket.
///
/// # Errors
///
/// * [`DomainError::Parse`] or [`DomainError::Config`] if the embedded config
///   is invalid
/// * [`DomainError::Serialize`] if the result cannot be converted to JSON
pub fn run_domain(
    domain: Domain,
    rows: &[RawIndicatorRow],
    options: RunOptions,
    formatter: &dyn NumberFormatter,
) -> Result<DomainReport, DomainError> {
    match domain {
        Domain::HousingTenure => run_typed::<HousingTenure>(domain, rows, options, formatter),
        Domain::Agriculture => run_typed::<AgricultureCrop>(domain, rows, options, formatter),
        Domain::Remittance => {
            run_typed::<RemittanceDestination>(domain, rows, options, formatter)
        }
        Domain::Immunization => {
            run_typed::<ImmunizationIndicator>(domain, rows, options, formatter)
        }
    }
}

fn run_typed<C: Category>(
    domain: Domain,
    rows: &[RawIndicatorRow],
    options: RunOptions,
    formatter: &dyn NumberFormatter,
) -> Result<DomainReport, DomainError> {
    let config = parse_domain_toml(domain.config_toml())?;
    let mut engine = config.engine_config::<C>()?;
    if let Some(top_n) = options.top_n {
        engine = engine.with_top_n(top_n);
    }

    log::debug!("Running {} pipeline over {} rows", config.id, rows.len());

    let result = process_raw(rows, &engine);
    let narrative = narrative::generate(&result, &engine, formatter);

    Ok(DomainReport {
        domain,
        name: config.name,
        result: serde_json::to_value(&result)?,
        narrative,
    })
}

/// Parses and validates a domain config against `domain`'s category
/// enumeration.
///
/// # Errors
///
/// * [`DomainError::Parse`] if the TOML is malformed
/// * [`DomainError::Config`] if the config does not validate
pub fn validate_domain_toml(domain: Domain, toml_str: &str) -> Result<DomainSummary, DomainError> {
    match domain {
        Domain::HousingTenure => summarize::<HousingTenure>(domain, toml_str),
        Domain::Agriculture => summarize::<AgricultureCrop>(domain, toml_str),
        Domain::Remittance => summarize::<RemittanceDestination>(domain, toml_str),
        Domain::Immunization => summarize::<ImmunizationIndicator>(domain, toml_str),
    }
}

/// Summary of a built-in domain's embedded config.
///
/// # Errors
///
/// Returns an error if the embedded config does not validate.
pub fn describe(domain: Domain) -> Result<DomainSummary, DomainError> {
    validate_domain_toml(domain, domain.config_toml())
}

fn summarize<C: Category>(domain: Domain, toml_str: &str) -> Result<DomainSummary, DomainError> {
    let config = parse_domain_toml(toml_str)?;
    let engine = config.engine_config::<C>()?;

    Ok(DomainSummary {
        domain,
        id: config.id,
        name: config.name,
        description: config.description,
        categories: C::all().iter().map(ToString::to_string).collect(),
        groups: engine
            .group_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
        scores: engine.scores().iter().map(|s| s.name.clone()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ward_stats_engine::{ConfigError, PlainFormatter};

    fn raw(entity_id: u32, category: &str, count: u64) -> RawIndicatorRow {
        RawIndicatorRow {
            entity_id,
            category: category.to_string(),
            count,
        }
    }

    fn housing_rows() -> Vec<RawIndicatorRow> {
        vec![
            raw(1, "OWNED", 80),
            raw(1, "RENTED", 15),
            raw(1, "SQUATTER", 5),
            raw(2, "OWNED", 40),
            raw(2, "RENTED", 50),
            raw(2, "SQUATTER", 10),
        ]
    }

    fn run(domain: Domain, rows: &[RawIndicatorRow]) -> DomainReport {
        run_domain(
            domain,
            rows,
            RunOptions::default(),
            &PlainFormatter::default(),
        )
        .unwrap()
    }

    #[test]
    fn every_embedded_config_validates() {
        for domain in Domain::all() {
            let summary = describe(*domain).unwrap_or_else(|e| panic!("{domain}: {e}"));
            assert_eq!(summary.id, domain.to_string(), "config id matches domain key");
            assert!(!summary.name.is_empty(), "{domain}: name is empty");
            assert!(!summary.groups.is_empty(), "{domain}: no groups");
            assert!(!summary.scores.is_empty(), "{domain}: no scores");
            assert_eq!(summary.categories.last().map(String::as_str), Some("OTHER"));
        }
    }

    #[test]
    fn domain_keys_round_trip() {
        for domain in Domain::all() {
            assert_eq!(Domain::from_key(&domain.to_string()).unwrap(), *domain);
        }
        assert!(matches!(
            Domain::from_key("fisheries"),
            Err(DomainError::UnknownDomain(ref key)) if key == "fisheries"
        ));
    }

    #[test]
    fn housing_report() {
        let report = run(Domain::HousingTenure, &housing_rows());
        assert_eq!(report.result["grandTotal"], 200);
        assert_eq!(report.result["topN"][0]["category"], "OWNED");
        assert_eq!(report.result["categoryGroups"]["secure"]["count"], 120);

        let sentences = &report.narrative.sentences;
        assert_eq!(
            sentences[0],
            "A total of 200 households were recorded across 2 wards."
        );
        assert_eq!(
            sentences[1],
            "Owned dwellings account for 120 households (60.0%)."
        );
        for expected in [
            "The secure tenure group makes up 60.0% of households.",
            "The municipal tenure security index stands at 69.75.",
            "Ward 1 has the highest ward tenure security at 84.50.",
            "Ward 2 has the lowest ward tenure security at 55.00.",
        ] {
            assert!(sentences.iter().any(|s| s == expected), "missing: {expected}");
        }
        assert!(
            !sentences.iter().any(|s| s.contains("without title exceed")),
            "informal share is 7.5%, below the advisory threshold"
        );
    }

    #[test]
    fn unknown_keys_are_reported_as_other() {
        let mut rows = housing_rows();
        rows.push(raw(2, "HUT", 3));
        let report = run(Domain::HousingTenure, &rows);
        assert_eq!(report.result["grandTotal"], 203);

        let other = report.result["categoryStats"]
            .as_array()
            .unwrap()
            .iter()
            .find(|s| s["category"] == "OTHER")
            .unwrap();
        assert_eq!(other["count"], 3);
        assert_eq!(other["label"], "Other");
    }

    #[test]
    fn empty_rows_give_no_data() {
        let report = run(Domain::Agriculture, &[]);
        assert_eq!(report.result["grandTotal"], 0);
        assert_eq!(report.narrative.sentences, vec!["No data available."]);
    }

    #[test]
    fn top_n_override() {
        let report = run_domain(
            Domain::HousingTenure,
            &housing_rows(),
            RunOptions { top_n: Some(1) },
            &PlainFormatter::default(),
        )
        .unwrap();
        assert_eq!(report.result["topN"].as_array().unwrap().len(), 1);
        assert_eq!(report.result["categoryStats"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn remittance_gulf_advisory() {
        let rows = vec![
            raw(3, "QATAR", 30),
            raw(3, "UAE", 25),
            raw(3, "INDIA", 20),
            raw(4, "MALAYSIA", 25),
        ];
        let report = run(Domain::Remittance, &rows);
        let sentences = &report.narrative.sentences;
        for expected in [
            "More than half of migrant workers (55.0%) are in Gulf countries.",
            "Ward 3 sends the most workers abroad (75).",
            "Ward 4 sends the fewest (25).",
        ] {
            assert!(
                sentences.iter().any(|s| s == expected),
                "missing: {expected} in {sentences:?}"
            );
        }
    }

    #[test]
    fn validate_rejects_overweight_scores() {
        let toml = r#"
id = "custom"
name = "Custom"

[groups]
PADDY = "cereals"

[[scores]]
name = "heavy"
components = [
    { kind = "group", group = "cereals", weight = 0.9 },
    { kind = "diversity", weight = 0.2 },
]
"#;
        let err = validate_domain_toml(Domain::Agriculture, toml).unwrap_err();
        assert!(matches!(
            err,
            DomainError::Config(ConfigError::WeightSumExceeded { .. })
        ));
    }

    #[test]
    fn validate_checks_keys_against_the_chosen_domain() {
        let toml = r#"
id = "custom"
name = "Custom"

[labels]
PADDY = "Rice"
"#;
        assert!(validate_domain_toml(Domain::Agriculture, toml).is_ok());
        assert!(matches!(
            validate_domain_toml(Domain::HousingTenure, toml),
            Err(DomainError::Config(ConfigError::UnknownCategory { .. }))
        ));
    }
}
