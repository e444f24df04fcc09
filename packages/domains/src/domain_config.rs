//! TOML domain definitions.
//!
//! Each domain is described by a TOML document holding its labels, category
//! groups, composite scores and narrative templates. Category keys are kept
//! as strings while parsing and only checked against the domain enumeration
//! when the engine configuration is built, so a typo is reported by name.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ward_stats_engine::score::ScoreDefinition;
use ward_stats_engine::{ConfigError, DEFAULT_TOP_N, EngineConfig, NarrativeConfig};
use ward_stats_indicator_models::Category;

use crate::DomainError;

/// A statistical domain definition, as read from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Unique domain identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// What the counts represent.
    #[serde(default)]
    pub description: Option<String>,
    /// Number of categories kept in `top_n`.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Category key to display label.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Category key to group name.
    #[serde(default)]
    pub groups: BTreeMap<String, String>,
    /// Group name to display label.
    #[serde(default)]
    pub group_labels: BTreeMap<String, String>,
    /// Composite score definitions.
    #[serde(default)]
    pub scores: Vec<ScoreDefinition>,
    /// Narrative templates and advisories, with category keys unresolved.
    #[serde(default)]
    pub narrative: NarrativeConfig<String>,
}

const fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

impl DomainConfig {
    /// Builds and validates the engine configuration for this domain,
    /// resolving category keys against `C` without regard to case.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::UnknownCategory`] if a label, group, ward metric or
    ///   advisory key is not a variant of the domain enumeration
    /// * any error raised by [`ward_stats_engine::EngineConfigBuilder::build`]
    pub fn engine_config<C: Category>(&self) -> Result<EngineConfig<C>, ConfigError> {
        let narrative = self
            .narrative
            .clone()
            .try_map_categories(|key| parse_key::<C>(&key))?;
        let mut builder = EngineConfig::builder().top_n(self.top_n).narrative(narrative);

        for (key, label) in &self.labels {
            builder = builder.label(parse_key::<C>(key)?, label.clone());
        }
        for (key, group) in &self.groups {
            builder = builder.group(parse_key::<C>(key)?, group.clone());
        }
        for (group, label) in &self.group_labels {
            builder = builder.group_label(group.clone(), label.clone());
        }
        for score in &self.scores {
            builder = builder.score(score.clone());
        }

        builder.build()
    }
}

fn parse_key<C: Category>(key: &str) -> Result<C, ConfigError> {
    C::parse_key(key).ok_or_else(|| ConfigError::UnknownCategory {
        key: key.to_string(),
    })
}

/// Parses a domain definition from a TOML string.
///
/// # Errors
///
/// Returns [`DomainError::Parse`] if the TOML is malformed or does not match
/// the expected shape.
pub fn parse_domain_toml(toml_str: &str) -> Result<DomainConfig, DomainError> {
    Ok(toml::de::from_str(toml_str)?)
}
