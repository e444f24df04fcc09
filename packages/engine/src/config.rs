//! Caller-supplied configuration: labels, category groups, composite score
//! definitions, narrative templates and the top-N size.
//!
//! An [`EngineConfig`] can only be obtained through
//! [`EngineConfigBuilder::build`], which validates it. The pipeline therefore
//! never has to deal with a malformed configuration.

use std::collections::{BTreeMap, BTreeSet};

use ward_stats_indicator_models::Category;

use crate::ConfigError;
use crate::narrative::{Condition, NarrativeConfig};
use crate::rank::EntityMetric;
use crate::score::{ScoreDefinition, ScoreScope};

/// Number of categories kept in `top_n` when the caller does not say
/// otherwise.
pub const DEFAULT_TOP_N: usize = 5;

/// Tolerance applied when checking that a score's weights sum to at most 1.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Validated engine configuration for one statistical domain.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig<C> {
    labels: BTreeMap<C, String>,
    groups: BTreeMap<C, String>,
    group_labels: BTreeMap<String, String>,
    scores: Vec<ScoreDefinition>,
    narrative: NarrativeConfig<C>,
    top_n: usize,
}

impl<C: Category> EngineConfig<C> {
    /// Starts building a configuration.
    #[must_use]
    pub fn builder() -> EngineConfigBuilder<C> {
        EngineConfigBuilder::default()
    }

    /// Display label for `category`, falling back to the category key.
    #[must_use]
    pub fn label(&self, category: C) -> String {
        self.labels
            .get(&category)
            .cloned()
            .unwrap_or_else(|| category.to_string())
    }

    /// Group that `category` belongs to, if any.
    #[must_use]
    pub fn group_of(&self, category: C) -> Option<&str> {
        self.groups.get(&category).map(String::as_str)
    }

    /// Every group at least one category maps to.
    #[must_use]
    pub fn group_names(&self) -> BTreeSet<&str> {
        self.groups.values().map(String::as_str).collect()
    }

    /// Display label for a group, falling back to the group name.
    #[must_use]
    pub fn group_label<'a>(&'a self, group: &'a str) -> &'a str {
        self.group_labels.get(group).map_or(group, String::as_str)
    }

    /// Composite score definitions, in declaration order.
    #[must_use]
    pub fn scores(&self) -> &[ScoreDefinition] {
        &self.scores
    }

    /// Looks up a score definition by name.
    #[must_use]
    pub fn score(&self, name: &str) -> Option<&ScoreDefinition> {
        self.scores.iter().find(|s| s.name == name)
    }

    /// Narrative templates and advisory rules.
    #[must_use]
    pub const fn narrative(&self) -> &NarrativeConfig<C> {
        &self.narrative
    }

    /// Number of categories kept in `top_n`.
    #[must_use]
    pub const fn top_n(&self) -> usize {
        self.top_n
    }

    /// Returns a copy of this configuration with a different top-N size.
    #[must_use]
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }
}

/// Builder for [`EngineConfig`].
#[derive(Debug, Clone)]
pub struct EngineConfigBuilder<C> {
    labels: BTreeMap<C, String>,
    groups: BTreeMap<C, String>,
    group_labels: BTreeMap<String, String>,
    scores: Vec<ScoreDefinition>,
    narrative: NarrativeConfig<C>,
    top_n: usize,
}

impl<C: Category> Default for EngineConfigBuilder<C> {
    fn default() -> Self {
        Self {
            labels: BTreeMap::new(),
            groups: BTreeMap::new(),
            group_labels: BTreeMap::new(),
            scores: Vec::new(),
            narrative: NarrativeConfig::default(),
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl<C: Category> EngineConfigBuilder<C> {
    /// Sets the display label of a category.
    #[must_use]
    pub fn label(mut self, category: C, label: impl Into<String>) -> Self {
        self.labels.insert(category, label.into());
        self
    }

    /// Assigns a category to a group. A category belongs to at most one
    /// group; later assignments win.
    #[must_use]
    pub fn group(mut self, category: C, group: impl Into<String>) -> Self {
        self.groups.insert(category, group.into());
        self
    }

    /// Sets the display label of a group.
    #[must_use]
    pub fn group_label(mut self, group: impl Into<String>, label: impl Into<String>) -> Self {
        self.group_labels.insert(group.into(), label.into());
        self
    }

    /// Adds a composite score definition.
    #[must_use]
    pub fn score(mut self, score: ScoreDefinition) -> Self {
        self.scores.push(score);
        self
    }

    /// Replaces the narrative configuration.
    #[must_use]
    pub fn narrative(mut self, narrative: NarrativeConfig<C>) -> Self {
        self.narrative = narrative;
        self
    }

    /// Sets the number of categories kept in `top_n`.
    #[must_use]
    pub const fn top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Validates and finishes the configuration.
    ///
    /// Weights must be finite and non-negative, the weights of each score
    /// must sum to at most 1, and every group or score referenced by a score
    /// or narrative rule must exist. Invalid weights are rejected rather than
    /// clamped.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn build(self) -> Result<EngineConfig<C>, ConfigError> {
        let known_groups: BTreeSet<&str> = self.groups.values().map(String::as_str).collect();

        let mut seen = BTreeSet::new();
        for score in &self.scores {
            if !seen.insert(score.name.as_str()) {
                return Err(ConfigError::DuplicateScore {
                    name: score.name.clone(),
                });
            }
            validate_score(score, &known_groups)?;
        }

        validate_narrative(&self.narrative, &known_groups, &self.scores)?;

        Ok(EngineConfig {
            labels: self.labels,
            groups: self.groups,
            group_labels: self.group_labels,
            scores: self.scores,
            narrative: self.narrative,
            top_n: self.top_n,
        })
    }
}

fn validate_score(
    score: &ScoreDefinition,
    known_groups: &BTreeSet<&str>,
) -> Result<(), ConfigError> {
    for component in &score.components {
        let weight = component.weight();
        if !weight.is_finite() || weight < 0.0 {
            return Err(ConfigError::InvalidWeight {
                score: score.name.clone(),
                weight,
            });
        }
        if let Some(group) = component.group()
            && !known_groups.contains(group)
        {
            return Err(ConfigError::UnknownGroup {
                owner: score.name.clone(),
                group: group.to_string(),
            });
        }
    }

    let sum = score.weight_sum();
    if sum > 1.0 + WEIGHT_SUM_TOLERANCE {
        return Err(ConfigError::WeightSumExceeded {
            score: score.name.clone(),
            sum,
        });
    }

    Ok(())
}

fn validate_narrative<C: Category>(
    narrative: &NarrativeConfig<C>,
    known_groups: &BTreeSet<&str>,
    scores: &[ScoreDefinition],
) -> Result<(), ConfigError> {
    let check_group = |owner: &str, group: &str| {
        if known_groups.contains(group) {
            Ok(())
        } else {
            Err(ConfigError::UnknownGroup {
                owner: owner.to_string(),
                group: group.to_string(),
            })
        }
    };
    let check_score = |owner: &str, name: &str, scope: ScoreScope| {
        if scores.iter().any(|s| s.name == name && s.scope == scope) {
            Ok(())
        } else {
            Err(ConfigError::UnknownScore {
                owner: owner.to_string(),
                score: name.to_string(),
            })
        }
    };

    match &narrative.entity_metric {
        Some(EntityMetric::GroupShare { group }) => check_group("entity_metric", group)?,
        Some(EntityMetric::Score { name }) => {
            check_score("entity_metric", name, ScoreScope::Entity)?;
        }
        _ => {}
    }

    for advisory in &narrative.advisories {
        match &advisory.condition {
            Condition::GroupShareAbove { group, .. }
            | Condition::GroupShareBelow { group, .. } => {
                check_group(&advisory.template, group)?;
            }
            Condition::ScoreAbove { score, .. } | Condition::ScoreBelow { score, .. } => {
                check_score(&advisory.template, score, ScoreScope::Global)?;
            }
            Condition::CategoryShareAbove { .. } | Condition::CategoryShareBelow { .. } => {}
        }
    }

    Ok(())
}
