//! Composite scores: weighted linear combinations of group percentages.
//!
//! The engine does not know which scores exist. Each domain declares its
//! own [`ScoreDefinition`]s and this module evaluates whatever it is given,
//! either against the global totals or against every ward.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ward_stats_indicator_models::{Category, EntityStat, GroupStat, percentage};

/// Which totals a score is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreScope {
    /// Once, over the grand total.
    #[default]
    Global,
    /// Once per ward, over that ward's total.
    Entity,
}

/// One weighted term of a composite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreComponent {
    /// The group's percentage of the scope total.
    Group {
        /// Group name.
        group: String,
        /// Weight applied to the percentage.
        weight: f64,
    },
    /// `100 -` the group's percentage, for groups where less is better.
    Complement {
        /// Group name.
        group: String,
        /// Weight applied to the complement.
        weight: f64,
    },
    /// `100 -` the largest group percentage (see [`diversity_index`]).
    Diversity {
        /// Weight applied to the diversity index.
        weight: f64,
    },
}

impl ScoreComponent {
    /// The component's weight.
    #[must_use]
    pub const fn weight(&self) -> f64 {
        match self {
            Self::Group { weight, .. }
            | Self::Complement { weight, .. }
            | Self::Diversity { weight } => *weight,
        }
    }

    /// The group this component reads, if any.
    #[must_use]
    pub fn group(&self) -> Option<&str> {
        match self {
            Self::Group { group, .. } | Self::Complement { group, .. } => Some(group.as_str()),
            Self::Diversity { .. } => None,
        }
    }

    /// Unweighted value of this component for a scope.
    #[must_use]
    pub fn value(&self, shares: &GroupShares) -> f64 {
        match self {
            Self::Group { group, .. } => shares.share(group),
            Self::Complement { group, .. } => 100.0 - shares.share(group),
            Self::Diversity { .. } => diversity_index(shares.shares.values().copied()),
        }
    }
}

/// A named composite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreDefinition {
    /// Unique score name.
    pub name: String,
    /// Display label used in narrative text.
    #[serde(default)]
    pub label: Option<String>,
    /// Which totals the score is evaluated against.
    #[serde(default)]
    pub scope: ScoreScope,
    /// Weighted terms.
    pub components: Vec<ScoreComponent>,
}

impl ScoreDefinition {
    /// Creates a score with no components.
    #[must_use]
    pub fn new(name: impl Into<String>, scope: ScoreScope) -> Self {
        Self {
            name: name.into(),
            label: None,
            scope,
            components: Vec::new(),
        }
    }

    /// Sets the display label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Adds a [`ScoreComponent::Group`] term.
    #[must_use]
    pub fn group(mut self, group: impl Into<String>, weight: f64) -> Self {
        self.components.push(ScoreComponent::Group {
            group: group.into(),
            weight,
        });
        self
    }

    /// Adds a [`ScoreComponent::Complement`] term.
    #[must_use]
    pub fn complement(mut self, group: impl Into<String>, weight: f64) -> Self {
        self.components.push(ScoreComponent::Complement {
            group: group.into(),
            weight,
        });
        self
    }

    /// Adds a [`ScoreComponent::Diversity`] term.
    #[must_use]
    pub fn diversity(mut self, weight: f64) -> Self {
        self.components.push(ScoreComponent::Diversity { weight });
        self
    }

    /// Display label, falling back to the name.
    #[must_use]
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Sum of all component weights.
    #[must_use]
    pub fn weight_sum(&self) -> f64 {
        self.components.iter().map(ScoreComponent::weight).sum()
    }

    /// Evaluates the score for one scope. A scope with a zero total scores 0.
    #[must_use]
    pub fn evaluate(&self, shares: &GroupShares) -> f64 {
        if shares.total == 0 {
            return 0.0;
        }
        self.components
            .iter()
            .map(|c| c.value(shares) * c.weight())
            .sum()
    }
}

/// Group percentages for one scope (global or a single ward).
#[derive(Debug, Clone, PartialEq)]
pub struct GroupShares {
    total: u64,
    shares: BTreeMap<String, f64>,
}

impl GroupShares {
    /// Builds shares from explicit group counts.
    #[must_use]
    pub fn from_counts<'a>(total: u64, counts: impl IntoIterator<Item = (&'a str, u64)>) -> Self {
        Self {
            total,
            shares: counts
                .into_iter()
                .map(|(group, count)| (group.to_string(), percentage(count, total)))
                .collect(),
        }
    }

    /// Shares against the grand total.
    #[must_use]
    pub fn global(groups: &BTreeMap<String, GroupStat>, grand_total: u64) -> Self {
        Self {
            total: grand_total,
            shares: groups
                .iter()
                .map(|(group, stat)| (group.clone(), stat.percentage))
                .collect(),
        }
    }

    /// Shares against one ward's total.
    #[must_use]
    pub fn entity<C: Category>(entity: &EntityStat<C>) -> Self {
        Self::from_counts(
            entity.total,
            entity.groups.iter().map(|(g, c)| (g.as_str(), *c)),
        )
    }

    /// Percentage of `group`, 0 when unknown.
    #[must_use]
    pub fn share(&self, group: &str) -> f64 {
        self.shares.get(group).copied().unwrap_or(0.0)
    }
}

/// `100 - max(shares)`: more even distributions score higher.
///
/// Returns 0 for an empty set of shares.
#[must_use]
pub fn diversity_index(shares: impl IntoIterator<Item = f64>) -> f64 {
    shares
        .into_iter()
        .reduce(f64::max)
        .map_or(0.0, |max| (100.0 - max).max(0.0))
}

/// Evaluates every score definition. Global scores are returned; ward
/// scores are written into each [`EntityStat::scores`].
pub fn apply_scores<C: Category>(
    definitions: &[ScoreDefinition],
    groups: &BTreeMap<String, GroupStat>,
    grand_total: u64,
    entities: &mut BTreeMap<u32, EntityStat<C>>,
) -> BTreeMap<String, f64> {
    let global = GroupShares::global(groups, grand_total);
    let mut composite = BTreeMap::new();

    for definition in definitions {
        match definition.scope {
            ScoreScope::Global => {
                composite.insert(definition.name.clone(), definition.evaluate(&global));
            }
            ScoreScope::Entity => {
                for entity in entities.values_mut() {
                    let value = definition.evaluate(&GroupShares::entity(entity));
                    entity.scores.insert(definition.name.clone(), value);
                }
            }
        }
    }

    composite
}
