//! Templated narrative text.
//!
//! Sentences are accumulated in a [`SentenceBuilder`] as `{condition,
//! template, params}` entries and rendered in insertion order. Templates
//! use named `{placeholder}` positions; number rendering is delegated to an
//! injected [`NumberFormatter`] so that locale-aware digits stay outside the
//! engine.
//!
//! Section order is fixed: totals, top categories, groups, global scores,
//! best/worst ward, advisories.

use num_format::{Locale, ToFormattedString as _};
use serde::{Deserialize, Serialize};
use ward_stats_indicator_models::{Category, ProcessedResult};

use crate::EngineConfig;
use crate::rank::{self, EntityMetric, RankedEntity};
use crate::score::ScoreScope;

/// Renders numbers for narrative text.
pub trait NumberFormatter {
    /// Formats an integer count.
    fn format_count(&self, value: u64) -> String;

    /// Formats a percentage (without the `%` sign).
    fn format_percent(&self, value: f64) -> String;

    /// Formats a composite score value.
    fn format_score(&self, value: f64) -> String;
}

/// English digits with `,` thousands separators and fixed decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlainFormatter {
    /// Decimal places for percentages.
    pub percent_decimals: usize,
    /// Decimal places for scores.
    pub score_decimals: usize,
}

impl Default for PlainFormatter {
    fn default() -> Self {
        Self {
            percent_decimals: 1,
            score_decimals: 2,
        }
    }
}

impl NumberFormatter for PlainFormatter {
    fn format_count(&self, value: u64) -> String {
        value.to_formatted_string(&Locale::en)
    }

    fn format_percent(&self, value: f64) -> String {
        format!("{value:.prec$}", prec = self.percent_decimals)
    }

    fn format_score(&self, value: f64) -> String {
        format!("{value:.prec$}", prec = self.score_decimals)
    }
}

/// Threshold check gating an advisory sentence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition<C> {
    /// A group's share of the grand total is above the threshold.
    GroupShareAbove {
        /// Group name.
        group: String,
        /// Percentage threshold, 0-100.
        threshold: f64,
    },
    /// A group's share of the grand total is below the threshold.
    GroupShareBelow {
        /// Group name.
        group: String,
        /// Percentage threshold, 0-100.
        threshold: f64,
    },
    /// A category's share of the grand total is above the threshold.
    CategoryShareAbove {
        /// The category.
        category: C,
        /// Percentage threshold, 0-100.
        threshold: f64,
    },
    /// A category's share of the grand total is below the threshold.
    CategoryShareBelow {
        /// The category.
        category: C,
        /// Percentage threshold, 0-100.
        threshold: f64,
    },
    /// A global composite score is above the threshold.
    ScoreAbove {
        /// Score name.
        score: String,
        /// Score threshold.
        threshold: f64,
    },
    /// A global composite score is below the threshold.
    ScoreBelow {
        /// Score name.
        score: String,
        /// Score threshold.
        threshold: f64,
    },
}

impl<C> Condition<C> {
    /// Converts the category this condition refers to, if any.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` fails with.
    pub fn try_map_category<D, E>(
        self,
        f: impl FnOnce(C) -> Result<D, E>,
    ) -> Result<Condition<D>, E> {
        Ok(match self {
            Self::GroupShareAbove { group, threshold } => {
                Condition::GroupShareAbove { group, threshold }
            }
            Self::GroupShareBelow { group, threshold } => {
                Condition::GroupShareBelow { group, threshold }
            }
            Self::CategoryShareAbove {
                category,
                threshold,
            } => Condition::CategoryShareAbove {
                category: f(category)?,
                threshold,
            },
            Self::CategoryShareBelow {
                category,
                threshold,
            } => Condition::CategoryShareBelow {
                category: f(category)?,
                threshold,
            },
            Self::ScoreAbove { score, threshold } => Condition::ScoreAbove { score, threshold },
            Self::ScoreBelow { score, threshold } => Condition::ScoreBelow { score, threshold },
        })
    }
}

impl<C: Category> Condition<C> {
    /// The value this condition compares against its threshold.
    ///
    /// A category missing from the input observes 0; an unknown group or
    /// score observes nothing and never holds.
    #[must_use]
    pub fn observed(&self, result: &ProcessedResult<C>) -> Option<f64> {
        match self {
            Self::GroupShareAbove { group, .. } | Self::GroupShareBelow { group, .. } => {
                result.category_groups.get(group).map(|g| g.percentage)
            }
            Self::CategoryShareAbove { category, .. }
            | Self::CategoryShareBelow { category, .. } => {
                Some(result.category(*category).map_or(0.0, |s| s.percentage))
            }
            Self::ScoreAbove { score, .. } | Self::ScoreBelow { score, .. } => {
                result.composite_scores.get(score).copied()
            }
        }
    }

    /// The configured threshold.
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        match self {
            Self::GroupShareAbove { threshold, .. }
            | Self::GroupShareBelow { threshold, .. }
            | Self::CategoryShareAbove { threshold, .. }
            | Self::CategoryShareBelow { threshold, .. }
            | Self::ScoreAbove { threshold, .. }
            | Self::ScoreBelow { threshold, .. } => *threshold,
        }
    }

    const fn is_above(&self) -> bool {
        matches!(
            self,
            Self::GroupShareAbove { .. } | Self::CategoryShareAbove { .. } | Self::ScoreAbove { .. }
        )
    }

    const fn is_score(&self) -> bool {
        matches!(self, Self::ScoreAbove { .. } | Self::ScoreBelow { .. })
    }

    /// Returns `true` when the observed value crosses the threshold.
    #[must_use]
    pub fn holds(&self, result: &ProcessedResult<C>) -> bool {
        self.observed(result).is_some_and(|value| {
            if self.is_above() {
                value > self.threshold()
            } else {
                value < self.threshold()
            }
        })
    }
}

/// A conditional sentence.
///
/// Available placeholders: `{value}` (observed), `{threshold}`, and the
/// subject of the condition as `{group}`, `{label}` or `{score}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advisory<C> {
    /// When to emit the sentence.
    pub condition: Condition<C>,
    /// Sentence template.
    pub template: String,
}

/// Templates and thresholds for the narrative generator.
///
/// Setting a section template to `None` drops that section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeConfig<C> {
    /// The only sentence produced when the grand total is 0.
    pub no_data: String,
    /// Placeholders: `{total}`, `{entities}`.
    pub total: Option<String>,
    /// One sentence per top category. Placeholders: `{label}`, `{count}`,
    /// `{share}`, `{rank}`.
    pub top_category: Option<String>,
    /// How many of the top categories get a sentence.
    pub top_categories: usize,
    /// One sentence per non-empty group, largest first. Placeholders:
    /// `{group}`, `{count}`, `{share}`.
    pub group: Option<String>,
    /// One sentence per global score. Placeholders: `{score}`, `{value}`.
    pub score: Option<String>,
    /// Metric used for the best/worst ward sentences.
    pub entity_metric: Option<EntityMetric<C>>,
    /// Overrides the generated `{metric}` description.
    pub entity_metric_label: Option<String>,
    /// Placeholders: `{entity}`, `{metric}`, `{value}`.
    pub best_entity: Option<String>,
    /// Placeholders: `{entity}`, `{metric}`, `{value}`. Only emitted when
    /// there is more than one ward.
    pub worst_entity: Option<String>,
    /// Conditional sentences, emitted last in declaration order.
    pub advisories: Vec<Advisory<C>>,
}

impl<C> NarrativeConfig<C> {
    /// Converts every category key held by the ward metric and the
    /// advisories, stopping at the first key `f` rejects.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` fails with.
    pub fn try_map_categories<D, E>(
        self,
        mut f: impl FnMut(C) -> Result<D, E>,
    ) -> Result<NarrativeConfig<D>, E> {
        let entity_metric = self
            .entity_metric
            .map(|metric| metric.try_map_category(&mut f))
            .transpose()?;
        let advisories = self
            .advisories
            .into_iter()
            .map(|advisory| {
                Ok(Advisory {
                    condition: advisory.condition.try_map_category(&mut f)?,
                    template: advisory.template,
                })
            })
            .collect::<Result<Vec<_>, E>>()?;

        Ok(NarrativeConfig {
            no_data: self.no_data,
            total: self.total,
            top_category: self.top_category,
            top_categories: self.top_categories,
            group: self.group,
            score: self.score,
            entity_metric,
            entity_metric_label: self.entity_metric_label,
            best_entity: self.best_entity,
            worst_entity: self.worst_entity,
            advisories,
        })
    }
}

impl<C> Default for NarrativeConfig<C> {
    fn default() -> Self {
        Self {
            no_data: "No data available.".to_string(),
            total: Some(
                "A total of {total} records were reported across {entities} wards.".to_string(),
            ),
            top_category: Some("{label} accounts for {count} records ({share}%).".to_string()),
            top_categories: 3,
            group: Some("The {group} group makes up {share}% of the total.".to_string()),
            score: Some("The {score} index stands at {value}.".to_string()),
            entity_metric: None,
            entity_metric_label: None,
            best_entity: Some("Ward {entity} ranks highest by {metric} at {value}.".to_string()),
            worst_entity: Some("Ward {entity} ranks lowest by {metric} at {value}.".to_string()),
            advisories: Vec::new(),
        }
    }
}

/// The generated sentences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Narrative {
    /// Sentences in output order.
    pub sentences: Vec<String>,
}

impl Narrative {
    /// Joins the sentences with single spaces.
    #[must_use]
    pub fn text(&self) -> String {
        self.sentences.join(" ")
    }
}

/// One pending sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceEntry {
    /// Whether the sentence is emitted.
    pub condition: bool,
    /// Template with `{placeholder}` positions.
    pub template: String,
    /// Placeholder values.
    pub params: Vec<(&'static str, String)>,
}

impl SentenceEntry {
    /// Renders the template with this entry's params.
    #[must_use]
    pub fn render(&self) -> String {
        render(&self.template, &self.params)
    }
}

/// Accumulates sentences in a fixed order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SentenceBuilder {
    entries: Vec<SentenceEntry>,
}

impl SentenceBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds a sentence that is always emitted.
    pub fn push(&mut self, template: &str, params: Vec<(&'static str, String)>) -> &mut Self {
        self.push_if(true, template, params)
    }

    /// Adds a sentence that is emitted only when `condition` holds.
    pub fn push_if(
        &mut self,
        condition: bool,
        template: &str,
        params: Vec<(&'static str, String)>,
    ) -> &mut Self {
        self.entries.push(SentenceEntry {
            condition,
            template: template.to_string(),
            params,
        });
        self
    }

    /// All entries, including the ones whose condition failed.
    #[must_use]
    pub fn entries(&self) -> &[SentenceEntry] {
        &self.entries
    }

    /// Renders the entries whose condition holds, in insertion order.
    #[must_use]
    pub fn build(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.condition)
            .map(SentenceEntry::render)
            .collect()
    }
}

/// Replaces `{name}` placeholders with values from `params`. Unknown
/// placeholders are left as they are.
#[must_use]
pub fn render(template: &str, params: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };

        let key = &after[..close];
        match params.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => out.push_str(value),
            None => {
                out.push('{');
                out.push_str(key);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    out
}

/// Generates the narrative for a processed result.
///
/// Returns exactly the configured `no_data` sentence when the grand total
/// is 0.
#[must_use]
pub fn generate<C: Category>(
    result: &ProcessedResult<C>,
    config: &EngineConfig<C>,
    formatter: &dyn NumberFormatter,
) -> Narrative {
    let narrative = config.narrative();
    if result.is_empty() {
        return Narrative {
            sentences: vec![narrative.no_data.clone()],
        };
    }

    let mut builder = SentenceBuilder::new();
    push_totals(&mut builder, result, narrative, formatter);
    push_top_categories(&mut builder, result, narrative, formatter);
    push_groups(&mut builder, result, config, formatter);
    push_scores(&mut builder, result, config, formatter);
    push_entities(&mut builder, result, config, formatter);
    push_advisories(&mut builder, result, config, formatter);

    Narrative {
        sentences: builder.build(),
    }
}

fn push_totals<C: Category>(
    builder: &mut SentenceBuilder,
    result: &ProcessedResult<C>,
    narrative: &NarrativeConfig<C>,
    formatter: &dyn NumberFormatter,
) {
    if let Some(template) = &narrative.total {
        builder.push(
            template,
            vec![
                ("total", formatter.format_count(result.grand_total)),
                (
                    "entities",
                    formatter.format_count(result.entity_stats.len() as u64),
                ),
            ],
        );
    }
}

fn push_top_categories<C: Category>(
    builder: &mut SentenceBuilder,
    result: &ProcessedResult<C>,
    narrative: &NarrativeConfig<C>,
    formatter: &dyn NumberFormatter,
) {
    let Some(template) = &narrative.top_category else {
        return;
    };
    for stat in result.top_n.iter().take(narrative.top_categories) {
        builder.push_if(
            stat.count > 0,
            template,
            vec![
                ("label", stat.label.clone()),
                ("count", formatter.format_count(stat.count)),
                ("share", formatter.format_percent(stat.percentage)),
                ("rank", formatter.format_count(u64::from(stat.rank))),
            ],
        );
    }
}

fn push_groups<C: Category>(
    builder: &mut SentenceBuilder,
    result: &ProcessedResult<C>,
    config: &EngineConfig<C>,
    formatter: &dyn NumberFormatter,
) {
    let Some(template) = &config.narrative().group else {
        return;
    };
    let mut groups: Vec<_> = result.category_groups.iter().collect();
    groups.sort_by(|(na, a), (nb, b)| b.count.cmp(&a.count).then_with(|| na.cmp(nb)));

    for (name, stat) in groups {
        builder.push_if(
            stat.count > 0,
            template,
            vec![
                ("group", config.group_label(name).to_string()),
                ("count", formatter.format_count(stat.count)),
                ("share", formatter.format_percent(stat.percentage)),
            ],
        );
    }
}

fn push_scores<C: Category>(
    builder: &mut SentenceBuilder,
    result: &ProcessedResult<C>,
    config: &EngineConfig<C>,
    formatter: &dyn NumberFormatter,
) {
    let Some(template) = &config.narrative().score else {
        return;
    };
    for definition in config
        .scores()
        .iter()
        .filter(|s| s.scope == ScoreScope::Global)
    {
        if let Some(value) = result.composite_scores.get(&definition.name) {
            builder.push(
                template,
                vec![
                    ("score", definition.display_label().to_string()),
                    ("value", formatter.format_score(*value)),
                ],
            );
        }
    }
}

fn push_entities<C: Category>(
    builder: &mut SentenceBuilder,
    result: &ProcessedResult<C>,
    config: &EngineConfig<C>,
    formatter: &dyn NumberFormatter,
) {
    let narrative = config.narrative();
    let Some(metric) = &narrative.entity_metric else {
        return;
    };
    let metric_label = narrative
        .entity_metric_label
        .clone()
        .unwrap_or_else(|| describe_metric(metric, config));

    let ranking = rank::rank_entities(result, metric, rank::RankOrder::Descending);
    let entity_params = |entity: &RankedEntity| {
        vec![
            ("entity", formatter.format_count(u64::from(entity.entity_id))),
            ("metric", metric_label.clone()),
            ("value", format_metric_value(metric, entity.value, formatter)),
        ]
    };

    if let (Some(template), Some(best)) = (&narrative.best_entity, ranking.first()) {
        builder.push(template, entity_params(best));
    }
    if let Some(template) = &narrative.worst_entity
        && ranking.len() > 1
        && let Some(worst) = ranking.last()
    {
        builder.push(template, entity_params(worst));
    }
}

fn push_advisories<C: Category>(
    builder: &mut SentenceBuilder,
    result: &ProcessedResult<C>,
    config: &EngineConfig<C>,
    formatter: &dyn NumberFormatter,
) {
    for advisory in &config.narrative().advisories {
        let condition = &advisory.condition;
        let observed = condition.observed(result).unwrap_or(0.0);
        let (value, threshold) = if condition.is_score() {
            (
                formatter.format_score(observed),
                formatter.format_score(condition.threshold()),
            )
        } else {
            (
                formatter.format_percent(observed),
                formatter.format_percent(condition.threshold()),
            )
        };

        let subject = match condition {
            Condition::GroupShareAbove { group, .. } | Condition::GroupShareBelow { group, .. } => {
                ("group", config.group_label(group).to_string())
            }
            Condition::CategoryShareAbove { category, .. }
            | Condition::CategoryShareBelow { category, .. } => ("label", config.label(*category)),
            Condition::ScoreAbove { score, .. } | Condition::ScoreBelow { score, .. } => (
                "score",
                config
                    .score(score)
                    .map_or_else(|| score.clone(), |s| s.display_label().to_string()),
            ),
        };

        builder.push_if(
            condition.holds(result),
            &advisory.template,
            vec![("value", value), ("threshold", threshold), subject],
        );
    }
}

fn describe_metric<C: Category>(metric: &EntityMetric<C>, config: &EngineConfig<C>) -> String {
    match metric {
        EntityMetric::Total => "total count".to_string(),
        EntityMetric::DistinctCategories => "number of categories".to_string(),
        EntityMetric::CategoryShare { category } => format!("{} share", config.label(*category)),
        EntityMetric::GroupShare { group } => format!("{} share", config.group_label(group)),
        EntityMetric::Score { name } => config
            .score(name)
            .map_or_else(|| name.clone(), |s| s.display_label().to_string()),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn format_metric_value<C: Category>(
    metric: &EntityMetric<C>,
    value: f64,
    formatter: &dyn NumberFormatter,
) -> String {
    if metric.is_count() {
        return formatter.format_count(value.max(0.0).round() as u64);
    }
    match metric {
        EntityMetric::Score { .. } => formatter.format_score(value),
        _ => formatter.format_percent(value),
    }
}
