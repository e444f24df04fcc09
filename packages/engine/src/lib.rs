#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Indicator aggregation and scoring engine.
//!
//! Turns raw `(ward, category, count)` rows into normalized statistics,
//! rankings, composite indices and templated narrative text. The pipeline is
//! a chain of pure functions:
//!
//! 1. [`normalize`] merges duplicate rows,
//! 2. [`aggregate`] computes totals, shares and per-ward rollups,
//! 3. [`rank`] orders categories and wards,
//! 4. [`score`] evaluates the configured composite indices,
//! 5. [`narrative`] renders sentences from the result.
//!
//! Nothing here performs I/O. A single implementation serves every
//! statistical domain; each domain supplies its own category enumeration
//! and an [`EngineConfig`].

pub mod aggregate;
pub mod config;
pub mod narrative;
pub mod normalize;
pub mod rank;
pub mod score;

#[cfg(test)]
mod test_support;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ward_stats_indicator_models::{Category, IndicatorRow, ProcessedResult, RawIndicatorRow};

pub use config::{DEFAULT_TOP_N, EngineConfig, EngineConfigBuilder};
pub use narrative::{Narrative, NarrativeConfig, NumberFormatter, PlainFormatter};

/// Errors raised while building an [`EngineConfig`].
///
/// Row data never produces errors; only caller configuration does.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A category key does not belong to the domain enumeration.
    #[error("Unknown category key '{key}'")]
    UnknownCategory {
        /// The offending key.
        key: String,
    },

    /// A weight is negative or not finite.
    #[error("Score '{score}' has invalid weight {weight}")]
    InvalidWeight {
        /// Score name.
        score: String,
        /// The offending weight.
        weight: f64,
    },

    /// The weights of a score add up to more than 1.
    #[error("Score '{score}' weights sum to {sum}, which exceeds 1")]
    WeightSumExceeded {
        /// Score name.
        score: String,
        /// Sum of the score's weights.
        sum: f64,
    },

    /// A score or narrative rule references a group no category maps to.
    #[error("'{owner}' references unknown group '{group}'")]
    UnknownGroup {
        /// Score name or narrative rule that holds the reference.
        owner: String,
        /// The unknown group name.
        group: String,
    },

    /// A narrative rule references a score that is not defined.
    #[error("'{owner}' references unknown score '{score}'")]
    UnknownScore {
        /// Narrative rule that holds the reference.
        owner: String,
        /// The unknown score name.
        score: String,
    },

    /// Two scores share a name.
    #[error("Duplicate score '{name}'")]
    DuplicateScore {
        /// The repeated name.
        name: String,
    },
}

/// A processed result together with its narrative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound = "C: Category")]
pub struct Report<C> {
    /// Computed statistics.
    pub result: ProcessedResult<C>,
    /// Generated sentences.
    pub narrative: Narrative,
}

/// Runs the statistics stages of the pipeline over typed rows.
///
/// Empty input yields [`ProcessedResult::empty`].
#[must_use]
pub fn process<C: Category>(
    rows: &[IndicatorRow<C>],
    config: &EngineConfig<C>,
) -> ProcessedResult<C> {
    let canonical = normalize::normalize(rows);
    if canonical.is_empty() {
        log::debug!("No indicator rows, returning empty result");
        return ProcessedResult::empty();
    }

    let aggregate::Aggregates {
        grand_total,
        categories,
        mut entities,
        groups,
    } = aggregate::aggregate(&canonical, config);

    let category_stats = rank::rank_categories(categories);
    let top_n = rank::top_n(&category_stats, config.top_n());
    let composite_scores =
        score::apply_scores(config.scores(), &groups, grand_total, &mut entities);

    log::debug!(
        "Processed {} canonical rows: total={grand_total} categories={} wards={}",
        canonical.len(),
        category_stats.len(),
        entities.len()
    );

    ProcessedResult {
        grand_total,
        category_stats,
        top_n,
        entity_stats: entities,
        category_groups: groups,
        composite_scores,
    }
}

/// Like [`process`], but accepts rows whose category is still an untyped
/// key. Unknown keys are routed to [`Category::OTHER`].
#[must_use]
pub fn process_raw<C: Category>(
    rows: &[RawIndicatorRow],
    config: &EngineConfig<C>,
) -> ProcessedResult<C> {
    process(&normalize::route_raw(rows), config)
}

/// Runs the full pipeline, including the narrative generator.
#[must_use]
pub fn run<C: Category>(
    rows: &[IndicatorRow<C>],
    config: &EngineConfig<C>,
    formatter: &dyn NumberFormatter,
) -> Report<C> {
    let result = process(rows, config);
    let narrative = narrative::generate(&result, config, formatter);
    Report { result, narrative }
}
