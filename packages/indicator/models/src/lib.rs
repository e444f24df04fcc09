#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Indicator row and result types shared by every statistical domain.
//!
//! A domain (housing tenure, agriculture, remittances, immunization, ...)
//! supplies a closed category enumeration implementing [`Category`]. Raw
//! per-ward rows are expressed as [`IndicatorRow`]s over that enumeration and
//! the engine turns them into a [`ProcessedResult`].

use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A closed, domain-specific category enumeration.
///
/// Every domain enum declares an [`OTHER`](Category::OTHER) bucket which
/// receives any upstream category key that does not parse into a known
/// variant.
pub trait Category:
    Copy
    + Eq
    + Ord
    + Hash
    + fmt::Debug
    + fmt::Display
    + FromStr
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// Bucket receiving unknown category keys.
    const OTHER: Self;

    /// Returns all variants of the enumeration, in declaration order.
    fn all() -> &'static [Self];

    /// Parses an upstream category key, ignoring surrounding whitespace.
    /// Returns `None` for keys that name no variant.
    #[must_use]
    fn parse_key(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }

    /// Parses an upstream category key, routing unknown keys to
    /// [`OTHER`](Category::OTHER).
    #[must_use]
    fn parse_or_other(raw: &str) -> Self {
        Self::parse_key(raw).unwrap_or(Self::OTHER)
    }
}

/// One observation: a count for a category within an entity (ward).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound = "C: Category")]
pub struct IndicatorRow<C> {
    /// Entity identifier, e.g. the ward number. Must be positive.
    pub entity_id: u32,
    /// Domain category of the observation.
    pub category: C,
    /// Observed count.
    pub count: u64,
}

impl<C: Category> IndicatorRow<C> {
    /// Creates a new row.
    #[must_use]
    pub const fn new(entity_id: u32, category: C, count: u64) -> Self {
        Self {
            entity_id,
            category,
            count,
        }
    }
}

/// An indicator row as delivered by the persistence layer, with the
/// category still an untyped key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIndicatorRow {
    /// Entity identifier (ward number).
    #[serde(alias = "entity_id", alias = "ward")]
    pub entity_id: u32,
    /// Category key (`SCREAMING_SNAKE_CASE` for the built-in domains).
    pub category: String,
    /// Observed count.
    pub count: u64,
}

impl RawIndicatorRow {
    /// Converts into a typed row. Unknown category keys are routed to
    /// [`Category::OTHER`].
    #[must_use]
    pub fn to_typed<C: Category>(&self) -> IndicatorRow<C> {
        IndicatorRow::new(
            self.entity_id,
            C::parse_or_other(&self.category),
            self.count,
        )
    }
}

/// Aggregated statistics for a single category across all entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound = "C: Category")]
pub struct CategoryStat<C> {
    /// The category.
    pub category: C,
    /// Display label, falling back to the category key.
    pub label: String,
    /// Summed count across all entities.
    pub count: u64,
    /// Share of the grand total, 0-100.
    pub percentage: f64,
    /// Dense rank by descending count, starting at 1.
    pub rank: u32,
}

/// Summed count and share for a configured category group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupStat {
    /// Summed count of the group's member categories.
    pub count: u64,
    /// Share of the scope total, 0-100.
    pub percentage: f64,
}

/// Rollup for a single entity (ward).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound = "C: Category")]
pub struct EntityStat<C> {
    /// Entity identifier.
    pub entity_id: u32,
    /// Sum of all counts for this entity, pinned at `u64::MAX` if the sum
    /// overflows.
    pub total: u64,
    /// Per-category counts. Sums to [`total`](Self::total) unless the total
    /// is pinned at `u64::MAX`.
    pub breakdown: BTreeMap<C, u64>,
    /// Category with the highest count, `None` when the total is zero.
    pub dominant_category: Option<C>,
    /// Share of the dominant category within this entity, 0-100.
    pub dominant_percentage: f64,
    /// Number of categories with a non-zero count.
    pub distinct_category_count: usize,
    /// Per-group counts for every configured group.
    pub groups: BTreeMap<String, u64>,
    /// Entity-scoped composite scores.
    pub scores: BTreeMap<String, f64>,
    /// Position of this entity's first row in the canonical input.
    pub input_order: usize,
}

impl<C: Category> EntityStat<C> {
    /// Share of `category` within this entity, 0-100.
    #[must_use]
    pub fn category_share(&self, category: C) -> f64 {
        percentage(
            self.breakdown.get(&category).copied().unwrap_or(0),
            self.total,
        )
    }

    /// Share of `group` within this entity, or `None` when the group is
    /// not configured.
    #[must_use]
    pub fn group_share(&self, group: &str) -> Option<f64> {
        self.groups
            .get(group)
            .map(|count| percentage(*count, self.total))
    }
}

/// The full output of one pipeline invocation.
///
/// Built fresh from a row snapshot and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound = "C: Category")]
pub struct ProcessedResult<C> {
    /// Sum of all counts, pinned at `u64::MAX` if the sum overflows.
    pub grand_total: u64,
    /// Category statistics in rank order.
    pub category_stats: Vec<CategoryStat<C>>,
    /// The first N entries of [`category_stats`](Self::category_stats).
    pub top_n: Vec<CategoryStat<C>>,
    /// Per-entity rollups keyed by entity identifier.
    pub entity_stats: BTreeMap<u32, EntityStat<C>>,
    /// Per-group totals against the grand total.
    pub category_groups: BTreeMap<String, GroupStat>,
    /// Globally scoped composite scores.
    pub composite_scores: BTreeMap<String, f64>,
}

impl<C: Category> ProcessedResult<C> {
    /// The zeroed sentinel produced for empty input.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            grand_total: 0,
            category_stats: Vec::new(),
            top_n: Vec::new(),
            entity_stats: BTreeMap::new(),
            category_groups: BTreeMap::new(),
            composite_scores: BTreeMap::new(),
        }
    }

    /// Returns `true` when there is nothing to report.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.grand_total == 0
    }

    /// Looks up the statistics for `category`, if it was present in the input.
    #[must_use]
    pub fn category(&self, category: C) -> Option<&CategoryStat<C>> {
        self.category_stats.iter().find(|s| s.category == category)
    }

    /// Looks up the rollup for an entity.
    #[must_use]
    pub fn entity(&self, entity_id: u32) -> Option<&EntityStat<C>> {
        self.entity_stats.get(&entity_id)
    }
}

impl<C: Category> Default for ProcessedResult<C> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Computes `part / whole * 100`, returning 0 for a zero denominator.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum_macros::{AsRefStr, Display, EnumString};

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
    #[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
    enum Fuel {
        Wood,
        Lpg,
        Other,
    }

    impl Category for Fuel {
        const OTHER: Self = Self::Other;

        fn all() -> &'static [Self] {
            &[Self::Wood, Self::Lpg, Self::Other]
        }
    }

    #[test]
    fn unknown_keys_route_to_other() {
        assert_eq!(Fuel::parse_or_other("WOOD"), Fuel::Wood);
        assert_eq!(Fuel::parse_or_other("  LPG "), Fuel::Lpg);
        assert_eq!(Fuel::parse_or_other("BIOGAS"), Fuel::Other);
        assert_eq!(Fuel::parse_or_other(""), Fuel::Other);
        assert_eq!(Fuel::parse_key(" LPG"), Some(Fuel::Lpg));
        assert_eq!(Fuel::parse_key("BIOGAS"), None);
    }

    #[test]
    fn raw_row_converts_to_typed() {
        let raw = RawIndicatorRow {
            entity_id: 4,
            category: "KEROSENE".to_string(),
            count: 12,
        };
        let row: IndicatorRow<Fuel> = raw.to_typed();
        assert_eq!(row, IndicatorRow::new(4, Fuel::Other, 12));
    }

    #[test]
    fn raw_row_accepts_snake_case_headers() {
        let row: RawIndicatorRow =
            serde_json::from_str(r#"{"entity_id": 2, "category": "WOOD", "count": 9}"#).unwrap();
        assert_eq!(row.entity_id, 2);

        let row: RawIndicatorRow =
            serde_json::from_str(r#"{"ward": 3, "category": "LPG", "count": 1}"#).unwrap();
        assert_eq!(row.entity_id, 3);
    }

    #[test]
    fn percentage_of_zero_total_is_zero() {
        assert!(percentage(5, 0).abs() < f64::EPSILON);
        assert!((percentage(1, 4) - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn entity_shares_are_local() {
        let entity = EntityStat {
            entity_id: 1,
            total: 50,
            breakdown: BTreeMap::from([(Fuel::Wood, 40), (Fuel::Lpg, 10)]),
            dominant_category: Some(Fuel::Wood),
            dominant_percentage: 80.0,
            distinct_category_count: 2,
            groups: BTreeMap::from([("solid".to_string(), 40)]),
            scores: BTreeMap::new(),
            input_order: 0,
        };
        assert!((entity.category_share(Fuel::Lpg) - 20.0).abs() < f64::EPSILON);
        assert!(entity.category_share(Fuel::Other).abs() < f64::EPSILON);
        assert_eq!(entity.group_share("solid"), Some(80.0));
        assert_eq!(entity.group_share("gas"), None);
    }

    #[test]
    fn empty_result_serializes_with_camel_case_keys() {
        let value = serde_json::to_value(ProcessedResult::<Fuel>::empty()).unwrap();
        assert_eq!(value["grandTotal"], 0);
        assert!(value["topN"].as_array().unwrap().is_empty());
        assert!(value["entityStats"].as_object().unwrap().is_empty());
    }
}
