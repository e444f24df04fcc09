//! Category and ward rankings.
//!
//! Ties are always broken by first-seen order in the canonical input. The
//! original position is carried through the sort as an explicit secondary
//! key instead of relying on sort stability.

use serde::{Deserialize, Serialize};
use ward_stats_indicator_models::{Category, CategoryStat, EntityStat, ProcessedResult};

/// Sorts first-seen-ordered category stats by descending count and assigns
/// ranks `1..=K`.
#[must_use]
pub fn rank_categories<C: Category>(stats: Vec<CategoryStat<C>>) -> Vec<CategoryStat<C>> {
    let mut indexed: Vec<(usize, CategoryStat<C>)> = stats.into_iter().enumerate().collect();
    indexed.sort_unstable_by(|(ia, a), (ib, b)| b.count.cmp(&a.count).then_with(|| ia.cmp(ib)));

    indexed
        .into_iter()
        .zip(1u32..)
        .map(|((_, mut stat), rank)| {
            stat.rank = rank;
            stat
        })
        .collect()
}

/// Returns the first `n` entries of a ranked category list.
#[must_use]
pub fn top_n<C: Category>(ranked: &[CategoryStat<C>], n: usize) -> Vec<CategoryStat<C>> {
    ranked.iter().take(n).cloned().collect()
}

/// What to rank wards by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityMetric<C> {
    /// Total count.
    Total,
    /// Number of categories with a non-zero count.
    DistinctCategories,
    /// Ward-local share of one category.
    CategoryShare {
        /// The category.
        category: C,
    },
    /// Ward-local share of one group.
    GroupShare {
        /// Group name.
        group: String,
    },
    /// A ward-scoped composite score.
    Score {
        /// Score name.
        name: String,
    },
}

impl<C> EntityMetric<C> {
    /// Converts the category this metric refers to, if any.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` fails with.
    pub fn try_map_category<D, E>(
        self,
        f: impl FnOnce(C) -> Result<D, E>,
    ) -> Result<EntityMetric<D>, E> {
        Ok(match self {
            Self::Total => EntityMetric::Total,
            Self::DistinctCategories => EntityMetric::DistinctCategories,
            Self::CategoryShare { category } => EntityMetric::CategoryShare {
                category: f(category)?,
            },
            Self::GroupShare { group } => EntityMetric::GroupShare { group },
            Self::Score { name } => EntityMetric::Score { name },
        })
    }
}

impl<C: Category> EntityMetric<C> {
    /// Value of this metric for `entity`, or `None` when the entity does not
    /// carry it (an unconfigured group or score).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn value(&self, entity: &EntityStat<C>) -> Option<f64> {
        match self {
            Self::Total => Some(entity.total as f64),
            Self::DistinctCategories => Some(entity.distinct_category_count as f64),
            Self::CategoryShare { category } => Some(entity.category_share(*category)),
            Self::GroupShare { group } => entity.group_share(group),
            Self::Score { name } => entity.scores.get(name).copied(),
        }
    }

    /// Returns `true` when values of this metric are plain counts rather
    /// than percentages or scores.
    #[must_use]
    pub const fn is_count(&self) -> bool {
        matches!(self, Self::Total | Self::DistinctCategories)
    }
}

/// Direction of a ward ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankOrder {
    /// Highest value first.
    #[default]
    Descending,
    /// Lowest value first.
    Ascending,
}

/// One ward in a ranking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntity {
    /// Ward identifier.
    pub entity_id: u32,
    /// Position in the ranking, starting at 1.
    pub rank: u32,
    /// Metric value.
    pub value: f64,
}

/// Ranks every ward that carries `metric`.
#[must_use]
pub fn rank_entities<C: Category>(
    result: &ProcessedResult<C>,
    metric: &EntityMetric<C>,
    order: RankOrder,
) -> Vec<RankedEntity> {
    let mut values: Vec<(usize, u32, f64)> = result
        .entity_stats
        .values()
        .filter_map(|e| metric.value(e).map(|v| (e.input_order, e.entity_id, v)))
        .collect();

    values.sort_unstable_by(|(oa, _, a), (ob, _, b)| {
        let by_value = match order {
            RankOrder::Descending => b.total_cmp(a),
            RankOrder::Ascending => a.total_cmp(b),
        };
        by_value.then_with(|| oa.cmp(ob))
    });

    values
        .into_iter()
        .zip(1u32..)
        .map(|((_, entity_id, value), rank)| RankedEntity {
            entity_id,
            rank,
            value,
        })
        .collect()
}

/// The ward with the highest value of `metric`.
#[must_use]
pub fn best_entity<C: Category>(
    result: &ProcessedResult<C>,
    metric: &EntityMetric<C>,
) -> Option<RankedEntity> {
    rank_entities(result, metric, RankOrder::Descending)
        .into_iter()
        .next()
}

/// The ward with the lowest value of `metric`: the last entry of the
/// descending ranking, so tied wards never come out as both best and worst.
#[must_use]
pub fn worst_entity<C: Category>(
    result: &ProcessedResult<C>,
    metric: &EntityMetric<C>,
) -> Option<RankedEntity> {
    rank_entities(result, metric, RankOrder::Descending).pop()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Letter, approx, row, scenario_a_rows};
    use crate::{EngineConfig, process};

    fn stat(category: Letter, count: u64) -> CategoryStat<Letter> {
        CategoryStat {
            category,
            label: category.to_string(),
            count,
            percentage: 0.0,
            rank: 0,
        }
    }

    #[test]
    fn ranks_by_count_descending() {
        let ranked = rank_categories(vec![
            stat(Letter::X, 1),
            stat(Letter::Y, 10),
            stat(Letter::Z, 5),
        ]);
        let order: Vec<(Letter, u32)> = ranked.iter().map(|s| (s.category, s.rank)).collect();
        assert_eq!(order, vec![(Letter::Y, 1), (Letter::Z, 2), (Letter::X, 3)]);
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let ranked = rank_categories(vec![
            stat(Letter::Z, 4),
            stat(Letter::X, 4),
            stat(Letter::Other, 9),
            stat(Letter::Y, 4),
        ]);
        let order: Vec<Letter> = ranked.iter().map(|s| s.category).collect();
        assert_eq!(order, vec![Letter::Other, Letter::Z, Letter::X, Letter::Y]);
    }

    #[test]
    fn top_n_is_bounded_by_category_count() {
        let ranked = rank_categories(vec![stat(Letter::X, 2), stat(Letter::Y, 1)]);
        assert_eq!(top_n(&ranked, 5).len(), 2);
        assert_eq!(top_n(&ranked, 1).len(), 1);
        assert!(top_n(&ranked, 0).is_empty());

        let top = top_n(&ranked, 1);
        assert!(top.iter().all(|s| s.rank as usize <= top.len()));
    }

    #[test]
    fn entities_rank_by_total_with_first_seen_ties() {
        let rows = vec![
            row(5, Letter::X, 10),
            row(3, Letter::X, 30),
            row(4, Letter::X, 10),
        ];
        let result = process(&rows, &EngineConfig::builder().build().unwrap());

        let ranking = rank_entities(&result, &EntityMetric::Total, RankOrder::Descending);
        let ids: Vec<u32> = ranking.iter().map(|r| r.entity_id).collect();
        assert_eq!(ids, vec![3, 5, 4]);
        assert_eq!(ranking[2].rank, 3);

        let worst = worst_entity(&result, &EntityMetric::Total).unwrap();
        assert_eq!(worst.entity_id, 4);
        assert_eq!(worst.rank, 3);
    }

    #[test]
    fn tied_wards_are_not_both_best_and_worst() {
        let rows = vec![row(1, Letter::X, 50), row(2, Letter::X, 50)];
        let result = process(&rows, &EngineConfig::builder().build().unwrap());

        let best = best_entity(&result, &EntityMetric::Total).unwrap();
        let worst = worst_entity(&result, &EntityMetric::Total).unwrap();
        assert_eq!(best.entity_id, 1);
        assert_eq!(worst.entity_id, 2);
    }

    #[test]
    fn entities_rank_by_category_share() {
        let result = process(&scenario_a_rows(), &EngineConfig::builder().build().unwrap());
        let metric = EntityMetric::CategoryShare {
            category: Letter::Y,
        };

        let best = best_entity(&result, &metric).unwrap();
        assert_eq!(best.entity_id, 2);
        assert!(approx(best.value, 90.0));

        let worst = worst_entity(&result, &metric).unwrap();
        assert_eq!(worst.entity_id, 1);
        assert!(approx(worst.value, 40.0));
    }

    #[test]
    fn missing_metric_excludes_wards() {
        let result = process(&scenario_a_rows(), &EngineConfig::builder().build().unwrap());
        let metric = EntityMetric::Score {
            name: "undefined".to_string(),
        };
        assert!(rank_entities(&result, &metric, RankOrder::Descending).is_empty());
        assert!(best_entity(&result, &metric).is_none());
    }

    #[test]
    fn empty_result_has_no_best_ward() {
        let result = ProcessedResult::<Letter>::empty();
        assert!(best_entity(&result, &EntityMetric::Total).is_none());
    }
}
