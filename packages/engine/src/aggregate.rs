//! Grand totals, per-category shares, per-ward rollups and group totals.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use ward_stats_indicator_models::{
    Category, CategoryStat, EntityStat, GroupStat, IndicatorRow, percentage,
};

use crate::EngineConfig;

/// Unranked aggregates over a canonical row set.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregates<C> {
    /// Sum of all counts.
    pub grand_total: u64,
    /// Per-category stats in first-seen order, with `rank` still 0.
    pub categories: Vec<CategoryStat<C>>,
    /// Per-ward rollups with `scores` still empty.
    pub entities: BTreeMap<u32, EntityStat<C>>,
    /// Totals for every configured group.
    pub groups: BTreeMap<String, GroupStat>,
}

/// Aggregates canonical rows (see [`crate::normalize::normalize`]).
#[must_use]
pub fn aggregate<C: Category>(
    rows: &[IndicatorRow<C>],
    config: &EngineConfig<C>,
) -> Aggregates<C> {
    let mut grand_total = 0u64;
    let mut saturated = false;
    for row in rows {
        saturated |= !add_count(&mut grand_total, row.count);
    }
    if saturated {
        log::warn!("Grand total overflowed and is pinned at {}", u64::MAX);
    }

    let categories = category_totals(rows, grand_total, config);
    let groups = group_totals(&categories, grand_total, config);
    let entities = entity_rollups(rows, config);

    Aggregates {
        grand_total,
        categories,
        entities,
        groups,
    }
}

/// Adds `count` to `total`, pinning the sum at `u64::MAX`. Returns `false`
/// when the sum overflowed.
fn add_count(total: &mut u64, count: u64) -> bool {
    if let Some(sum) = total.checked_add(count) {
        *total = sum;
        true
    } else {
        *total = u64::MAX;
        false
    }
}

fn category_totals<C: Category>(
    rows: &[IndicatorRow<C>],
    grand_total: u64,
    config: &EngineConfig<C>,
) -> Vec<CategoryStat<C>> {
    let mut index: HashMap<C, usize> = HashMap::new();
    let mut totals: Vec<(C, u64)> = Vec::new();

    for row in rows {
        let slot = *index.entry(row.category).or_insert_with(|| {
            totals.push((row.category, 0));
            totals.len() - 1
        });
        totals[slot].1 = totals[slot].1.saturating_add(row.count);
    }

    totals
        .into_iter()
        .map(|(category, count)| CategoryStat {
            category,
            label: config.label(category),
            count,
            percentage: percentage(count, grand_total),
            rank: 0,
        })
        .collect()
}

fn group_totals<C: Category>(
    categories: &[CategoryStat<C>],
    grand_total: u64,
    config: &EngineConfig<C>,
) -> BTreeMap<String, GroupStat> {
    let mut counts: BTreeMap<String, u64> = config
        .group_names()
        .into_iter()
        .map(|name| (name.to_string(), 0))
        .collect();

    for stat in categories {
        if let Some(group) = config.group_of(stat.category)
            && let Some(count) = counts.get_mut(group)
        {
            *count = count.saturating_add(stat.count);
        }
    }

    counts
        .into_iter()
        .map(|(name, count)| {
            let stat = GroupStat {
                count,
                percentage: percentage(count, grand_total),
            };
            (name, stat)
        })
        .collect()
}

fn entity_rollups<C: Category>(
    rows: &[IndicatorRow<C>],
    config: &EngineConfig<C>,
) -> BTreeMap<u32, EntityStat<C>> {
    let empty_groups: BTreeMap<String, u64> = config
        .group_names()
        .into_iter()
        .map(|name| (name.to_string(), 0))
        .collect();

    let mut entities: BTreeMap<u32, EntityStat<C>> = BTreeMap::new();
    // Largest (category, count) per ward; strict comparison keeps the first
    // seen category on ties.
    let mut dominant: HashMap<u32, (C, u64)> = HashMap::new();
    let mut saturated: BTreeSet<u32> = BTreeSet::new();

    for row in rows {
        let next_order = entities.len();
        let entity = entities.entry(row.entity_id).or_insert_with(|| EntityStat {
            entity_id: row.entity_id,
            total: 0,
            breakdown: BTreeMap::new(),
            dominant_category: None,
            dominant_percentage: 0.0,
            distinct_category_count: 0,
            groups: empty_groups.clone(),
            scores: BTreeMap::new(),
            input_order: next_order,
        });

        if !add_count(&mut entity.total, row.count) {
            saturated.insert(row.entity_id);
        }
        let slot = entity.breakdown.entry(row.category).or_insert(0);
        *slot = slot.saturating_add(row.count);

        if let Some(group) = config.group_of(row.category)
            && let Some(count) = entity.groups.get_mut(group)
        {
            *count = count.saturating_add(row.count);
        }

        dominant
            .entry(row.entity_id)
            .and_modify(|best| {
                if row.count > best.1 {
                    *best = (row.category, row.count);
                }
            })
            .or_insert((row.category, row.count));
    }

    for entity_id in &saturated {
        log::warn!(
            "Total for ward {entity_id} overflowed and is pinned at {}; its breakdown no longer sums to it",
            u64::MAX
        );
    }

    for entity in entities.values_mut() {
        entity.distinct_category_count = entity.breakdown.values().filter(|c| **c > 0).count();
        if entity.total > 0
            && let Some((category, count)) = dominant.get(&entity.entity_id)
        {
            entity.dominant_category = Some(*category);
            entity.dominant_percentage = percentage(*count, entity.total);
        }
    }

    entities
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Letter, approx, row, scenario_a_rows};

    fn grouped_config() -> EngineConfig<Letter> {
        EngineConfig::builder()
            .label(Letter::Y, "Why")
            .group(Letter::X, "xy")
            .group(Letter::Y, "xy")
            .group(Letter::Z, "z")
            .build()
            .unwrap()
    }

    #[test]
    fn categories_keep_first_seen_order() {
        let rows = vec![row(1, Letter::Z, 1), row(2, Letter::X, 9), row(3, Letter::Z, 2)];
        let agg = aggregate(&rows, &grouped_config());
        let order: Vec<Letter> = agg.categories.iter().map(|s| s.category).collect();
        assert_eq!(order, vec![Letter::Z, Letter::X]);
        assert_eq!(agg.categories[0].count, 3);
        assert!(agg.categories.iter().all(|s| s.rank == 0));
    }

    #[test]
    fn labels_are_attached() {
        let agg = aggregate(&scenario_a_rows(), &grouped_config());
        let labels: Vec<&str> = agg.categories.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["X", "Why"]);
    }

    #[test]
    fn group_totals_cover_every_configured_group() {
        let agg = aggregate(&scenario_a_rows(), &grouped_config());
        assert_eq!(agg.groups.len(), 2);
        assert_eq!(agg.groups["xy"].count, 200);
        assert!(approx(agg.groups["xy"].percentage, 100.0));
        assert_eq!(agg.groups["z"].count, 0);
        assert!(approx(agg.groups["z"].percentage, 0.0));
    }

    #[test]
    fn ungrouped_categories_do_not_count_towards_groups() {
        let rows = vec![row(1, Letter::Other, 5), row(1, Letter::Z, 5)];
        let agg = aggregate(&rows, &grouped_config());
        assert_eq!(agg.groups["z"].count, 5);
        assert!(approx(agg.groups["z"].percentage, 50.0));
        assert_eq!(agg.entities[&1].groups["z"], 5);
        assert_eq!(agg.entities[&1].groups["xy"], 0);
    }

    #[test]
    fn dominant_share_is_relative_to_ward_total() {
        let rows = vec![
            row(7, Letter::X, 1),
            row(7, Letter::Y, 3),
            row(8, Letter::X, 100),
        ];
        let agg = aggregate(&rows, &grouped_config());
        let ward = &agg.entities[&7];
        assert_eq!(ward.dominant_category, Some(Letter::Y));
        assert!(approx(ward.dominant_percentage, 75.0));
    }

    #[test]
    fn dominant_ties_go_to_first_seen() {
        let rows = vec![row(1, Letter::Z, 5), row(1, Letter::X, 5)];
        let agg = aggregate(&rows, &grouped_config());
        assert_eq!(agg.entities[&1].dominant_category, Some(Letter::Z));
        assert!(approx(agg.entities[&1].dominant_percentage, 50.0));
    }

    #[test]
    fn distinct_count_ignores_zero_rows() {
        let rows = vec![row(1, Letter::X, 5), row(1, Letter::Y, 0), row(1, Letter::Z, 2)];
        let agg = aggregate(&rows, &grouped_config());
        let ward = &agg.entities[&1];
        assert_eq!(ward.breakdown.len(), 3);
        assert_eq!(ward.distinct_category_count, 2);
    }

    #[test]
    fn all_zero_ward_has_no_dominant_category() {
        let rows = vec![row(1, Letter::X, 0), row(2, Letter::Y, 4)];
        let agg = aggregate(&rows, &grouped_config());
        assert_eq!(agg.entities[&1].dominant_category, None);
        assert!(approx(agg.entities[&1].dominant_percentage, 0.0));
        assert_eq!(agg.entities[&1].distinct_category_count, 0);
    }

    #[test]
    fn input_order_follows_first_row_per_ward() {
        let rows = vec![row(9, Letter::X, 1), row(2, Letter::X, 1), row(9, Letter::Y, 1)];
        let agg = aggregate(&rows, &grouped_config());
        assert_eq!(agg.entities[&9].input_order, 0);
        assert_eq!(agg.entities[&2].input_order, 1);
    }

    #[test]
    fn overflowing_totals_pin_at_max() {
        let rows = vec![row(1, Letter::X, u64::MAX), row(1, Letter::Y, 1), row(2, Letter::Z, 3)];
        let agg = aggregate(&rows, &grouped_config());

        assert_eq!(agg.grand_total, u64::MAX);
        let ward = &agg.entities[&1];
        assert_eq!(ward.total, u64::MAX);
        assert_eq!(ward.breakdown[&Letter::X], u64::MAX);
        assert_eq!(ward.breakdown[&Letter::Y], 1);
        assert_eq!(ward.dominant_category, Some(Letter::X));
        assert!(approx(ward.dominant_percentage, 100.0));
        assert_eq!(agg.entities[&2].total, 3);
        assert!(agg.categories.iter().all(|s| s.count <= agg.grand_total));
    }

    #[test]
    fn add_count_reports_overflow() {
        let mut total = u64::MAX - 1;
        assert!(add_count(&mut total, 1));
        assert_eq!(total, u64::MAX);
        assert!(!add_count(&mut total, 1));
        assert_eq!(total, u64::MAX);
    }
}
