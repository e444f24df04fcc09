//! Merges raw rows into one canonical row per `(ward, category)` pair.
//!
//! Duplicates show up when the same indicator is read from more than one
//! upstream source during a fallback read. They are summed, never
//! overwritten. Canonical rows keep the order in which each pair was first
//! seen; that order is the tiebreak key for every ranking downstream.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use ward_stats_indicator_models::{Category, IndicatorRow, RawIndicatorRow};

/// Returns one row per distinct `(entity_id, category)` with counts summed,
/// in first-seen order.
///
/// Rows with an `entity_id` of 0 violate the input contract and are skipped.
#[must_use]
pub fn normalize<C: Category>(rows: &[IndicatorRow<C>]) -> Vec<IndicatorRow<C>> {
    let mut index: HashMap<(u32, C), usize> = HashMap::with_capacity(rows.len());
    let mut canonical: Vec<IndicatorRow<C>> = Vec::with_capacity(rows.len());
    let mut skipped = 0usize;

    for row in rows {
        if row.entity_id == 0 {
            skipped += 1;
            continue;
        }

        match index.entry((row.entity_id, row.category)) {
            Entry::Occupied(slot) => {
                let merged = &mut canonical[*slot.get()];
                merged.count = merged.count.saturating_add(row.count);
            }
            Entry::Vacant(slot) => {
                slot.insert(canonical.len());
                canonical.push(*row);
            }
        }
    }

    if skipped > 0 {
        log::warn!("Skipped {skipped} indicator rows with entity id 0");
    }
    log::trace!(
        "Normalized {} rows into {} canonical rows",
        rows.len(),
        canonical.len()
    );

    canonical
}

/// Converts upstream rows into typed rows, routing unknown category keys to
/// [`Category::OTHER`].
#[must_use]
pub fn route_raw<C: Category>(rows: &[RawIndicatorRow]) -> Vec<IndicatorRow<C>> {
    let mut routed = 0usize;
    let typed = rows
        .iter()
        .map(|raw| {
            let category = C::parse_key(&raw.category).unwrap_or_else(|| {
                routed += 1;
                C::OTHER
            });
            IndicatorRow::new(raw.entity_id, category, raw.count)
        })
        .collect();

    if routed > 0 {
        log::debug!("Routed {routed} rows with unknown category keys to {}", C::OTHER);
    }

    typed
}
