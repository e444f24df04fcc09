//! Shared fixtures for the engine's unit tests.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use ward_stats_indicator_models::{Category, IndicatorRow};

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
pub enum Letter {
    X,
    Y,
    Z,
    Other,
}

impl Category for Letter {
    const OTHER: Self = Self::Other;

    fn all() -> &'static [Self] {
        &[Self::X, Self::Y, Self::Z, Self::Other]
    }
}

pub const fn row(entity_id: u32, category: Letter, count: u64) -> IndicatorRow<Letter> {
    IndicatorRow::new(entity_id, category, count)
}

pub fn scenario_a_rows() -> Vec<IndicatorRow<Letter>> {
    vec![
        row(1, Letter::X, 60),
        row(1, Letter::Y, 40),
        row(2, Letter::X, 10),
        row(2, Letter::Y, 90),
    ]
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
