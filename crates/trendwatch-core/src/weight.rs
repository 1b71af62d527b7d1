//! Trending score for a title from its observed ranks and occurrence count.

use serde::{Deserialize, Serialize};

/// Relative weights of the three score terms. Applied as given; they need
/// not sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightConfig {
    #[serde(rename = "rank")]
    pub rank_weight: f64,
    #[serde(rename = "frequency")]
    pub frequency_weight: f64,
    #[serde(rename = "hotness")]
    pub hotness_weight: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            rank_weight: 0.6,
            frequency_weight: 0.3,
            hotness_weight: 0.1,
        }
    }
}

/// Ranks worse than this contribute the same minimal rank term.
const RANK_CLAMP: u32 = 10;
/// Occurrence counts above this stop raising the frequency term.
const FREQUENCY_CAP: u32 = 10;

/// Compute the trending score for one title.
///
/// - rank term: mean of `11 - min(rank, 10)` over all ranks
/// - frequency term: `min(count, 10) * 10`, where `count` defaults to `ranks.len()`
/// - hotness term: percentage of ranks no worse than `rank_threshold`
///
/// Returns `0.0` when `ranks` is empty.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn calculate_weight(
    ranks: &[u32],
    occurrence_count: Option<u32>,
    rank_threshold: u32,
    config: &WeightConfig,
) -> f64 {
    if ranks.is_empty() {
        return 0.0;
    }

    let observed = ranks.len() as f64;
    let count = occurrence_count
        .unwrap_or_else(|| u32::try_from(ranks.len()).unwrap_or(u32::MAX));

    let rank_sum: u64 = ranks
        .iter()
        .map(|&rank| u64::from(RANK_CLAMP + 1 - rank.min(RANK_CLAMP)))
        .sum();
    let rank_term = rank_sum as f64 / observed;

    let frequency_term = f64::from(count.min(FREQUENCY_CAP) * 10);

    let hot = ranks.iter().filter(|&&rank| rank <= rank_threshold).count();
    let hotness_term = hot as f64 / observed * 100.0;

    rank_term * config.rank_weight
        + frequency_term * config.frequency_weight
        + hotness_term * config.hotness_weight
}
