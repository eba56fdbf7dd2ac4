//! # Weighted Median Aggregation
//!
//! For each feed of a voting round, valid reveals are sorted by price and the
//! weighted median and quartiles are read off the cumulative weight:
//!
//! - quartile 1: first price where cumulative weight reaches 1/4 of total
//! - median: first price where cumulative weight reaches 1/2 of total
//! - quartile 3: first price where cumulative weight reaches 3/4 of total
//!
//! Comparisons are done on scaled integers (`4 * cumulative >= k * total`),
//! so landing exactly on a boundary selects that price; there is no
//! interpolation between neighbours.

use crate::domain::reward_epoch::RewardEpoch;
use crate::domain::submissions::DataForCalculations;
use crate::error::RewardResult;
use rayon::prelude::*;
use shared_types::{Address, Feed, FeedId, VotingRoundId, U256};
use std::collections::BTreeMap;
use tracing::debug;

/// One voter's priced reveal for a feed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeightedReveal {
    /// Submission address
    pub voter: Address,
    pub price: u32,
    pub weight: U256,
}

/// Median and quartiles of a feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MedianSummary {
    pub final_median_price: u32,
    pub quartile1_price: u32,
    pub quartile3_price: u32,
}

/// Per-feed median result of a voting round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MedianCalculationResult {
    pub voting_round_id: VotingRoundId,
    pub feed: Feed,
    /// Reveals that entered the calculation, sorted by (price, voter)
    pub reveals: Vec<WeightedReveal>,
    /// `None` when no voter priced the feed
    pub summary: Option<MedianSummary>,
}

impl MedianCalculationResult {
    pub fn total_weight(&self) -> U256 {
        self.reveals
            .iter()
            .fold(U256::zero(), |acc, reveal| acc.saturating_add(reveal.weight))
    }
}

/// Weighted median and quartiles of `(price, weight)` pairs.
///
/// Returns `None` for an empty input or zero total weight. The result does
/// not depend on input order.
pub fn weighted_median(reveals: &[WeightedReveal]) -> Option<MedianSummary> {
    let mut sorted: Vec<&WeightedReveal> = reveals.iter().collect();
    sorted.sort_by(|a, b| a.price.cmp(&b.price).then(a.voter.cmp(&b.voter)));

    let total = sorted
        .iter()
        .fold(U256::zero(), |acc, reveal| acc.saturating_add(reveal.weight));
    if total.is_zero() {
        return None;
    }

    Some(MedianSummary {
        final_median_price: price_at_fraction(&sorted, total, 2)?,
        quartile1_price: price_at_fraction(&sorted, total, 1)?,
        quartile3_price: price_at_fraction(&sorted, total, 3)?,
    })
}

/// First price whose cumulative weight reaches `quarters / 4` of `total`.
fn price_at_fraction(sorted: &[&WeightedReveal], total: U256, quarters: u64) -> Option<u32> {
    let target = total.saturating_mul(U256::from(quarters));
    let mut cumulative = U256::zero();
    for reveal in sorted {
        cumulative = cumulative.saturating_add(reveal.weight);
        if cumulative.saturating_mul(U256::from(4u64)) >= target {
            return Some(reveal.price);
        }
    }
    sorted.last().map(|reveal| reveal.price)
}

/// Compute median results for every canonical feed of the epoch.
///
/// Feeds are processed in parallel; the result is keyed by feed id so the
/// output is independent of scheduling.
pub fn calculate_median_results(
    voting_round_id: VotingRoundId,
    reward_epoch: &RewardEpoch,
    data: &DataForCalculations,
) -> RewardResult<BTreeMap<FeedId, MedianCalculationResult>> {
    // Weights are resolved up front so a missing registration surfaces as an error.
    let weighted: Vec<(&Address, &Vec<Option<u32>>, U256)> = data
        .valid_reveals
        .iter()
        .map(|(voter, reveal)| {
            reward_epoch
                .capped_weight_for_submission(voter)
                .map(|weight| (voter, &reveal.values, weight))
        })
        .collect::<RewardResult<_>>()?;

    let results: Vec<MedianCalculationResult> = reward_epoch
        .canonical_feed_order()
        .par_iter()
        .enumerate()
        .map(|(index, feed)| {
            let mut reveals: Vec<WeightedReveal> = weighted
                .iter()
                .filter_map(|(voter, values, weight)| {
                    values.get(index).copied().flatten().map(|price| WeightedReveal {
                        voter: **voter,
                        price,
                        weight: *weight,
                    })
                })
                .collect();
            reveals.sort_by(|a, b| a.price.cmp(&b.price).then(a.voter.cmp(&b.voter)));
            let summary = weighted_median(&reveals);

            MedianCalculationResult {
                voting_round_id,
                feed: *feed,
                reveals,
                summary,
            }
        })
        .collect();

    for result in &results {
        debug!(
            voting_round_id,
            feed = %result.feed.id,
            reveals = result.reveals.len(),
            median = ?result.summary.map(|s| s.final_median_price),
            "[ftso-rewards] Median calculated"
        );
    }

    Ok(results
        .into_iter()
        .map(|result| (result.feed.id, result))
        .collect())
}
