//! # Median Rewards
//!
//! The median part of a partial offer is split into an IQR pool and a PCT
//! pool. Each pool is shared among eligible voters whose price lies in the
//! pool's band, in proportion to their capped weight:
//!
//! - IQR band: `quartile1 <= price <= quartile3`
//! - PCT band: `|price - median| <= median * elastic_band_width_ppm / 1e6`
//!
//! When the offer names lead providers that priced the feed, eligibility is
//! further restricted to voters within `reward_belt_ppm` of the lead
//! providers' own weighted median.
//!
//! Shares are floored per voter. Rounding dust, pools with an empty band and
//! offers for feeds nobody priced go to the offer's remainder claimer.

use crate::config::TOTAL_PPM;
use crate::domain::arith::{checked_sum, mul_div};
use crate::domain::claims::{ClaimType, PartialRewardClaim};
use crate::domain::median::{weighted_median, MedianCalculationResult, WeightedReveal};
use crate::domain::offers::{iqr_pct_pools, PartialRewardOffer};
use crate::domain::reward_epoch::RewardEpoch;
use crate::error::{RewardError, RewardResult};
use shared_types::{address_hex, Address, U256};
use std::collections::HashSet;
use tracing::trace;

/// Whether `price` lies within `width_ppm` of `center`.
fn within_ppm(price: u32, center: u32, width_ppm: u32) -> bool {
    let distance = u64::from(price.abs_diff(center));
    distance * u64::from(TOTAL_PPM) <= u64::from(center) * u64::from(width_ppm)
}

/// Submission addresses inside the reward belt, or `None` when every
/// revealer is eligible.
fn belt_eligible(
    offer: &PartialRewardOffer,
    result: &MedianCalculationResult,
    reward_epoch: &RewardEpoch,
) -> Option<HashSet<Address>> {
    let lead_submitters: HashSet<Address> = offer
        .lead_providers
        .iter()
        .filter_map(|identity| reward_epoch.registration(identity))
        .map(|registration| registration.voter_registered.submit_address)
        .collect();
    if lead_submitters.is_empty() {
        return None;
    }

    let lead_reveals: Vec<WeightedReveal> = result
        .reveals
        .iter()
        .filter(|reveal| lead_submitters.contains(&reveal.voter))
        .cloned()
        .collect();
    let belt_center = weighted_median(&lead_reveals)?.final_median_price;

    Some(
        result
            .reveals
            .iter()
            .filter(|reveal| within_ppm(reveal.price, belt_center, offer.reward_belt_ppm))
            .map(|reveal| reveal.voter)
            .collect(),
    )
}

/// Share `pool` among `members` by weight; dust goes to the remainder claimer.
fn distribute_pool(
    pool: U256,
    members: &[&WeightedReveal],
    offer: &PartialRewardOffer,
    reward_epoch: &RewardEpoch,
    claims: &mut Vec<PartialRewardClaim>,
) -> RewardResult<()> {
    if pool.is_zero() {
        return Ok(());
    }

    let band_weight = checked_sum(members.iter().map(|reveal| reveal.weight))?;

    let mut distributed = U256::zero();
    if !band_weight.is_zero() {
        for reveal in members {
            let share = mul_div(pool, reveal.weight, band_weight)?;
            if share.is_zero() {
                continue;
            }
            let voter = reward_epoch.voter_by_submission(&reveal.voter).ok_or_else(|| {
                RewardError::critical(format!(
                    "median voter {} is not registered",
                    address_hex(&reveal.voter)
                ))
            })?;
            claims.push(PartialRewardClaim::weighted(
                voter.delegation_address,
                offer.currency,
                share,
            ));
            distributed += share;
        }
    }

    let dust = pool - distributed;
    if !dust.is_zero() {
        claims.push(PartialRewardClaim::fixed(
            offer.remainder_claimer,
            offer.currency,
            dust,
            ClaimType::Median,
        ));
    }
    Ok(())
}

/// Median claims for one median sub-offer.
pub fn calculate_median_rewards(
    offer: &PartialRewardOffer,
    result: &MedianCalculationResult,
    reward_epoch: &RewardEpoch,
) -> RewardResult<Vec<PartialRewardClaim>> {
    if result.feed.id != offer.feed.id || result.voting_round_id != offer.voting_round_id {
        return Err(RewardError::critical(format!(
            "median result for feed {} round {} used for offer on feed {} round {}",
            result.feed.id, result.voting_round_id, offer.feed.id, offer.voting_round_id
        )));
    }

    let mut claims = Vec::new();
    if offer.amount.is_zero() {
        return Ok(claims);
    }

    let summary = match result.summary {
        Some(summary) => summary,
        None => {
            claims.push(PartialRewardClaim::fixed(
                offer.remainder_claimer,
                offer.currency,
                offer.amount,
                ClaimType::Median,
            ));
            return Ok(claims);
        }
    };

    let belt = belt_eligible(offer, result, reward_epoch);
    let eligible: Vec<&WeightedReveal> = result
        .reveals
        .iter()
        .filter(|reveal| belt.as_ref().map_or(true, |belt| belt.contains(&reveal.voter)))
        .collect();

    let iqr_members: Vec<&WeightedReveal> = eligible
        .iter()
        .copied()
        .filter(|reveal| {
            summary.quartile1_price <= reveal.price && reveal.price <= summary.quartile3_price
        })
        .collect();
    let pct_members: Vec<&WeightedReveal> = eligible
        .iter()
        .copied()
        .filter(|reveal| {
            within_ppm(
                reveal.price,
                summary.final_median_price,
                offer.elastic_band_width_ppm,
            )
        })
        .collect();

    trace!(
        voting_round_id = offer.voting_round_id,
        feed = %offer.feed.id,
        eligible = eligible.len(),
        iqr = iqr_members.len(),
        pct = pct_members.len(),
        "[ftso-rewards] Median bands"
    );

    let (iqr_pool, pct_pool) = iqr_pct_pools(offer)?;
    distribute_pool(iqr_pool, &iqr_members, offer, reward_epoch, &mut claims)?;
    distribute_pool(pct_pool, &pct_members, offer, reward_epoch, &mut claims)?;
    Ok(claims)
}
