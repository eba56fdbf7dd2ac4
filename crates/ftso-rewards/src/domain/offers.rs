//! Partial reward offers
//!
//! Offers are made per reward epoch. For calculation they are granulated into
//! one partial offer per (voting round, feed) and each partial offer is split
//! into median, signing and finalization parts. Partial offers are derived
//! data: recomputed from the parent offers whenever needed.

use crate::config::{RewardCalculationConfig, TOTAL_PPM};
use crate::domain::arith::ppm_of;
use crate::domain::events::{InflationOffer, RewardOffer, RewardOffers};
use crate::error::{RewardError, RewardResult};
use shared_types::{Address, Feed, FeedId, VotingRoundId, U256};
use std::collections::BTreeMap;

/// `voting_round_id -> feed -> partial offers`, ordered for determinism.
pub type PartialOfferMap = BTreeMap<VotingRoundId, BTreeMap<FeedId, Vec<PartialRewardOffer>>>;

/// One offer's share for a single voting round and feed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartialRewardOffer {
    pub voting_round_id: VotingRoundId,
    pub feed: Feed,
    pub amount: U256,
    pub currency: Address,
    pub iqr_share_ppm: u32,
    pub pct_share_ppm: u32,
    pub reward_belt_ppm: u32,
    pub elastic_band_width_ppm: u32,
    pub lead_providers: Vec<Address>,
    pub remainder_claimer: Address,
}

impl PartialRewardOffer {
    fn from_offer(offer: &RewardOffer, voting_round_id: VotingRoundId, amount: U256) -> Self {
        Self {
            voting_round_id,
            feed: offer.feed,
            amount,
            currency: offer.currency,
            iqr_share_ppm: offer.iqr_share_ppm,
            pct_share_ppm: offer.pct_share_ppm,
            reward_belt_ppm: offer.reward_belt_ppm,
            elastic_band_width_ppm: offer.elastic_band_width_ppm,
            lead_providers: offer.lead_providers.clone(),
            remainder_claimer: offer.remainder_claimer,
        }
    }

    fn with_amount(&self, amount: U256) -> Self {
        Self {
            amount,
            ..self.clone()
        }
    }
}

/// A partial offer split by reward type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitRewardOffer {
    pub median: PartialRewardOffer,
    pub signing: PartialRewardOffer,
    pub finalization: PartialRewardOffer,
}

/// Split a partial offer into median, signing and finalization parts.
///
/// Signing and finalization parts are floored; the median part absorbs the
/// rounding so the three always sum to the offer amount.
pub fn split_reward_offer(
    offer: &PartialRewardOffer,
    config: &RewardCalculationConfig,
) -> RewardResult<SplitRewardOffer> {
    let signing = ppm_of(offer.amount, config.signing_share_ppm)?;
    let finalization = ppm_of(offer.amount, config.finalization_share_ppm)?;
    let median = offer
        .amount
        .checked_sub(signing)
        .and_then(|rest| rest.checked_sub(finalization))
        .ok_or_else(|| RewardError::critical("signing and finalization shares exceed offer"))?;

    Ok(SplitRewardOffer {
        median: offer.with_amount(median),
        signing: offer.with_amount(signing),
        finalization: offer.with_amount(finalization),
    })
}

/// Expand an inflation offer into one regular offer per feed.
///
/// The amount is divided evenly; the first `amount % feeds` feeds receive
/// one extra unit.
pub fn expand_inflation_offer(
    offer: &InflationOffer,
    config: &RewardCalculationConfig,
) -> Vec<RewardOffer> {
    if offer.feeds.is_empty() {
        return Vec::new();
    }
    let shares = even_split(offer.amount, offer.feeds.len());

    offer
        .feeds
        .iter()
        .zip(offer.elastic_band_widths_ppm.iter())
        .zip(shares)
        .map(|((feed, band_width), amount)| RewardOffer {
            reward_epoch_id: offer.reward_epoch_id,
            feed: *feed,
            amount,
            currency: config.inflation_currency,
            iqr_share_ppm: offer.iqr_share_ppm,
            pct_share_ppm: offer.pct_share_ppm,
            reward_belt_ppm: 0,
            elastic_band_width_ppm: *band_width,
            lead_providers: Vec::new(),
            remainder_claimer: config.burn_address,
        })
        .collect()
}

/// Granulate all offers of an epoch over the voting rounds `[start, end]`.
///
/// Each per-feed offer is divided evenly across rounds; the first
/// `amount % rounds` rounds receive one extra unit.
pub fn granulated_partial_offer_map(
    start_voting_round_id: VotingRoundId,
    end_voting_round_id: VotingRoundId,
    offers: &RewardOffers,
    config: &RewardCalculationConfig,
) -> RewardResult<PartialOfferMap> {
    if end_voting_round_id < start_voting_round_id {
        return Err(RewardError::critical(format!(
            "empty voting round range [{}, {}]",
            start_voting_round_id, end_voting_round_id
        )));
    }
    let round_count = (end_voting_round_id - start_voting_round_id) as usize + 1;

    let mut map = PartialOfferMap::new();
    for offer in per_feed_offers(offers, config) {
        let shares = even_split(offer.amount, round_count);
        for (voting_round_id, amount) in (start_voting_round_id..=end_voting_round_id).zip(shares) {
            map.entry(voting_round_id)
                .or_default()
                .entry(offer.feed.id)
                .or_default()
                .push(PartialRewardOffer::from_offer(&offer, voting_round_id, amount));
        }
    }
    Ok(map)
}

/// Partial offers of a single voting round of `[start, end]`.
///
/// Matches the round's entry of `granulated_partial_offer_map` without
/// building the whole map.
pub fn partial_offers_for_round(
    start_voting_round_id: VotingRoundId,
    end_voting_round_id: VotingRoundId,
    voting_round_id: VotingRoundId,
    offers: &RewardOffers,
    config: &RewardCalculationConfig,
) -> RewardResult<BTreeMap<FeedId, Vec<PartialRewardOffer>>> {
    if voting_round_id < start_voting_round_id || voting_round_id > end_voting_round_id {
        return Err(RewardError::critical(format!(
            "voting round {} outside reward epoch range [{}, {}]",
            voting_round_id, start_voting_round_id, end_voting_round_id
        )));
    }
    let round_count = U256::from(end_voting_round_id - start_voting_round_id) + 1;
    let position = U256::from(voting_round_id - start_voting_round_id);

    let mut map: BTreeMap<FeedId, Vec<PartialRewardOffer>> = BTreeMap::new();
    for offer in per_feed_offers(offers, config) {
        let share = offer.amount / round_count;
        let amount = if position < offer.amount % round_count {
            share + 1
        } else {
            share
        };
        map.entry(offer.feed.id)
            .or_default()
            .push(PartialRewardOffer::from_offer(&offer, voting_round_id, amount));
    }
    Ok(map)
}

/// Regular offers followed by inflation offers expanded per feed.
fn per_feed_offers(offers: &RewardOffers, config: &RewardCalculationConfig) -> Vec<RewardOffer> {
    offers
        .reward_offers
        .iter()
        .cloned()
        .chain(
            offers
                .inflation_offers
                .iter()
                .flat_map(|offer| expand_inflation_offer(offer, config)),
        )
        .collect()
}

/// Split `amount` into `parts` integer shares that sum to `amount`.
fn even_split(amount: U256, parts: usize) -> Vec<U256> {
    let divisor = U256::from(parts);
    let share = amount / divisor;
    let remainder = (amount % divisor).low_u64() as usize;
    (0..parts)
        .map(|i| if i < remainder { share + 1 } else { share })
        .collect()
}

/// IQR pool of a median offer; the PCT pool is the rest.
pub fn iqr_pct_pools(offer: &PartialRewardOffer) -> RewardResult<(U256, U256)> {
    debug_assert_eq!(offer.iqr_share_ppm + offer.pct_share_ppm, TOTAL_PPM);
    let pct = ppm_of(offer.amount, offer.pct_share_ppm)?;
    Ok((offer.amount - pct, pct))
}
