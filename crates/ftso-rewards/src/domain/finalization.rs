//! Finalization rewards
//!
//! Finalizing a round inside its grace period is reserved for a rotating,
//! randomly selected voter set (see `voter_selector`). After the grace
//! period anybody may finalize and the first successful finalizer is paid.

use crate::config::RewardCalculationConfig;
use crate::domain::claims::{ClaimType, PartialRewardClaim};
use crate::domain::offers::PartialRewardOffer;
use crate::domain::reward_epoch::RewardEpoch;
use crate::error::RewardResult;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Hash, ProtocolId, VotingRoundId, U256};
use std::collections::BTreeSet;

/// An observed finalization transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizationSubmission {
    /// Sender of the finalization transaction
    pub submitter: Address,
    pub protocol_id: ProtocolId,
    pub voting_round_id: VotingRoundId,
    pub merkle_root: Hash,
    pub timestamp: u64,
    /// Whether the transaction finalized the round
    pub successful: bool,
}

/// First successful finalization of a round, in chain order.
pub fn first_successful_finalization(
    finalizations: &[FinalizationSubmission],
    protocol_id: ProtocolId,
    voting_round_id: VotingRoundId,
) -> Option<&FinalizationSubmission> {
    finalizations.iter().find(|finalization| {
        finalization.successful
            && finalization.protocol_id == protocol_id
            && finalization.voting_round_id == voting_round_id
    })
}

/// Finalization claims for one finalization sub-offer.
///
/// `selected` holds the signing addresses eligible during the grace period.
pub fn calculate_finalization_rewards(
    offer: &PartialRewardOffer,
    finalizations: &[FinalizationSubmission],
    selected: &BTreeSet<Address>,
    reward_epoch: &RewardEpoch,
    config: &RewardCalculationConfig,
) -> RewardResult<Vec<PartialRewardClaim>> {
    let mut claims = Vec::new();
    if offer.amount.is_zero() {
        return Ok(claims);
    }

    let remainder = |amount: U256| {
        PartialRewardClaim::fixed(
            offer.remainder_claimer,
            offer.currency,
            amount,
            ClaimType::Finalization,
        )
    };

    let voting_round_id = offer.voting_round_id;
    let Some(first) =
        first_successful_finalization(finalizations, config.protocol_id, voting_round_id)
    else {
        claims.push(remainder(offer.amount));
        return Ok(claims);
    };

    let grace_deadline = config
        .epoch_settings
        .finalization_grace_deadline(voting_round_id);

    if first.timestamp > grace_deadline {
        match reward_epoch.identity_for_signing(&first.submitter) {
            Some(identity) => claims.push(PartialRewardClaim::fixed(
                identity,
                offer.currency,
                offer.amount,
                ClaimType::Finalization,
            )),
            None => claims.push(remainder(offer.amount)),
        }
        return Ok(claims);
    }

    let finalizers: BTreeSet<Address> = finalizations
        .iter()
        .filter(|finalization| {
            finalization.successful
                && finalization.protocol_id == config.protocol_id
                && finalization.voting_round_id == voting_round_id
                && finalization.timestamp <= grace_deadline
                && selected.contains(&finalization.submitter)
        })
        .filter_map(|finalization| reward_epoch.identity_for_signing(&finalization.submitter))
        .collect();

    if finalizers.is_empty() {
        claims.push(remainder(offer.amount));
        return Ok(claims);
    }

    let share = offer.amount / U256::from(finalizers.len());
    if !share.is_zero() {
        for identity in &finalizers {
            claims.push(PartialRewardClaim::fixed(
                *identity,
                offer.currency,
                share,
                ClaimType::Finalization,
            ));
        }
    }
    let dust = offer.amount - share * U256::from(finalizers.len());
    if !dust.is_zero() {
        claims.push(remainder(dust));
    }
    Ok(claims)
}
