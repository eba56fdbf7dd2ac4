//! # Penalties
//!
//! Two offences are penalized per partial offer:
//!
//! - **Reveal withdrawal**: committing in a round without a valid reveal.
//! - **Double signing**: valid signatures over two different roots for the
//!   same protocol and round.
//!
//! The penalty is proportional to the offender's share of the total capped
//! weight, scaled by the penalty factor:
//!
//! ```text
//! penalty = offer.amount * capped_weight * penalty_factor / total_capped_weight
//! ```
//!
//! Penalty claims are fixed and addressed to the offender's submission
//! address. Amounts are positive; the claim type marks them as deductions.

use crate::config::RewardCalculationConfig;
use crate::domain::arith::mul_div;
use crate::domain::claims::{ClaimType, PartialRewardClaim};
use crate::domain::offers::PartialRewardOffer;
use crate::domain::reward_epoch::RewardEpoch;
use crate::error::{RewardError, RewardResult};
use shared_types::{address_hex, Address, U256};
use std::collections::BTreeSet;
use tracing::warn;

fn penalty_claims(
    offer: &PartialRewardOffer,
    offenders: &BTreeSet<Address>,
    claim_type: ClaimType,
    reward_epoch: &RewardEpoch,
    config: &RewardCalculationConfig,
) -> RewardResult<Vec<PartialRewardClaim>> {
    let mut claims = Vec::with_capacity(offenders.len());
    if offer.amount.is_zero() || offenders.is_empty() {
        return Ok(claims);
    }

    let total_weight = reward_epoch.total_capped_weight();
    for submit_address in offenders {
        let weight = reward_epoch.capped_weight_for_submission(submit_address)?;
        let scaled_weight = weight
            .checked_mul(U256::from(config.penalty_factor))
            .ok_or_else(|| RewardError::critical("penalty weight exceeds U256"))?;
        let amount = mul_div(offer.amount, scaled_weight, total_weight)?;
        if amount.is_zero() {
            continue;
        }
        claims.push(PartialRewardClaim::fixed(
            *submit_address,
            offer.currency,
            amount,
            claim_type,
        ));
    }
    Ok(claims)
}

/// Penalties for registered submitters that committed without revealing.
pub fn calculate_reveal_withdrawal_penalties(
    offer: &PartialRewardOffer,
    reveal_offenders: &BTreeSet<Address>,
    reward_epoch: &RewardEpoch,
    config: &RewardCalculationConfig,
) -> RewardResult<Vec<PartialRewardClaim>> {
    penalty_claims(
        offer,
        reveal_offenders,
        ClaimType::RevealWithdrawalPenalty,
        reward_epoch,
        config,
    )
}

/// Submission addresses of double signers; unknown signers are skipped.
pub fn double_signer_submitters(
    double_signers: &BTreeSet<Address>,
    reward_epoch: &RewardEpoch,
) -> BTreeSet<Address> {
    double_signers
        .iter()
        .filter_map(|signer| {
            let submitter = reward_epoch.submission_for_signing(signer);
            if submitter.is_none() {
                warn!(
                    "[ftso-rewards] Double signer {} is not in the signing policy",
                    address_hex(signer)
                );
            }
            submitter
        })
        .collect()
}

/// Penalties for double signers, given as submission addresses.
pub fn calculate_double_signing_penalties(
    offer: &PartialRewardOffer,
    double_signer_submitters: &BTreeSet<Address>,
    reward_epoch: &RewardEpoch,
    config: &RewardCalculationConfig,
) -> RewardResult<Vec<PartialRewardClaim>> {
    penalty_claims(
        offer,
        double_signer_submitters,
        ClaimType::DoubleSigningPenalty,
        reward_epoch,
        config,
    )
}
