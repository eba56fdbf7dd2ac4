//! Signing rewards and double-signer detection.

use crate::config::RewardCalculationConfig;
use crate::domain::arith::mul_div;
use crate::domain::claims::{ClaimType, PartialRewardClaim};
use crate::domain::offers::PartialRewardOffer;
use crate::domain::reward_epoch::RewardEpoch;
use crate::error::RewardResult;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Hash, ProtocolId, VotingRoundId, U256};
use std::collections::{BTreeMap, BTreeSet};

/// An observed signature over a round's merkle root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureSubmission {
    /// Recovered signing address
    pub signer: Address,
    pub protocol_id: ProtocolId,
    pub voting_round_id: VotingRoundId,
    pub merkle_root: Hash,
    pub timestamp: u64,
    /// Signature verified against `signer`
    pub valid: bool,
}

impl SignatureSubmission {
    fn is_for(&self, protocol_id: ProtocolId, voting_round_id: VotingRoundId) -> bool {
        self.valid && self.protocol_id == protocol_id && self.voting_round_id == voting_round_id
    }
}

/// Signing addresses with valid signatures over two or more different roots.
pub fn detect_double_signers(
    signatures: &[SignatureSubmission],
    protocol_id: ProtocolId,
    voting_round_id: VotingRoundId,
) -> BTreeSet<Address> {
    let mut roots: BTreeMap<Address, BTreeSet<Hash>> = BTreeMap::new();
    for signature in signatures
        .iter()
        .filter(|signature| signature.is_for(protocol_id, voting_round_id))
    {
        roots
            .entry(signature.signer)
            .or_default()
            .insert(signature.merkle_root);
    }

    roots
        .into_iter()
        .filter(|(_, roots)| roots.len() > 1)
        .map(|(signer, _)| signer)
        .collect()
}

/// Signing claims for one signing sub-offer.
///
/// The sub-offer is shared by signing-policy weight among voters that signed
/// the finalized root in time. Without a finalized root, or without any
/// eligible signature, it goes to the remainder claimer.
pub fn calculate_signing_rewards(
    offer: &PartialRewardOffer,
    finalized_root: Option<&Hash>,
    signatures: &[SignatureSubmission],
    double_signers: &BTreeSet<Address>,
    reward_epoch: &RewardEpoch,
    config: &RewardCalculationConfig,
) -> RewardResult<Vec<PartialRewardClaim>> {
    let mut claims = Vec::new();
    if offer.amount.is_zero() {
        return Ok(claims);
    }

    let remainder = |amount: U256| {
        PartialRewardClaim::fixed(offer.remainder_claimer, offer.currency, amount, ClaimType::Signing)
    };

    let Some(finalized_root) = finalized_root else {
        claims.push(remainder(offer.amount));
        return Ok(claims);
    };

    let deadline = config
        .epoch_settings
        .signing_deadline(offer.voting_round_id);

    // identity -> signing weight
    let mut signers: BTreeMap<Address, u16> = BTreeMap::new();
    for signature in signatures {
        if !signature.is_for(config.protocol_id, offer.voting_round_id)
            || signature.merkle_root != *finalized_root
            || signature.timestamp > deadline
            || double_signers.contains(&signature.signer)
        {
            continue;
        }
        if let Some(voter) = reward_epoch.voter_by_signing(&signature.signer) {
            signers.insert(voter.identity_address, voter.signing_weight);
        }
    }

    let total_weight: u64 = signers.values().map(|w| u64::from(*w)).sum();
    if total_weight == 0 {
        claims.push(remainder(offer.amount));
        return Ok(claims);
    }

    let mut distributed = U256::zero();
    for (identity, weight) in &signers {
        let share = mul_div(offer.amount, U256::from(*weight), U256::from(total_weight))?;
        if share.is_zero() {
            continue;
        }
        claims.push(PartialRewardClaim::fixed(
            *identity,
            offer.currency,
            share,
            ClaimType::Signing,
        ));
        distributed += share;
    }

    let dust = offer.amount - distributed;
    if !dust.is_zero() {
        claims.push(remainder(dust));
    }
    Ok(claims)
}
