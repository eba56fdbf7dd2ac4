//! # Reward Claims
//!
//! Partial claims are produced per voting round and merged by
//! `(beneficiary, currency, kind, is_fixed)`. Merging is a fold over an
//! ordered map, so it is associative and commutative and the merged output
//! always comes out in the same canonical order.
//!
//! At the end of a reward epoch the merged set is stamped with the epoch id,
//! giving the final claims that become Merkle leaves.

use crate::error::{RewardError, RewardResult};
use serde::{Deserialize, Serialize};
use shared_types::{Address, RewardEpochId, VotingRoundId, U256};
use std::collections::BTreeMap;
use tracing::debug;

/// What a claim pays for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ClaimType {
    Median,
    Signing,
    Finalization,
    /// Deduction for signing two different roots in one round
    DoubleSigningPenalty,
    /// Deduction for committing without revealing
    RevealWithdrawalPenalty,
}

impl ClaimType {
    pub fn is_penalty(&self) -> bool {
        matches!(
            self,
            Self::DoubleSigningPenalty | Self::RevealWithdrawalPenalty
        )
    }
}

/// Per-round claim, not yet bound to a reward epoch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialRewardClaim {
    pub beneficiary: Address,
    pub currency: Address,
    pub amount: U256,
    pub claim_type: ClaimType,
    /// Fixed claims pay the beneficiary in full; others are shared with delegators
    pub is_fixed: bool,
}

impl PartialRewardClaim {
    pub fn fixed(beneficiary: Address, currency: Address, amount: U256, claim_type: ClaimType) -> Self {
        Self {
            beneficiary,
            currency,
            amount,
            claim_type,
            is_fixed: true,
        }
    }

    pub fn weighted(beneficiary: Address, currency: Address, amount: U256) -> Self {
        Self {
            beneficiary,
            currency,
            amount,
            claim_type: ClaimType::Median,
            is_fixed: false,
        }
    }

    fn key(&self) -> ClaimKey {
        (self.beneficiary, self.currency, self.claim_type, self.is_fixed)
    }
}

/// Final, epoch-scoped claim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardClaim {
    pub reward_epoch_id: RewardEpochId,
    pub beneficiary: Address,
    pub currency: Address,
    pub amount: U256,
    pub claim_type: ClaimType,
    pub is_fixed: bool,
}

type ClaimKey = (Address, Address, ClaimType, bool);

fn fold_into(
    totals: &mut BTreeMap<ClaimKey, U256>,
    claims: impl IntoIterator<Item = PartialRewardClaim>,
) -> RewardResult<()> {
    for claim in claims {
        let total = totals.entry(claim.key()).or_insert_with(U256::zero);
        *total = total
            .checked_add(claim.amount)
            .ok_or_else(|| RewardError::critical("merged claim amount exceeds U256"))?;
    }
    Ok(())
}

fn unfold(totals: &BTreeMap<ClaimKey, U256>) -> Vec<PartialRewardClaim> {
    totals
        .iter()
        .filter(|(_, amount)| !amount.is_zero())
        .map(
            |((beneficiary, currency, claim_type, is_fixed), amount)| PartialRewardClaim {
                beneficiary: *beneficiary,
                currency: *currency,
                amount: *amount,
                claim_type: *claim_type,
                is_fixed: *is_fixed,
            },
        )
        .collect()
}

/// Merge claims with equal keys by summing amounts.
///
/// Output is sorted by key; zero-amount claims are dropped.
pub fn merge_claims(
    claims: impl IntoIterator<Item = PartialRewardClaim>,
) -> RewardResult<Vec<PartialRewardClaim>> {
    let mut totals = BTreeMap::new();
    fold_into(&mut totals, claims)?;
    Ok(unfold(&totals))
}

/// Attach the reward epoch id to a merged claim set.
pub fn into_reward_claims(
    reward_epoch_id: RewardEpochId,
    claims: Vec<PartialRewardClaim>,
) -> Vec<RewardClaim> {
    claims
        .into_iter()
        .map(|claim| RewardClaim {
            reward_epoch_id,
            beneficiary: claim.beneficiary,
            currency: claim.currency,
            amount: claim.amount,
            claim_type: claim.claim_type,
            is_fixed: claim.is_fixed,
        })
        .collect()
}

/// Cumulative claims of one reward epoch, fed round by round.
#[derive(Debug)]
pub struct ClaimAccumulator {
    reward_epoch_id: RewardEpochId,
    last_voting_round_id: Option<VotingRoundId>,
    totals: BTreeMap<ClaimKey, U256>,
}

impl ClaimAccumulator {
    pub fn new(reward_epoch_id: RewardEpochId) -> Self {
        Self {
            reward_epoch_id,
            last_voting_round_id: None,
            totals: BTreeMap::new(),
        }
    }

    pub fn reward_epoch_id(&self) -> RewardEpochId {
        self.reward_epoch_id
    }

    pub fn last_voting_round_id(&self) -> Option<VotingRoundId> {
        self.last_voting_round_id
    }

    /// Add one round's claims. Rounds must arrive in increasing order.
    pub fn apply_round(
        &mut self,
        voting_round_id: VotingRoundId,
        claims: impl IntoIterator<Item = PartialRewardClaim>,
    ) -> RewardResult<()> {
        if let Some(last) = self.last_voting_round_id {
            if voting_round_id <= last {
                return Err(RewardError::RoundOutOfOrder {
                    expected: last.saturating_add(1),
                    actual: voting_round_id,
                });
            }
        }

        // Fold into a copy so a failed round leaves the totals untouched.
        let mut totals = self.totals.clone();
        fold_into(&mut totals, claims)?;
        self.totals = totals;
        self.last_voting_round_id = Some(voting_round_id);

        debug!(
            reward_epoch_id = self.reward_epoch_id,
            voting_round_id,
            claims = self.totals.len(),
            "[ftso-rewards] Round claims accumulated"
        );
        Ok(())
    }

    /// Current cumulative claims in canonical order.
    pub fn claims(&self) -> Vec<PartialRewardClaim> {
        unfold(&self.totals)
    }

    pub fn finalize(self) -> Vec<RewardClaim> {
        into_reward_claims(self.reward_epoch_id, unfold(&self.totals))
    }
}
