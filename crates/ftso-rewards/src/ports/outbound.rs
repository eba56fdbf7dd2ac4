//! Driven Ports (SPI - Outbound Dependencies)
//!
//! Indexing, event decoding and payload retrieval live behind these traits.

use crate::domain::{RewardEpoch, RoundRewardData};
use crate::error::RewardResult;
use async_trait::async_trait;
use shared_types::{RewardEpochId, VotingRoundId};
use std::sync::Arc;

/// Inclusive voting round range of a reward epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VotingRoundRange {
    pub start_voting_round_id: VotingRoundId,
    pub end_voting_round_id: VotingRoundId,
}

impl VotingRoundRange {
    pub fn contains(&self, voting_round_id: VotingRoundId) -> bool {
        self.start_voting_round_id <= voting_round_id && voting_round_id <= self.end_voting_round_id
    }

    pub fn rounds(&self) -> impl Iterator<Item = VotingRoundId> {
        self.start_voting_round_id..=self.end_voting_round_id
    }

    pub fn len(&self) -> usize {
        self.rounds().count()
    }

    pub fn is_empty(&self) -> bool {
        self.end_voting_round_id < self.start_voting_round_id
    }
}

/// Availability of a round's source data.
///
/// `NotOk` means the round cannot be calculated yet; callers must not fall
/// back to defaults.
#[derive(Clone, Debug)]
pub enum DataAvailability {
    Ok(Box<RoundRewardData>),
    NotOk { reason: String },
}

/// Per-round data for reward calculation.
#[async_trait]
pub trait RewardDataProvider: Send + Sync {
    /// Round data, with the benched set computed over the preceding
    /// `benching_window` rounds.
    async fn get_data_for_reward_calculation(
        &self,
        voting_round_id: VotingRoundId,
        benching_window: u32,
    ) -> RewardResult<DataAvailability>;
}

/// Reward epoch lookup.
#[async_trait]
pub trait RewardEpochProvider: Send + Sync {
    async fn get_reward_epoch_duration_range(
        &self,
        reward_epoch_id: RewardEpochId,
    ) -> RewardResult<VotingRoundRange>;

    async fn get_reward_epoch_for_voting_round(
        &self,
        voting_round_id: VotingRoundId,
    ) -> RewardResult<Arc<RewardEpoch>>;
}
