//! Driving Ports (API - Inbound)

use crate::domain::{PartialRewardClaim, RewardClaim, RoundRewardOutcome};
use crate::error::RewardResult;
use async_trait::async_trait;
use shared_types::{RewardEpochId, VotingRoundId};

/// Reward calculation API.
#[async_trait]
pub trait RewardCalculationApi: Send + Sync {
    /// Calculate one voting round.
    ///
    /// Fails with `DataUnavailable` when the round's source data is not
    /// complete; other rounds are unaffected.
    async fn calculate_voting_round(
        &self,
        voting_round_id: VotingRoundId,
        merge: bool,
    ) -> RewardResult<RoundRewardOutcome>;

    /// Claims of every round of a reward epoch, unmerged or merged, without
    /// attaching the epoch id.
    async fn calculate_reward_epoch_partial(
        &self,
        reward_epoch_id: RewardEpochId,
        merge: bool,
    ) -> RewardResult<Vec<PartialRewardClaim>>;

    /// Final claims of a reward epoch, ready for Merkle leaf conversion.
    async fn calculate_reward_epoch(
        &self,
        reward_epoch_id: RewardEpochId,
    ) -> RewardResult<Vec<RewardClaim>>;
}
