//! Reward Epoch Provider Adapter
//!
//! Builds reward epochs from their event bundles and caches them. Epochs are
//! keyed by id; the voting round range of an epoch ends one round before the
//! next epoch starts, so the newest epoch's range is not known yet.

use crate::domain::{RewardEpoch, RewardEpochEvents};
use crate::error::{RewardError, RewardResult};
use crate::ports::outbound::{RewardEpochProvider, VotingRoundRange};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{RewardEpochId, VotingRoundId};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

pub struct InMemoryRewardEpochProvider {
    epochs: RwLock<BTreeMap<RewardEpochId, Arc<RewardEpoch>>>,
}

impl InMemoryRewardEpochProvider {
    pub fn new() -> Self {
        Self {
            epochs: RwLock::new(BTreeMap::new()),
        }
    }

    /// Build a reward epoch from its events and cache it.
    ///
    /// Inconsistent events are rejected and nothing is cached.
    pub fn insert_epoch_events(&self, events: RewardEpochEvents) -> RewardResult<Arc<RewardEpoch>> {
        let epoch = Arc::new(RewardEpoch::new(events)?);
        info!(
            "[ftso-rewards] 📥 Reward epoch {} registered (starts at round {}, {} voters)",
            epoch.reward_epoch_id(),
            epoch.start_voting_round_id(),
            epoch.voters().len()
        );
        self.epochs
            .write()
            .insert(epoch.reward_epoch_id(), Arc::clone(&epoch));
        Ok(epoch)
    }

    pub fn reward_epoch(&self, reward_epoch_id: RewardEpochId) -> Option<Arc<RewardEpoch>> {
        self.epochs.read().get(&reward_epoch_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.epochs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.read().is_empty()
    }
}

impl Default for InMemoryRewardEpochProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RewardEpochProvider for InMemoryRewardEpochProvider {
    async fn get_reward_epoch_duration_range(
        &self,
        reward_epoch_id: RewardEpochId,
    ) -> RewardResult<VotingRoundRange> {
        let epochs = self.epochs.read();
        let unavailable = |reason: &str| RewardError::RewardEpochUnavailable {
            reward_epoch_id,
            reason: reason.to_string(),
        };

        let epoch = epochs
            .get(&reward_epoch_id)
            .ok_or_else(|| unavailable("reward epoch not registered"))?;
        let next = reward_epoch_id
            .checked_add(1)
            .and_then(|next_id| epochs.get(&next_id))
            .ok_or_else(|| unavailable("next reward epoch has not started"))?;

        let start_voting_round_id = epoch.start_voting_round_id();
        let end_voting_round_id = next
            .start_voting_round_id()
            .checked_sub(1)
            .filter(|end| *end >= start_voting_round_id)
            .ok_or_else(|| {
                RewardError::critical(format!(
                    "reward epoch {} starts at round {} but its successor starts at round {}",
                    reward_epoch_id,
                    start_voting_round_id,
                    next.start_voting_round_id()
                ))
            })?;

        Ok(VotingRoundRange {
            start_voting_round_id,
            end_voting_round_id,
        })
    }

    async fn get_reward_epoch_for_voting_round(
        &self,
        voting_round_id: VotingRoundId,
    ) -> RewardResult<Arc<RewardEpoch>> {
        let epochs = self.epochs.read();
        let found = epochs
            .values()
            .rev()
            .find(|epoch| epoch.start_voting_round_id() <= voting_round_id)
            .cloned();

        match found {
            Some(epoch) => {
                debug!(
                    "[ftso-rewards] Voting round {} belongs to reward epoch {}",
                    voting_round_id,
                    epoch.reward_epoch_id()
                );
                Ok(epoch)
            }
            None => Err(RewardError::unavailable(
                voting_round_id,
                "no reward epoch covers this voting round",
            )),
        }
    }
}
