//! Reward Data Provider Adapter
//!
//! Stores indexed submissions per voting round. A round is served only after
//! it has been marked complete; until then the provider answers `NotOk`.
//! The benched set is derived from the stored history of earlier rounds,
//! applying each round's reveal deadline.

use crate::config::EpochSettings;
use crate::domain::{
    CommitSubmission, DataForCalculations, FinalizationSubmission, RevealSubmission,
    RoundRewardData, SignatureSubmission,
};
use crate::error::RewardResult;
use crate::ports::outbound::{DataAvailability, RewardDataProvider, RewardEpochProvider};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{Address, VotingRoundId};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Submissions of one voting round, each list in chain order.
#[derive(Clone, Debug, Default)]
pub struct RoundSubmissions {
    pub commits: Vec<CommitSubmission>,
    pub reveals: Vec<RevealSubmission>,
    pub signatures: Vec<SignatureSubmission>,
    pub finalizations: Vec<FinalizationSubmission>,
}

#[derive(Clone, Debug, Default)]
struct StoredRound {
    submissions: RoundSubmissions,
    complete: bool,
}

pub struct InMemoryRewardDataProvider<E: RewardEpochProvider> {
    epoch_provider: Arc<E>,
    epoch_settings: EpochSettings,
    rounds: RwLock<BTreeMap<VotingRoundId, StoredRound>>,
}

impl<E: RewardEpochProvider> InMemoryRewardDataProvider<E> {
    pub fn new(epoch_provider: Arc<E>, epoch_settings: EpochSettings) -> Self {
        Self {
            epoch_provider,
            epoch_settings,
            rounds: RwLock::new(BTreeMap::new()),
        }
    }

    /// Store a whole round and mark it complete.
    pub fn insert_round(&self, voting_round_id: VotingRoundId, submissions: RoundSubmissions) {
        self.rounds.write().insert(
            voting_round_id,
            StoredRound {
                submissions,
                complete: true,
            },
        );
    }

    pub fn add_commit(&self, voting_round_id: VotingRoundId, commit: CommitSubmission) {
        self.rounds
            .write()
            .entry(voting_round_id)
            .or_default()
            .submissions
            .commits
            .push(commit);
    }

    pub fn add_reveal(&self, voting_round_id: VotingRoundId, reveal: RevealSubmission) {
        self.rounds
            .write()
            .entry(voting_round_id)
            .or_default()
            .submissions
            .reveals
            .push(reveal);
    }

    pub fn add_signature(&self, voting_round_id: VotingRoundId, signature: SignatureSubmission) {
        self.rounds
            .write()
            .entry(voting_round_id)
            .or_default()
            .submissions
            .signatures
            .push(signature);
    }

    pub fn add_finalization(
        &self,
        voting_round_id: VotingRoundId,
        finalization: FinalizationSubmission,
    ) {
        self.rounds
            .write()
            .entry(voting_round_id)
            .or_default()
            .submissions
            .finalizations
            .push(finalization);
    }

    /// No more submissions will arrive for the round.
    pub fn mark_complete(&self, voting_round_id: VotingRoundId) {
        self.rounds
            .write()
            .entry(voting_round_id)
            .or_default()
            .complete = true;
    }

    fn stored_round(&self, voting_round_id: VotingRoundId) -> Option<StoredRound> {
        self.rounds.read().get(&voting_round_id).cloned()
    }

    /// Reveal offenders of the `benching_window` rounds before `voting_round_id`.
    async fn benched_submitters(
        &self,
        voting_round_id: VotingRoundId,
        benching_window: u32,
    ) -> RewardResult<BTreeSet<Address>> {
        let mut benched = BTreeSet::new();
        for previous in voting_round_id.saturating_sub(benching_window)..voting_round_id {
            let Some(stored) = self.stored_round(previous) else {
                continue;
            };
            let reward_epoch = match self
                .epoch_provider
                .get_reward_epoch_for_voting_round(previous)
                .await
            {
                Ok(epoch) => epoch,
                Err(e) if e.is_retryable() => continue,
                Err(e) => return Err(e),
            };
            let data = DataForCalculations::from_submissions(
                &reward_epoch,
                &stored.submissions.commits,
                &stored.submissions.reveals,
                self.epoch_settings.reveal_deadline(previous),
                BTreeSet::new(),
            );
            benched.extend(data.reveal_offenders);
        }
        Ok(benched)
    }
}

#[async_trait]
impl<E: RewardEpochProvider + 'static> RewardDataProvider for InMemoryRewardDataProvider<E> {
    async fn get_data_for_reward_calculation(
        &self,
        voting_round_id: VotingRoundId,
        benching_window: u32,
    ) -> RewardResult<DataAvailability> {
        let stored = match self.stored_round(voting_round_id) {
            Some(stored) if stored.complete => stored,
            _ => {
                debug!(
                    "[ftso-rewards] Voting round {} not complete yet",
                    voting_round_id
                );
                return Ok(DataAvailability::NotOk {
                    reason: "voting round not fully indexed".to_string(),
                });
            }
        };

        let reward_epoch = match self
            .epoch_provider
            .get_reward_epoch_for_voting_round(voting_round_id)
            .await
        {
            Ok(epoch) => epoch,
            Err(e) if e.is_retryable() => {
                warn!(
                    "[ftso-rewards] No reward epoch for voting round {}: {}",
                    voting_round_id, e
                );
                return Ok(DataAvailability::NotOk {
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        let benched = self
            .benched_submitters(voting_round_id, benching_window)
            .await?;
        let RoundSubmissions {
            commits,
            reveals,
            signatures,
            finalizations,
        } = stored.submissions;

        Ok(DataAvailability::Ok(Box::new(RoundRewardData {
            voting_round_id,
            reward_epoch,
            commits,
            reveals,
            signatures,
            finalizations,
            benched,
        })))
    }
}
