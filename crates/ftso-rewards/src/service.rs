//! Reward Calculation Service
//!
//! Wires the outbound providers to the pure per-round calculation.
//! Epoch-level calculation fetches every round concurrently, calculates the
//! rounds in parallel on the blocking pool and folds their claims in
//! increasing round order.

use crate::config::RewardCalculationConfig;
use crate::domain::offers::partial_offers_for_round;
use crate::domain::{
    calculate_round, granulated_partial_offer_map, ClaimAccumulator, PartialRewardClaim,
    RewardClaim, RewardEpoch, RoundRewardData, RoundRewardOutcome,
};
use crate::error::{RewardError, RewardResult};
use crate::ports::inbound::RewardCalculationApi;
use crate::ports::outbound::{
    DataAvailability, RewardDataProvider, RewardEpochProvider, VotingRoundRange,
};
use async_trait::async_trait;
use futures::future::try_join_all;
use rayon::prelude::*;
use shared_types::{RewardEpochId, VotingRoundId};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, warn};

fn log_critical<T>(result: RewardResult<T>) -> RewardResult<T> {
    if let Err(err @ RewardError::CriticalInvariant { .. }) = &result {
        error!("[ftso-rewards] {}", err);
    }
    result
}

/// Reward calculation service
pub struct RewardCalculationService<D, E>
where
    D: RewardDataProvider,
    E: RewardEpochProvider,
{
    config: RewardCalculationConfig,
    data_provider: Arc<D>,
    epoch_provider: Arc<E>,
}

impl<D, E> RewardCalculationService<D, E>
where
    D: RewardDataProvider,
    E: RewardEpochProvider,
{
    /// Create a new service; the configuration is validated first.
    pub fn new(
        config: RewardCalculationConfig,
        data_provider: Arc<D>,
        epoch_provider: Arc<E>,
    ) -> RewardResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            data_provider,
            epoch_provider,
        })
    }

    pub fn config(&self) -> &RewardCalculationConfig {
        &self.config
    }

    /// Round data, or `DataUnavailable` when the provider reports `NotOk`.
    async fn round_data(&self, voting_round_id: VotingRoundId) -> RewardResult<RoundRewardData> {
        let availability = self
            .data_provider
            .get_data_for_reward_calculation(voting_round_id, self.config.benching_window)
            .await?;

        match availability {
            DataAvailability::Ok(data) if data.voting_round_id == voting_round_id => Ok(*data),
            DataAvailability::Ok(data) => Err(RewardError::critical(format!(
                "requested voting round {} but received round {}",
                voting_round_id, data.voting_round_id
            ))),
            DataAvailability::NotOk { reason } => {
                warn!(
                    "[ftso-rewards] Data for voting round {} unavailable: {}",
                    voting_round_id, reason
                );
                Err(RewardError::unavailable(voting_round_id, reason))
            }
        }
    }

    /// Reward epoch owning a round range, checked against the provider.
    async fn epoch_for_range(
        &self,
        reward_epoch_id: RewardEpochId,
        range: &VotingRoundRange,
    ) -> RewardResult<Arc<RewardEpoch>> {
        let reward_epoch = self
            .epoch_provider
            .get_reward_epoch_for_voting_round(range.start_voting_round_id)
            .await?;
        if reward_epoch.reward_epoch_id() != reward_epoch_id {
            return Err(RewardError::critical(format!(
                "voting round {} resolves to reward epoch {}, expected {}",
                range.start_voting_round_id,
                reward_epoch.reward_epoch_id(),
                reward_epoch_id
            )));
        }
        Ok(reward_epoch)
    }

    fn check_same_epoch(data: &RoundRewardData, reward_epoch: &RewardEpoch) -> RewardResult<()> {
        if data.reward_epoch.reward_epoch_id() != reward_epoch.reward_epoch_id() {
            return Err(RewardError::critical(format!(
                "voting round {} data carries reward epoch {}, expected {}",
                data.voting_round_id,
                data.reward_epoch.reward_epoch_id(),
                reward_epoch.reward_epoch_id()
            )));
        }
        Ok(())
    }

    /// Calculate every round of an epoch, in round order.
    async fn calculate_epoch_rounds(
        &self,
        reward_epoch_id: RewardEpochId,
        merge: bool,
    ) -> RewardResult<Vec<RoundRewardOutcome>> {
        let range = self
            .epoch_provider
            .get_reward_epoch_duration_range(reward_epoch_id)
            .await?;
        let reward_epoch = self.epoch_for_range(reward_epoch_id, &range).await?;

        info!(
            "[ftso-rewards] Calculating reward epoch {} ({} rounds, {}..={})",
            reward_epoch_id,
            range.len(),
            range.start_voting_round_id,
            range.end_voting_round_id
        );

        let offers = granulated_partial_offer_map(
            range.start_voting_round_id,
            range.end_voting_round_id,
            reward_epoch.reward_offers(),
            &self.config,
        )?;

        let rounds = try_join_all(range.rounds().map(|round| self.round_data(round))).await?;
        for data in &rounds {
            Self::check_same_epoch(data, &reward_epoch)?;
        }

        // CPU-bound: settle on the blocking pool, rounds in parallel on rayon.
        let config = self.config.clone();
        let settled = tokio::task::spawn_blocking(move || {
            let no_offers = BTreeMap::new();
            rounds
                .par_iter()
                .map(|data| {
                    let round_offers = offers.get(&data.voting_round_id).unwrap_or(&no_offers);
                    calculate_round(data, round_offers, &config, merge)
                })
                .collect::<RewardResult<Vec<_>>>()
        })
        .await
        .map_err(|e| RewardError::critical(format!("round settlement task failed: {e}")))?;
        log_critical(settled)
    }
}

#[async_trait]
impl<D, E> RewardCalculationApi for RewardCalculationService<D, E>
where
    D: RewardDataProvider + 'static,
    E: RewardEpochProvider + 'static,
{
    async fn calculate_voting_round(
        &self,
        voting_round_id: VotingRoundId,
        merge: bool,
    ) -> RewardResult<RoundRewardOutcome> {
        let reward_epoch = self
            .epoch_provider
            .get_reward_epoch_for_voting_round(voting_round_id)
            .await?;
        let range = self
            .epoch_provider
            .get_reward_epoch_duration_range(reward_epoch.reward_epoch_id())
            .await?;
        if !range.contains(voting_round_id) {
            return log_critical(Err(RewardError::critical(format!(
                "voting round {} resolves to reward epoch {} spanning rounds {}..={}",
                voting_round_id,
                reward_epoch.reward_epoch_id(),
                range.start_voting_round_id,
                range.end_voting_round_id
            ))));
        }
        let data = self.round_data(voting_round_id).await?;
        Self::check_same_epoch(&data, &reward_epoch)?;

        let offers = partial_offers_for_round(
            range.start_voting_round_id,
            range.end_voting_round_id,
            voting_round_id,
            reward_epoch.reward_offers(),
            &self.config,
        )?;
        log_critical(calculate_round(&data, &offers, &self.config, merge))
    }

    async fn calculate_reward_epoch_partial(
        &self,
        reward_epoch_id: RewardEpochId,
        merge: bool,
    ) -> RewardResult<Vec<PartialRewardClaim>> {
        let outcomes = self.calculate_epoch_rounds(reward_epoch_id, merge).await?;
        if !merge {
            return Ok(outcomes
                .into_iter()
                .flat_map(|outcome| outcome.claims)
                .collect());
        }

        let mut accumulator = ClaimAccumulator::new(reward_epoch_id);
        for outcome in outcomes {
            accumulator.apply_round(outcome.voting_round_id, outcome.claims)?;
        }
        Ok(accumulator.claims())
    }

    async fn calculate_reward_epoch(
        &self,
        reward_epoch_id: RewardEpochId,
    ) -> RewardResult<Vec<RewardClaim>> {
        let outcomes = self.calculate_epoch_rounds(reward_epoch_id, true).await?;

        let mut accumulator = ClaimAccumulator::new(reward_epoch_id);
        for outcome in outcomes {
            accumulator.apply_round(outcome.voting_round_id, outcome.claims)?;
        }
        let claims = accumulator.finalize();

        info!(
            "[ftso-rewards] ✅ Reward epoch {} finalized with {} claims",
            reward_epoch_id,
            claims.len()
        );
        Ok(claims)
    }
}
