//! # Voting Round Reward Calculation
//!
//! Pure per-round pipeline:
//!
//! ```text
//! commits/reveals ──► DataForCalculations ──┬─► median results ──► median claims
//!                                           └─► round random
//! signing policy ──► selected finalizers ──────────────────────► finalization claims
//! signatures ──► double signers, finalized root ───────────────► signing claims, penalties
//! ```
//!
//! Either every claim of the round is produced or an error is returned;
//! nothing partial escapes.

use crate::config::RewardCalculationConfig;
use crate::domain::claims::{merge_claims, PartialRewardClaim};
use crate::domain::finalization::{
    calculate_finalization_rewards, first_successful_finalization, FinalizationSubmission,
};
use crate::domain::median::{calculate_median_results, MedianCalculationResult};
use crate::domain::median_rewards::calculate_median_rewards;
use crate::domain::offers::{split_reward_offer, PartialRewardOffer};
use crate::domain::penalties::{
    calculate_double_signing_penalties, calculate_reveal_withdrawal_penalties,
    double_signer_submitters,
};
use crate::domain::reward_epoch::RewardEpoch;
use crate::domain::secure_random::{calculate_random, RandomResult};
use crate::domain::signing::{calculate_signing_rewards, detect_double_signers, SignatureSubmission};
use crate::domain::submissions::{CommitSubmission, DataForCalculations, RevealSubmission};
use crate::domain::voter_selector::RandomVoterSelector;
use crate::error::{RewardError, RewardResult};
use shared_types::{Address, FeedId, Hash, RewardEpochId, VotingRoundId};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything observed on-chain for one voting round.
#[derive(Clone, Debug)]
pub struct RoundRewardData {
    pub voting_round_id: VotingRoundId,
    pub reward_epoch: Arc<RewardEpoch>,
    /// Chain order
    pub commits: Vec<CommitSubmission>,
    /// Chain order
    pub reveals: Vec<RevealSubmission>,
    pub signatures: Vec<SignatureSubmission>,
    /// Chain order
    pub finalizations: Vec<FinalizationSubmission>,
    /// Submission addresses benched from random generation
    pub benched: BTreeSet<Address>,
}

/// Result of one voting round's calculation.
#[derive(Clone, Debug)]
pub struct RoundRewardOutcome {
    pub voting_round_id: VotingRoundId,
    pub reward_epoch_id: RewardEpochId,
    /// Merged (canonical order) when requested, otherwise in production order
    pub claims: Vec<PartialRewardClaim>,
    pub median_results: BTreeMap<FeedId, MedianCalculationResult>,
    pub random: RandomResult,
    /// Signing addresses eligible for grace-period finalization, in selection order
    pub selected_finalizers: Vec<Address>,
    pub finalized_merkle_root: Option<Hash>,
    pub reveal_offenders: BTreeSet<Address>,
    pub double_signers: BTreeSet<Address>,
}

/// Grace-period finalizer set of a voting round.
pub fn select_finalizers(
    reward_epoch: &RewardEpoch,
    voting_round_id: VotingRoundId,
    config: &RewardCalculationConfig,
) -> RewardResult<Vec<Address>> {
    let policy = reward_epoch.signing_policy();
    let selector = RandomVoterSelector::new(
        &policy.voters,
        &policy.weights,
        config.finalization_selection_threshold_ppm,
    )?;
    let seed = RandomVoterSelector::initial_hash_seed(policy.seed, config.protocol_id, voting_round_id);
    Ok(selector.random_select_threshold_weight_voters(seed))
}

/// Calculate all claims of one voting round.
///
/// `offers` are the round's partial offers keyed by feed.
pub fn calculate_round(
    data: &RoundRewardData,
    offers: &BTreeMap<FeedId, Vec<PartialRewardOffer>>,
    config: &RewardCalculationConfig,
    merge: bool,
) -> RewardResult<RoundRewardOutcome> {
    let reward_epoch = data.reward_epoch.as_ref();
    let voting_round_id = data.voting_round_id;

    if voting_round_id < reward_epoch.start_voting_round_id() {
        return Err(RewardError::critical(format!(
            "voting round {} precedes reward epoch {} starting at round {}",
            voting_round_id,
            reward_epoch.reward_epoch_id(),
            reward_epoch.start_voting_round_id()
        )));
    }

    let submissions = DataForCalculations::from_submissions(
        reward_epoch,
        &data.commits,
        &data.reveals,
        config.epoch_settings.reveal_deadline(voting_round_id),
        data.benched.clone(),
    );
    let median_results = calculate_median_results(voting_round_id, reward_epoch, &submissions)?;
    let random = calculate_random(&submissions, config.min_secure_random_revealers);
    let selected_finalizers = select_finalizers(reward_epoch, voting_round_id, config)?;
    let selected_set: BTreeSet<Address> = selected_finalizers.iter().copied().collect();

    let finalized_merkle_root =
        first_successful_finalization(&data.finalizations, config.protocol_id, voting_round_id)
            .map(|finalization| finalization.merkle_root);
    let double_signers = detect_double_signers(&data.signatures, config.protocol_id, voting_round_id);

    let unknown_signers: BTreeSet<Address> = data
        .signatures
        .iter()
        .filter(|signature| !reward_epoch.is_eligible_signer(&signature.signer))
        .map(|signature| signature.signer)
        .collect();
    if !unknown_signers.is_empty() {
        warn!(
            voting_round_id,
            unknown_signers = unknown_signers.len(),
            "[ftso-rewards] Ignoring signatures from signers outside the signing policy"
        );
    }
    if !random.is_secure {
        warn!(
            voting_round_id,
            contributors = random.contributors.len(),
            "[ftso-rewards] Round random is not secure"
        );
    }
    let double_signing_offenders = double_signer_submitters(&double_signers, reward_epoch);

    let mut claims = Vec::new();
    for (feed_id, feed_offers) in offers {
        let median_result = median_results.get(feed_id).ok_or_else(|| {
            RewardError::critical(format!(
                "no median result for offered feed {} in voting round {}",
                feed_id, voting_round_id
            ))
        })?;

        for offer in feed_offers {
            if offer.voting_round_id != voting_round_id {
                return Err(RewardError::critical(format!(
                    "partial offer for round {} passed to round {}",
                    offer.voting_round_id, voting_round_id
                )));
            }
            let split = split_reward_offer(offer, config)?;

            claims.extend(calculate_median_rewards(&split.median, median_result, reward_epoch)?);
            claims.extend(calculate_signing_rewards(
                &split.signing,
                finalized_merkle_root.as_ref(),
                &data.signatures,
                &double_signers,
                reward_epoch,
                config,
            )?);
            claims.extend(calculate_finalization_rewards(
                &split.finalization,
                &data.finalizations,
                &selected_set,
                reward_epoch,
                config,
            )?);
            claims.extend(calculate_reveal_withdrawal_penalties(
                offer,
                &submissions.reveal_offenders,
                reward_epoch,
                config,
            )?);
            claims.extend(calculate_double_signing_penalties(
                offer,
                &double_signing_offenders,
                reward_epoch,
                config,
            )?);
        }
    }

    if merge {
        claims = merge_claims(claims)?;
    }

    info!(
        voting_round_id,
        reward_epoch_id = reward_epoch.reward_epoch_id(),
        claims = claims.len(),
        secure_random = random.is_secure,
        finalized = finalized_merkle_root.is_some(),
        "[ftso-rewards] Voting round calculated"
    );
    debug!(
        voting_round_id,
        reveal_offenders = submissions.reveal_offenders.len(),
        double_signers = double_signers.len(),
        selected_finalizers = selected_finalizers.len(),
        "[ftso-rewards] Round participation"
    );

    Ok(RoundRewardOutcome {
        voting_round_id,
        reward_epoch_id: reward_epoch.reward_epoch_id(),
        claims,
        median_results,
        random,
        selected_finalizers,
        finalized_merkle_root,
        reveal_offenders: submissions.reveal_offenders,
        double_signers,
    })
}
