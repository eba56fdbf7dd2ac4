//! Reward epoch voter registry
//!
//! A `RewardEpoch` is the immutable per-epoch view of the voter set: who may
//! submit, who may sign, which weights they carry and which feeds are
//! offered. It is built once from the epoch-transition events and shared by
//! every voting-round calculation of the epoch.
//!
//! Each voter is keyed by an identity address that owns exactly one signing,
//! one submission and one delegation address for the whole epoch.

use crate::config::TOTAL_PPM;
use crate::domain::events::{
    FullVoterRegistrationInfo, RewardEpochEvents, RewardOffers, SigningPolicyInitialized,
};
use crate::error::{ConsistencyViolation, RewardError, RewardResult};
use shared_types::{address_hex, Address, Feed, FeedId, RewardEpochId, VotingRoundId, U256};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, error};

/// Registry entry of a signing-policy voter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoterWeights {
    pub identity_address: Address,
    pub signing_address: Address,
    pub submit_address: Address,
    pub delegation_address: Address,
    pub capped_weight: U256,
    pub signing_weight: u16,
}

/// Immutable voter registry of one reward epoch.
#[derive(Clone, Debug)]
pub struct RewardEpoch {
    signing_policy: SigningPolicyInitialized,
    reward_offers: RewardOffers,
    canonical_feed_order: Vec<Feed>,
    /// Signing-policy voters in policy order
    voters: Vec<VoterWeights>,
    total_capped_weight: U256,

    identity_to_registration: HashMap<Address, FullVoterRegistrationInfo>,
    signing_to_index: HashMap<Address, usize>,
    submission_to_index: HashMap<Address, usize>,
    delegation_to_capped_weight: HashMap<Address, U256>,
}

impl RewardEpoch {
    /// Build and validate a reward epoch from its transition events.
    ///
    /// Fails with a `ConsistencyViolation` naming the first check that does
    /// not hold; nothing is constructed in that case.
    pub fn new(events: RewardEpochEvents) -> RewardResult<Self> {
        check_consistency(&events).map_err(|violation| {
            error!(
                "[ftso-rewards] Reward epoch {} rejected: {}",
                events.signing_policy_initialized.reward_epoch_id, violation
            );
            RewardError::ConsistencyViolation(violation)
        })?;

        let RewardEpochEvents {
            reward_offers,
            signing_policy_initialized: signing_policy,
            voter_registrations,
            ..
        } = events;

        let canonical_feed_order = canonical_feed_order(&reward_offers)?;

        let mut identity_to_registration = HashMap::with_capacity(voter_registrations.len());
        let mut signing_to_identity = HashMap::with_capacity(voter_registrations.len());
        for registration in voter_registrations {
            let registered = &registration.voter_registered;
            signing_to_identity.insert(registered.signing_policy_address, registered.voter);
            identity_to_registration.insert(registered.voter, registration);
        }

        let mut voters = Vec::with_capacity(signing_policy.voters.len());
        let mut signing_to_index = HashMap::new();
        let mut submission_to_index = HashMap::new();
        let mut delegation_to_capped_weight = HashMap::new();
        let mut total_capped_weight = U256::zero();

        for (index, (signing_address, signing_weight)) in signing_policy
            .voters
            .iter()
            .zip(signing_policy.weights.iter())
            .enumerate()
        {
            let registration = signing_to_identity
                .get(signing_address)
                .and_then(|identity| identity_to_registration.get(identity))
                .ok_or_else(|| {
                    let violation = ConsistencyViolation::UnregisteredSigner {
                        signing_address: *signing_address,
                    };
                    error!("[ftso-rewards] {}", violation);
                    RewardError::ConsistencyViolation(violation)
                })?;

            let registered = &registration.voter_registered;
            let capped_weight = registration.voter_registration_info.capped_weight;

            signing_to_index.insert(*signing_address, index);
            submission_to_index.insert(registered.submit_address, index);
            delegation_to_capped_weight.insert(registered.delegation_address, capped_weight);
            total_capped_weight = total_capped_weight
                .checked_add(capped_weight)
                .ok_or_else(|| RewardError::critical("total capped weight overflows U256"))?;

            voters.push(VoterWeights {
                identity_address: registered.voter,
                signing_address: *signing_address,
                submit_address: registered.submit_address,
                delegation_address: registered.delegation_address,
                capped_weight,
                signing_weight: *signing_weight,
            });
        }

        debug!(
            reward_epoch_id = signing_policy.reward_epoch_id,
            voters = voters.len(),
            feeds = canonical_feed_order.len(),
            "[ftso-rewards] Reward epoch constructed"
        );

        Ok(Self {
            signing_policy,
            reward_offers,
            canonical_feed_order,
            voters,
            total_capped_weight,
            identity_to_registration,
            signing_to_index,
            submission_to_index,
            delegation_to_capped_weight,
        })
    }

    pub fn reward_epoch_id(&self) -> RewardEpochId {
        self.signing_policy.reward_epoch_id
    }

    pub fn start_voting_round_id(&self) -> VotingRoundId {
        self.signing_policy.start_voting_round_id
    }

    pub fn signing_policy(&self) -> &SigningPolicyInitialized {
        &self.signing_policy
    }

    pub fn reward_offers(&self) -> &RewardOffers {
        &self.reward_offers
    }

    /// Feeds in the order reveal payloads encode them.
    pub fn canonical_feed_order(&self) -> &[Feed] {
        &self.canonical_feed_order
    }

    /// Position of a feed in the canonical order.
    pub fn feed_index(&self, feed: &FeedId) -> Option<usize> {
        self.canonical_feed_order
            .binary_search_by(|candidate| candidate.id.cmp(feed))
            .ok()
    }

    /// Signing-policy voters in policy order.
    pub fn voters(&self) -> &[VoterWeights] {
        &self.voters
    }

    /// Sum of capped weights of all signing-policy voters.
    pub fn total_capped_weight(&self) -> U256 {
        self.total_capped_weight
    }

    pub fn is_eligible_submission_address(&self, submit_address: &Address) -> bool {
        self.submission_to_index.contains_key(submit_address)
    }

    pub fn is_eligible_signer(&self, signing_address: &Address) -> bool {
        self.signing_to_index.contains_key(signing_address)
    }

    pub fn voter_by_submission(&self, submit_address: &Address) -> Option<&VoterWeights> {
        self.submission_to_index
            .get(submit_address)
            .map(|index| &self.voters[*index])
    }

    pub fn voter_by_signing(&self, signing_address: &Address) -> Option<&VoterWeights> {
        self.signing_to_index
            .get(signing_address)
            .map(|index| &self.voters[*index])
    }

    /// Capped weight used for median voting and rewarding.
    pub fn capped_weight_for_submission(&self, submit_address: &Address) -> RewardResult<U256> {
        self.voter_by_submission(submit_address)
            .map(|voter| voter.capped_weight)
            .ok_or_else(|| {
                RewardError::critical(format!(
                    "submission address {} is not registered in reward epoch {}",
                    address_hex(submit_address),
                    self.reward_epoch_id()
                ))
            })
    }

    pub fn capped_weight_for_delegation(&self, delegation_address: &Address) -> Option<U256> {
        self.delegation_to_capped_weight.get(delegation_address).copied()
    }

    /// Registration of any registered voter, including ones outside the signing policy.
    pub fn registration(&self, identity: &Address) -> Option<&FullVoterRegistrationInfo> {
        self.identity_to_registration.get(identity)
    }

    pub fn identity_for_signing(&self, signing_address: &Address) -> Option<Address> {
        self.voter_by_signing(signing_address)
            .map(|voter| voter.identity_address)
    }

    pub fn identity_for_submission(&self, submit_address: &Address) -> Option<Address> {
        self.voter_by_submission(submit_address)
            .map(|voter| voter.identity_address)
    }

    pub fn submission_for_signing(&self, signing_address: &Address) -> Option<Address> {
        self.voter_by_signing(signing_address)
            .map(|voter| voter.submit_address)
    }
}

fn check_consistency(events: &RewardEpochEvents) -> Result<(), ConsistencyViolation> {
    let policy = &events.signing_policy_initialized;
    let expected = policy.reward_epoch_id;

    let previous = events.previous_reward_epoch_started.reward_epoch_id;
    if previous.checked_add(1) != Some(expected) {
        return Err(ConsistencyViolation::PreviousEpochMismatch {
            expected: expected.saturating_sub(1),
            actual: previous,
        });
    }

    let random = events.random_acquisition_started.reward_epoch_id;
    if random != expected {
        return Err(ConsistencyViolation::RandomAcquisitionMismatch {
            expected,
            actual: random,
        });
    }

    for offer in &events.reward_offers.reward_offers {
        if offer.reward_epoch_id != expected {
            return Err(ConsistencyViolation::RewardOfferMismatch {
                expected,
                actual: offer.reward_epoch_id,
            });
        }
        check_shares(offer.feed.id, offer.iqr_share_ppm, offer.pct_share_ppm)?;
    }

    for offer in &events.reward_offers.inflation_offers {
        if offer.reward_epoch_id != expected {
            return Err(ConsistencyViolation::InflationOfferMismatch {
                expected,
                actual: offer.reward_epoch_id,
            });
        }
        if offer.feeds.len() != offer.elastic_band_widths_ppm.len() {
            return Err(ConsistencyViolation::InflationOfferShape {
                feeds: offer.feeds.len(),
                band_widths: offer.elastic_band_widths_ppm.len(),
            });
        }
        if let Some(feed) = offer.feeds.first() {
            check_shares(feed.id, offer.iqr_share_ppm, offer.pct_share_ppm)?;
        }
    }

    let vote_power = events.vote_power_block_selected.reward_epoch_id;
    if vote_power != expected {
        return Err(ConsistencyViolation::VotePowerBlockMismatch {
            expected,
            actual: vote_power,
        });
    }

    for registration in &events.voter_registrations {
        let registered = registration.voter_registered.reward_epoch_id;
        if registered != expected {
            return Err(ConsistencyViolation::VoterRegisteredMismatch {
                expected,
                actual: registered,
            });
        }
        let info = registration.voter_registration_info.reward_epoch_id;
        if info != expected {
            return Err(ConsistencyViolation::RegistrationInfoMismatch {
                expected,
                actual: info,
            });
        }
    }

    if policy.voters.len() != policy.weights.len() {
        return Err(ConsistencyViolation::SigningPolicyShape {
            voters: policy.voters.len(),
            weights: policy.weights.len(),
        });
    }

    Ok(())
}

fn check_shares(feed: FeedId, iqr: u32, pct: u32) -> Result<(), ConsistencyViolation> {
    if u64::from(iqr) + u64::from(pct) != u64::from(TOTAL_PPM) {
        return Err(ConsistencyViolation::InvalidOfferShares { feed, iqr, pct });
    }
    Ok(())
}

/// Union of all offered feeds, deduplicated and sorted by feed id.
///
/// Reveal payloads position values by index in this sequence, so the order
/// must not depend on the order offers arrived in.
pub fn canonical_feed_order(offers: &RewardOffers) -> RewardResult<Vec<Feed>> {
    let mut feeds: BTreeMap<FeedId, Feed> = BTreeMap::new();
    let all = offers
        .reward_offers
        .iter()
        .map(|offer| &offer.feed)
        .chain(offers.inflation_offers.iter().flat_map(|offer| offer.feeds.iter()));

    for feed in all {
        match feeds.get(&feed.id) {
            Some(existing) if existing.decimals != feed.decimals => {
                return Err(ConsistencyViolation::ConflictingFeedDecimals { feed: feed.id }.into());
            }
            Some(_) => {}
            None => {
                feeds.insert(feed.id, *feed);
            }
        }
    }

    Ok(feeds.into_values().collect())
}
