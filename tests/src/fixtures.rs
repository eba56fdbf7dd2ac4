//! # Scenario Fixtures
//!
//! Builds a reward epoch, in-memory providers and a calculation service, and
//! produces per-round submissions the way an indexer would record them.
//!
//! Reward epoch 1 covers voting rounds `10..=19`; epoch 2 starts at round 20
//! so that epoch 1's range is known.

use ftso_rewards::adapters::{InMemoryRewardDataProvider, InMemoryRewardEpochProvider, RoundSubmissions};
use ftso_rewards::domain::{
    commit_hash, encode_feed_values, CommitSubmission, FinalizationSubmission,
    FullVoterRegistrationInfo, RandomAcquisitionStarted, RevealSubmission, RewardEpochEvents,
    RewardEpochStarted, RewardOffer, RewardOffers, SignatureSubmission, SigningPolicyInitialized,
    VotePowerBlockSelected, VoterRegistered, VoterRegistrationInfo,
};
use ftso_rewards::{RewardCalculationConfig, RewardCalculationService};
use ftso_telemetry::{init_logging, TelemetryConfig};
use shared_types::{Address, Feed, FeedId, Hash, RewardEpochId, VotingRoundId, U256};
use std::sync::{Arc, Once};

pub const EPOCH: RewardEpochId = 1;
pub const FIRST_ROUND: VotingRoundId = 10;
pub const ROUNDS_PER_EPOCH: u32 = 10;
pub const LAST_ROUND: VotingRoundId = FIRST_ROUND + ROUNDS_PER_EPOCH - 1;

pub const CURRENCY: Address = [0xC0; 20];
pub const REMAINDER_CLAIMER: Address = [0xAB; 20];

pub type DataProvider = InMemoryRewardDataProvider<InMemoryRewardEpochProvider>;
pub type Service = RewardCalculationService<DataProvider, InMemoryRewardEpochProvider>;

static LOGGING: Once = Once::new();

/// Install the test subscriber once per process.
pub fn init_test_logging() {
    LOGGING.call_once(|| {
        let _ = init_logging(&TelemetryConfig::for_tests());
    });
}

fn address(role: u8, i: u8) -> Address {
    let mut address = [role; 20];
    address[19] = i;
    address
}

pub fn identity(i: u8) -> Address {
    address(0x10, i)
}

pub fn signing(i: u8) -> Address {
    address(0x20, i)
}

pub fn submit(i: u8) -> Address {
    address(0x30, i)
}

pub fn delegation(i: u8) -> Address {
    address(0x40, i)
}

pub fn feed(base: &str) -> Feed {
    Feed::new(FeedId::from_symbols(base, "USD"), 5)
}

/// A merkle root distinct per tag.
pub fn root(tag: u8) -> Hash {
    [tag; 32]
}

#[derive(Clone, Copy, Debug)]
pub struct VoterSpec {
    pub capped_weight: u64,
    pub signing_weight: u16,
}

pub struct ScenarioBuilder {
    voters: Vec<VoterSpec>,
    offers: Vec<RewardOffer>,
    config: RewardCalculationConfig,
}

impl ScenarioBuilder {
    /// `count` voters of capped weight 1000 and signing weight 100.
    pub fn new(count: u8) -> Self {
        Self {
            voters: vec![
                VoterSpec {
                    capped_weight: 1_000,
                    signing_weight: 100,
                };
                count as usize
            ],
            offers: Vec::new(),
            config: RewardCalculationConfig::default(),
        }
    }

    pub fn with_voter_weights(mut self, weights: &[(u64, u16)]) -> Self {
        self.voters = weights
            .iter()
            .map(|(capped_weight, signing_weight)| VoterSpec {
                capped_weight: *capped_weight,
                signing_weight: *signing_weight,
            })
            .collect();
        self
    }

    /// Offer `amount` for the whole epoch, i.e. `amount / 10` per round.
    pub fn with_offer(mut self, feed: Feed, amount: u64, iqr_share_ppm: u32) -> Self {
        self.offers.push(RewardOffer {
            reward_epoch_id: EPOCH,
            feed,
            amount: U256::from(amount),
            currency: CURRENCY,
            iqr_share_ppm,
            pct_share_ppm: 1_000_000 - iqr_share_ppm,
            reward_belt_ppm: 0,
            elastic_band_width_ppm: 2_000,
            lead_providers: Vec::new(),
            remainder_claimer: REMAINDER_CLAIMER,
        });
        self
    }

    pub fn with_config(mut self, config: RewardCalculationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn events(&self, reward_epoch_id: RewardEpochId) -> RewardEpochEvents {
        let start_voting_round_id = FIRST_ROUND + (reward_epoch_id - EPOCH) * ROUNDS_PER_EPOCH;
        let offers = if reward_epoch_id == EPOCH {
            self.offers.clone()
        } else {
            Vec::new()
        };
        let count = self.voters.len() as u8;

        RewardEpochEvents {
            previous_reward_epoch_started: RewardEpochStarted {
                reward_epoch_id: reward_epoch_id - 1,
                start_voting_round_id: start_voting_round_id.saturating_sub(ROUNDS_PER_EPOCH),
                timestamp: 0,
            },
            random_acquisition_started: RandomAcquisitionStarted {
                reward_epoch_id,
                timestamp: 0,
            },
            reward_offers: RewardOffers {
                reward_offers: offers,
                inflation_offers: Vec::new(),
            },
            vote_power_block_selected: VotePowerBlockSelected {
                reward_epoch_id,
                vote_power_block: 10_000 + u64::from(reward_epoch_id),
                timestamp: 0,
            },
            signing_policy_initialized: SigningPolicyInitialized {
                reward_epoch_id,
                start_voting_round_id,
                threshold: 0,
                seed: U256::from(0xF750_u64 + u64::from(reward_epoch_id)),
                voters: (0..count).map(signing).collect(),
                weights: self.voters.iter().map(|v| v.signing_weight).collect(),
                timestamp: 0,
            },
            voter_registrations: self
                .voters
                .iter()
                .enumerate()
                .map(|(i, spec)| registration(reward_epoch_id, i as u8, spec.capped_weight))
                .collect(),
        }
    }

    pub fn build(self) -> Scenario {
        init_test_logging();

        let epochs = Arc::new(InMemoryRewardEpochProvider::new());
        epochs
            .insert_epoch_events(self.events(EPOCH))
            .expect("epoch 1 events are consistent");
        epochs
            .insert_epoch_events(self.events(EPOCH + 1))
            .expect("epoch 2 events are consistent");

        let data = Arc::new(InMemoryRewardDataProvider::new(
            Arc::clone(&epochs),
            self.config.epoch_settings.clone(),
        ));
        let service = RewardCalculationService::new(
            self.config.clone(),
            Arc::clone(&data),
            Arc::clone(&epochs),
        )
        .expect("valid config");

        Scenario {
            config: self.config,
            voter_count: self.voters.len() as u8,
            epochs,
            data,
            service,
        }
    }
}

pub fn registration(
    reward_epoch_id: RewardEpochId,
    i: u8,
    capped_weight: u64,
) -> FullVoterRegistrationInfo {
    FullVoterRegistrationInfo {
        voter_registered: VoterRegistered {
            reward_epoch_id,
            voter: identity(i),
            signing_policy_address: signing(i),
            submit_address: submit(i),
            delegation_address: delegation(i),
            registration_weight: U256::from(capped_weight),
        },
        voter_registration_info: VoterRegistrationInfo {
            reward_epoch_id,
            voter: identity(i),
            delegation_fee_bips: 1_000,
            capped_weight: U256::from(capped_weight),
        },
    }
}

pub struct Scenario {
    pub config: RewardCalculationConfig,
    pub voter_count: u8,
    pub epochs: Arc<InMemoryRewardEpochProvider>,
    pub data: Arc<DataProvider>,
    pub service: Service,
}

impl Scenario {
    pub fn round(&self, voting_round_id: VotingRoundId) -> RoundBuilder {
        RoundBuilder {
            voting_round_id,
            config: self.config.clone(),
            submissions: RoundSubmissions::default(),
        }
    }

    /// Every voter reveals `price` for each feed, signs `root(1)` and voter 0
    /// finalizes after the grace period.
    pub fn honest_round(&self, voting_round_id: VotingRoundId, prices: &[Option<u32>]) -> RoundSubmissions {
        let mut round = self.round(voting_round_id);
        for i in 0..self.voter_count {
            round = round.reveal(i, prices).sign(i, root(1), 20);
        }
        round.finalize(0, 80).finish()
    }

    pub fn store(&self, voting_round_id: VotingRoundId, submissions: RoundSubmissions) {
        self.data.insert_round(voting_round_id, submissions);
    }
}

/// Records one round's submissions in chain order.
pub struct RoundBuilder {
    voting_round_id: VotingRoundId,
    config: RewardCalculationConfig,
    submissions: RoundSubmissions,
}

impl RoundBuilder {
    fn payload(i: u8, values: &[Option<u32>]) -> (Hash, Vec<u8>) {
        let mut random = [0u8; 32];
        random[0] = i;
        random[31] = 0x5A;
        (random, encode_feed_values(values))
    }

    /// Matching commit and a reveal inside the reveal phase.
    pub fn reveal(self, i: u8, values: &[Option<u32>]) -> Self {
        self.reveal_at(i, values, 10)
    }

    /// Matching commit and a reveal `offset_secs` after the reveal phase starts.
    pub fn reveal_at(mut self, i: u8, values: &[Option<u32>], offset_secs: u64) -> Self {
        let (random, encoded_values) = Self::payload(i, values);
        let timestamp = self.phase_start() + offset_secs;
        self.submissions.commits.push(CommitSubmission {
            submit_address: submit(i),
            commit_hash: commit_hash(&submit(i), &random, &encoded_values),
        });
        self.submissions.reveals.push(RevealSubmission {
            submit_address: submit(i),
            random,
            encoded_values,
            timestamp,
        });
        self
    }

    /// Commit without a reveal.
    pub fn commit_only(mut self, i: u8, values: &[Option<u32>]) -> Self {
        let (random, encoded_values) = Self::payload(i, values);
        self.submissions.commits.push(CommitSubmission {
            submit_address: submit(i),
            commit_hash: commit_hash(&submit(i), &random, &encoded_values),
        });
        self
    }

    /// Valid signature `offset_secs` after the round's reveal phase starts.
    pub fn sign(mut self, i: u8, merkle_root: Hash, offset_secs: u64) -> Self {
        self.submissions.signatures.push(SignatureSubmission {
            signer: signing(i),
            protocol_id: self.config.protocol_id,
            voting_round_id: self.voting_round_id,
            merkle_root,
            timestamp: self.phase_start() + offset_secs,
            valid: true,
        });
        self
    }

    /// Successful finalization of `root(1)` by voter `i`.
    pub fn finalize(self, i: u8, offset_secs: u64) -> Self {
        self.finalize_by(signing(i), offset_secs)
    }

    pub fn finalize_by(mut self, submitter: Address, offset_secs: u64) -> Self {
        self.submissions.finalizations.push(FinalizationSubmission {
            submitter,
            protocol_id: self.config.protocol_id,
            voting_round_id: self.voting_round_id,
            merkle_root: root(1),
            timestamp: self.phase_start() + offset_secs,
            successful: true,
        });
        self
    }

    fn phase_start(&self) -> u64 {
        self.config
            .epoch_settings
            .voting_round_start(self.voting_round_id + 1)
    }

    pub fn finish(self) -> RoundSubmissions {
        self.submissions
    }
}

/// Sum of claim amounts matching a predicate.
pub fn sum_where<T>(claims: &[T], amount: impl Fn(&T) -> Option<U256>) -> U256 {
    claims
        .iter()
        .filter_map(amount)
        .fold(U256::zero(), |acc, value| acc + value)
}
