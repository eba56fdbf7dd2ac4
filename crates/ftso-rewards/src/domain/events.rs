//! Reward epoch transition events
//!
//! Decoded on-chain events that together define one reward epoch. They are
//! consumed exactly once, by `RewardEpoch::new`.

use serde::{Deserialize, Serialize};
use shared_types::{Address, Feed, RewardEpochId, VotingRoundId, U256};

/// Emitted when a reward epoch starts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardEpochStarted {
    pub reward_epoch_id: RewardEpochId,
    pub start_voting_round_id: VotingRoundId,
    pub timestamp: u64,
}

/// Emitted when random acquisition for the next epoch's seed begins.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomAcquisitionStarted {
    pub reward_epoch_id: RewardEpochId,
    pub timestamp: u64,
}

/// Emitted when the vote power block of an epoch is fixed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotePowerBlockSelected {
    pub reward_epoch_id: RewardEpochId,
    pub vote_power_block: u64,
    pub timestamp: u64,
}

/// Emitted when the signing policy of an epoch is initialized.
///
/// `voters` are signing addresses; `weights` is parallel to `voters`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningPolicyInitialized {
    pub reward_epoch_id: RewardEpochId,
    pub start_voting_round_id: VotingRoundId,
    /// Signing weight needed for a valid finalization
    pub threshold: u16,
    pub seed: U256,
    pub voters: Vec<Address>,
    pub weights: Vec<u16>,
    pub timestamp: u64,
}

impl SigningPolicyInitialized {
    /// Sum of all signing weights.
    pub fn total_weight(&self) -> u64 {
        self.weights.iter().map(|w| u64::from(*w)).sum()
    }
}

/// Emitted when a voter registers for an epoch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterRegistered {
    pub reward_epoch_id: RewardEpochId,
    /// Identity address
    pub voter: Address,
    pub signing_policy_address: Address,
    pub submit_address: Address,
    pub delegation_address: Address,
    pub registration_weight: U256,
}

/// Additional registration data of a voter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterRegistrationInfo {
    pub reward_epoch_id: RewardEpochId,
    pub voter: Address,
    pub delegation_fee_bips: u16,
    /// Vote power used for median voting and rewarding
    pub capped_weight: U256,
}

/// Registration event together with its registration info.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullVoterRegistrationInfo {
    pub voter_registered: VoterRegistered,
    pub voter_registration_info: VoterRegistrationInfo,
}

/// Sponsor-funded reward offer for one feed in one reward epoch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardOffer {
    pub reward_epoch_id: RewardEpochId,
    pub feed: Feed,
    pub amount: U256,
    pub currency: Address,
    /// IQR and PCT shares must sum to one million
    pub iqr_share_ppm: u32,
    pub pct_share_ppm: u32,
    /// Eligibility belt around the lead providers' median
    pub reward_belt_ppm: u32,
    /// Elastic (PCT) band around the median
    pub elastic_band_width_ppm: u32,
    /// Identity addresses of trusted providers
    pub lead_providers: Vec<Address>,
    pub remainder_claimer: Address,
}

/// Inflation-funded offer spanning several feeds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InflationOffer {
    pub reward_epoch_id: RewardEpochId,
    pub feeds: Vec<Feed>,
    pub amount: U256,
    pub iqr_share_ppm: u32,
    pub pct_share_ppm: u32,
    /// Elastic band width per feed, parallel to `feeds`
    pub elastic_band_widths_ppm: Vec<u32>,
}

/// All offers of a reward epoch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardOffers {
    pub reward_offers: Vec<RewardOffer>,
    pub inflation_offers: Vec<InflationOffer>,
}

/// The fixed bundle of events a reward epoch is built from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardEpochEvents {
    pub previous_reward_epoch_started: RewardEpochStarted,
    pub random_acquisition_started: RandomAcquisitionStarted,
    pub reward_offers: RewardOffers,
    pub vote_power_block_selected: VotePowerBlockSelected,
    pub signing_policy_initialized: SigningPolicyInitialized,
    pub voter_registrations: Vec<FullVoterRegistrationInfo>,
}
