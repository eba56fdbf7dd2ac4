//! Error types for the reward settlement core
//!
//! Three failure classes:
//! - `ConsistencyViolation`: the reward epoch's source events disagree with each other
//! - `DataUnavailable`: a single voting round cannot be calculated yet
//! - `CriticalInvariant`: a programming or data-integrity bug

use crate::config::ConfigError;
use shared_types::{address_hex, Address, FeedId, RewardEpochId, VotingRoundId};
use thiserror::Error;

/// Which reward-epoch consistency check failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyViolation {
    #[error("previous reward epoch id is {actual}, expected {expected}")]
    PreviousEpochMismatch {
        expected: RewardEpochId,
        actual: RewardEpochId,
    },

    #[error("random acquisition reward epoch id is {actual}, expected {expected}")]
    RandomAcquisitionMismatch {
        expected: RewardEpochId,
        actual: RewardEpochId,
    },

    #[error("reward offer reward epoch id is {actual}, expected {expected}")]
    RewardOfferMismatch {
        expected: RewardEpochId,
        actual: RewardEpochId,
    },

    #[error("inflation offer reward epoch id is {actual}, expected {expected}")]
    InflationOfferMismatch {
        expected: RewardEpochId,
        actual: RewardEpochId,
    },

    #[error("vote power block reward epoch id is {actual}, expected {expected}")]
    VotePowerBlockMismatch {
        expected: RewardEpochId,
        actual: RewardEpochId,
    },

    #[error("voter registration reward epoch id is {actual}, expected {expected}")]
    VoterRegisteredMismatch {
        expected: RewardEpochId,
        actual: RewardEpochId,
    },

    #[error("voter registration info reward epoch id is {actual}, expected {expected}")]
    RegistrationInfoMismatch {
        expected: RewardEpochId,
        actual: RewardEpochId,
    },

    #[error("signing policy voter {} has no registration", address_hex(.signing_address))]
    UnregisteredSigner { signing_address: Address },

    #[error("signing policy has {voters} voters but {weights} weights")]
    SigningPolicyShape { voters: usize, weights: usize },

    #[error("offer for feed {feed} has IQR share {iqr} + PCT share {pct} != 1000000 ppm")]
    InvalidOfferShares { feed: FeedId, iqr: u32, pct: u32 },

    #[error("inflation offer lists {feeds} feeds but {band_widths} band widths")]
    InflationOfferShape { feeds: usize, band_widths: usize },

    #[error("feed {feed} is offered with conflicting decimals")]
    ConflictingFeedDecimals { feed: FeedId },
}

/// Reward calculation errors
#[derive(Debug, Error)]
pub enum RewardError {
    /// Reward epoch source events are internally inconsistent. Fatal.
    #[error("Consistency violation: {0}")]
    ConsistencyViolation(#[from] ConsistencyViolation),

    /// Source data for the voting round is not (yet) available.
    #[error("Data unavailable for voting round {voting_round_id}: {reason}")]
    DataUnavailable {
        voting_round_id: VotingRoundId,
        reason: String,
    },

    /// Reward epoch boundaries are not known yet.
    #[error("Reward epoch {reward_epoch_id} unavailable: {reason}")]
    RewardEpochUnavailable {
        reward_epoch_id: RewardEpochId,
        reason: String,
    },

    /// Internal invariant broken; never skipped silently.
    #[error("Critical invariant broken: {reason}")]
    CriticalInvariant { reason: String },

    /// Round results applied to an accumulator out of order.
    #[error("Voting round out of order: expected {expected}, got {actual}")]
    RoundOutOfOrder {
        expected: VotingRoundId,
        actual: VotingRoundId,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

impl RewardError {
    pub fn critical(reason: impl Into<String>) -> Self {
        Self::CriticalInvariant {
            reason: reason.into(),
        }
    }

    pub fn unavailable(voting_round_id: VotingRoundId, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            voting_round_id,
            reason: reason.into(),
        }
    }

    /// Whether retrying later can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::DataUnavailable { .. } | Self::RewardEpochUnavailable { .. }
        )
    }
}

/// Result type for reward operations
pub type RewardResult<T> = Result<T, RewardError>;
