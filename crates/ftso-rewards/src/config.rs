//! Reward calculation configuration
//!
//! Protocol constants that every node must agree on. Defaults match the
//! production price-oracle deployment; `from_env` allows overriding them for
//! test networks.

use shared_types::{Address, ProtocolId, VotingRoundId, ZERO_ADDRESS};
use std::env;
use thiserror::Error;

/// Parts-per-million denominator used by every fractional parameter.
pub const TOTAL_PPM: u32 = 1_000_000;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("signing share {signing} + finalization share {finalization} exceeds 1000000 ppm")]
    SharesExceedTotal { signing: u32, finalization: u32 },

    #[error("finalization selection threshold {0} exceeds 1000000 ppm")]
    ThresholdOutOfRange(u32),

    #[error("voting epoch duration must be non-zero")]
    ZeroEpochDuration,

    #[error("deadlines out of order: reveal {reveal}s, grace period {grace}s, signing {signing}s")]
    DeadlinesOutOfOrder { reveal: u64, grace: u64, signing: u64 },

    #[error("minimum secure random revealers must be at least 1")]
    ZeroMinRevealers,
}

/// Voting round timing.
///
/// Round `N` commits during `[start(N), start(N+1))`; its reveal, signing and
/// finalization phases are offsets from `start(N+1)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EpochSettings {
    /// Unix timestamp at which voting round 0 starts
    pub first_voting_round_start_ts: u64,
    /// Duration of one voting round in seconds
    pub voting_epoch_duration_secs: u64,
    /// Reveals must land within this offset
    pub reveal_deadline_secs: u64,
    /// Signatures after this offset earn no signing reward
    pub signing_deadline_secs: u64,
    /// Finalizations up to this offset fall in the grace period
    pub finalization_grace_period_secs: u64,
}

impl Default for EpochSettings {
    fn default() -> Self {
        Self {
            first_voting_round_start_ts: 1_658_430_000,
            voting_epoch_duration_secs: 90,
            reveal_deadline_secs: 45,
            signing_deadline_secs: 90,
            finalization_grace_period_secs: 65,
        }
    }
}

impl EpochSettings {
    /// Start timestamp of a voting round.
    pub fn voting_round_start(&self, voting_round_id: VotingRoundId) -> u64 {
        self.round_start(u64::from(voting_round_id))
    }

    /// Deadline for reveals of a voting round.
    pub fn reveal_deadline(&self, voting_round_id: VotingRoundId) -> u64 {
        self.reveal_phase_start(voting_round_id)
            .saturating_add(self.reveal_deadline_secs)
    }

    /// Deadline for reward-eligible signatures of a voting round.
    pub fn signing_deadline(&self, voting_round_id: VotingRoundId) -> u64 {
        self.reveal_phase_start(voting_round_id)
            .saturating_add(self.signing_deadline_secs)
    }

    /// End of the finalization grace period of a voting round.
    pub fn finalization_grace_deadline(&self, voting_round_id: VotingRoundId) -> u64 {
        self.reveal_phase_start(voting_round_id)
            .saturating_add(self.finalization_grace_period_secs)
    }

    /// Round `N` reveals while round `N + 1` commits.
    fn reveal_phase_start(&self, voting_round_id: VotingRoundId) -> u64 {
        self.round_start(u64::from(voting_round_id) + 1)
    }

    fn round_start(&self, round: u64) -> u64 {
        round
            .saturating_mul(self.voting_epoch_duration_secs)
            .saturating_add(self.first_voting_round_start_ts)
    }
}

/// Reward calculation configuration
#[derive(Clone, Debug)]
pub struct RewardCalculationConfig {
    /// Protocol id the price oracle signs under
    pub protocol_id: ProtocolId,
    /// Cumulative signing weight the grace-period finalizer set must reach
    pub finalization_selection_threshold_ppm: u32,
    /// Share of every partial offer paid for signatures
    pub signing_share_ppm: u32,
    /// Share of every partial offer paid for finalization
    pub finalization_share_ppm: u32,
    /// Multiplier applied to weight-proportional penalties
    pub penalty_factor: u32,
    /// Rounds a reveal offender stays benched from random generation
    pub benching_window: u32,
    /// Distinct non-benched revealers needed for a secure random
    pub min_secure_random_revealers: usize,
    /// Currency of inflation-funded offers
    pub inflation_currency: Address,
    /// Remainder claimer of inflation-funded offers
    pub burn_address: Address,
    /// Voting round timing
    pub epoch_settings: EpochSettings,
}

impl Default for RewardCalculationConfig {
    fn default() -> Self {
        Self {
            protocol_id: 100,
            finalization_selection_threshold_ppm: 50_000,
            signing_share_ppm: 100_000,
            finalization_share_ppm: 100_000,
            penalty_factor: 30,
            benching_window: 20,
            min_secure_random_revealers: 2,
            inflation_currency: ZERO_ADDRESS,
            burn_address: [0xDE; 20],
            epoch_settings: EpochSettings::default(),
        }
    }
}

impl RewardCalculationConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `FTSO_PROTOCOL_ID`
    /// - `FTSO_FINALIZATION_THRESHOLD_PPM`
    /// - `FTSO_SIGNING_SHARE_PPM`, `FTSO_FINALIZATION_SHARE_PPM`
    /// - `FTSO_PENALTY_FACTOR`
    /// - `FTSO_BENCHING_WINDOW`
    /// - `FTSO_FIRST_ROUND_START_TS`, `FTSO_ROUND_DURATION_SECS`
    ///
    /// Missing or unparsable values fall back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let epoch_defaults = defaults.epoch_settings.clone();

        Self {
            protocol_id: env_or("FTSO_PROTOCOL_ID", defaults.protocol_id),
            finalization_selection_threshold_ppm: env_or(
                "FTSO_FINALIZATION_THRESHOLD_PPM",
                defaults.finalization_selection_threshold_ppm,
            ),
            signing_share_ppm: env_or("FTSO_SIGNING_SHARE_PPM", defaults.signing_share_ppm),
            finalization_share_ppm: env_or(
                "FTSO_FINALIZATION_SHARE_PPM",
                defaults.finalization_share_ppm,
            ),
            penalty_factor: env_or("FTSO_PENALTY_FACTOR", defaults.penalty_factor),
            benching_window: env_or("FTSO_BENCHING_WINDOW", defaults.benching_window),
            epoch_settings: EpochSettings {
                first_voting_round_start_ts: env_or(
                    "FTSO_FIRST_ROUND_START_TS",
                    epoch_defaults.first_voting_round_start_ts,
                ),
                voting_epoch_duration_secs: env_or(
                    "FTSO_ROUND_DURATION_SECS",
                    epoch_defaults.voting_epoch_duration_secs,
                ),
                ..epoch_defaults
            },
            ..defaults
        }
    }

    /// Validate internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if u64::from(self.signing_share_ppm) + u64::from(self.finalization_share_ppm)
            > u64::from(TOTAL_PPM)
        {
            return Err(ConfigError::SharesExceedTotal {
                signing: self.signing_share_ppm,
                finalization: self.finalization_share_ppm,
            });
        }
        if self.finalization_selection_threshold_ppm > TOTAL_PPM {
            return Err(ConfigError::ThresholdOutOfRange(
                self.finalization_selection_threshold_ppm,
            ));
        }
        if self.min_secure_random_revealers == 0 {
            return Err(ConfigError::ZeroMinRevealers);
        }

        let settings = &self.epoch_settings;
        if settings.voting_epoch_duration_secs == 0 {
            return Err(ConfigError::ZeroEpochDuration);
        }
        if settings.reveal_deadline_secs > settings.finalization_grace_period_secs
            || settings.finalization_grace_period_secs > settings.signing_deadline_secs
        {
            return Err(ConfigError::DeadlinesOutOfOrder {
                reveal: settings.reveal_deadline_secs,
                grace: settings.finalization_grace_period_secs,
                signing: settings.signing_deadline_secs,
            });
        }
        Ok(())
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
