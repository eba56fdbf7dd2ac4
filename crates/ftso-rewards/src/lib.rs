//! # ftso-rewards
//!
//! Reward, randomness and penalty settlement core of the price oracle.
//!
//! ## Overview
//!
//! Every node must derive bit-identical results from identical on-chain
//! input. This crate provides:
//! - **Reward epochs**: validated voter registry built from epoch events
//! - **Weighted median**: per-feed median and quartiles of revealed prices
//! - **Voter selection**: keccak-seeded weighted sampling without replacement
//! - **Secure random**: round random with a minimum-participation flag
//! - **Claims**: median, signing and finalization rewards plus penalties,
//!   merged into Merkle-ready epoch claims
//!
//! ## Architecture
//!
//! ```text
//! RewardEpochProvider ──Arc<RewardEpoch>──┐
//!                                         ├──► calculate_round ──► ClaimAccumulator ──► Vec<RewardClaim>
//! RewardDataProvider ──RoundRewardData────┘        (per round)        (round order)
//! ```
//!
//! ## Errors
//!
//! | Error | Scope | Retry |
//! |-------|-------|-------|
//! | `ConsistencyViolation` | reward epoch construction | never |
//! | `DataUnavailable` | one voting round | later |
//! | `CriticalInvariant` | calculation bug | never |
//!
//! ## Example
//!
//! ```rust,ignore
//! use ftso_rewards::{RewardCalculationConfig, RewardCalculationService};
//! use ftso_rewards::ports::inbound::RewardCalculationApi;
//!
//! let service = RewardCalculationService::new(
//!     RewardCalculationConfig::from_env(),
//!     data_provider,
//!     epoch_provider,
//! )?;
//!
//! let round = service.calculate_voting_round(voting_round_id, true).await?;
//! let claims = service.calculate_reward_epoch(reward_epoch_id).await?;
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use config::{EpochSettings, RewardCalculationConfig, TOTAL_PPM};
pub use domain::{
    ClaimAccumulator, ClaimType, MedianCalculationResult, PartialRewardClaim, RandomResult,
    RandomVoterSelector, RewardClaim, RewardEpoch, RoundRewardData, RoundRewardOutcome,
};
pub use error::{ConsistencyViolation, RewardError, RewardResult};
pub use service::RewardCalculationService;
