//! Domain layer: pure reward, randomness and penalty calculations.
//!
//! Nothing here performs I/O or holds shared mutable state; every function
//! takes the reward epoch and round data explicitly.

pub mod arith;
pub mod calculator;
pub mod claims;
pub mod events;
pub mod finalization;
pub mod median;
pub mod median_rewards;
pub mod offers;
pub mod penalties;
pub mod reward_epoch;
pub mod secure_random;
pub mod signing;
pub mod submissions;
pub mod voter_selector;

#[cfg(test)]
pub(crate) mod test_utils;

pub use calculator::{calculate_round, select_finalizers, RoundRewardData, RoundRewardOutcome};
pub use claims::{
    into_reward_claims, merge_claims, ClaimAccumulator, ClaimType, PartialRewardClaim, RewardClaim,
};
pub use events::*;
pub use finalization::FinalizationSubmission;
pub use median::{weighted_median, MedianCalculationResult, MedianSummary, WeightedReveal};
pub use offers::{granulated_partial_offer_map, PartialOfferMap, PartialRewardOffer};
pub use reward_epoch::{RewardEpoch, VoterWeights};
pub use secure_random::RandomResult;
pub use signing::SignatureSubmission;
pub use submissions::{
    commit_hash, decode_feed_values, encode_feed_values, CommitSubmission, DataForCalculations,
    RevealSubmission,
};
pub use voter_selector::RandomVoterSelector;
