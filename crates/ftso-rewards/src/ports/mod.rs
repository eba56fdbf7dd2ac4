//! Ports of the reward calculation core.

pub mod inbound;
pub mod outbound;

pub use inbound::RewardCalculationApi;
pub use outbound::{DataAvailability, RewardDataProvider, RewardEpochProvider, VotingRoundRange};
