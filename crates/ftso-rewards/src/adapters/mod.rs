//! # Adapters Layer (Hexagonal Architecture)
//!
//! In-memory implementations of the outbound ports, fed by an indexer or by
//! tests.

mod data_provider;
mod epoch_provider;

pub use data_provider::{InMemoryRewardDataProvider, RoundSubmissions};
pub use epoch_provider::InMemoryRewardEpochProvider;
