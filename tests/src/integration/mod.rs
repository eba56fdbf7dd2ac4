//! # End-to-End Settlement Scenarios
//!
//! Each module drives the calculation service through the in-memory
//! providers, from raw submissions to merged claims.

pub mod median_rewards;
pub mod penalties;
