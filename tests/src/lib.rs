//! # Price-Oracle Reward Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Scenario and round builders over in-memory providers
//! └── integration/      # End-to-end reward scenarios
//!     ├── median_rewards.rs
//!     ├── finalization.rs
//!     ├── penalties.rs
//!     ├── secure_random.rs
//!     ├── claim_merging.rs
//!     └── epoch_construction.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p ftso-tests
//!
//! # By scenario
//! cargo test -p ftso-tests integration::penalties::
//!
//! # Benchmarks
//! cargo bench -p ftso-tests
//! ```

pub mod fixtures;
pub mod integration;
