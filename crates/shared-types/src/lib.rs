//! # Shared Types Crate
//!
//! Protocol primitives used across the oracle settlement workspace.
//!
//! ## Design Principles
//!
//! - **Plain data**: addresses and hashes are fixed-size byte arrays so they
//!   hash, order and compare the same way on every node.
//! - **Big-endian words**: anything that is hashed is laid out as 32-byte
//!   big-endian words, matching on-chain encoding.

pub mod entities;
pub mod hashing;

pub use entities::*;
pub use hashing::*;
