//! # Core Protocol Entities
//!
//! ## Clusters
//!
//! - **Identity**: `Address`, `Hash`
//! - **Time**: `VotingRoundId`, `RewardEpochId`
//! - **Feeds**: `FeedId`, `Feed`

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// Re-export U256 from primitive-types for amounts and weights
pub use primitive_types::{U256, U512};

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// A 32-byte hash (keccak-256).
pub type Hash = [u8; 32];

/// A 20-byte Ethereum-style address.
pub type Address = [u8; 20];

/// The all-zero address.
pub const ZERO_ADDRESS: Address = [0u8; 20];

/// Identifier of a voting round (fixed-duration commit/reveal window).
pub type VotingRoundId = u32;

/// Identifier of a reward epoch (a span of voting rounds).
pub type RewardEpochId = u32;

/// Identifier of a protocol sharing the signing infrastructure.
pub type ProtocolId = u8;

/// Render an address as `0x`-prefixed lowercase hex for logs.
pub fn address_hex(address: &Address) -> String {
    format!("0x{}", hex::encode(address))
}

// =============================================================================
// CLUSTER B: FEEDS
// =============================================================================

/// Errors parsing feed identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedIdError {
    #[error("Feed id must be 8 bytes (16 hex chars), got {0} hex chars")]
    InvalidLength(usize),

    #[error("Feed id is not valid hex: {0}")]
    InvalidHex(String),
}

/// 8-byte feed identifier, e.g. `BTC\0USDT` as `4254430055534454`.
///
/// Ordering is byte-lexicographic; the canonical feed order of a reward
/// epoch relies on it.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FeedId(#[serde_as(as = "Bytes")] pub [u8; 8]);

impl FeedId {
    pub fn new(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    /// Build a feed id from base and quote symbols of up to 4 bytes each.
    pub fn from_symbols(base: &str, quote: &str) -> Self {
        let mut bytes = [0u8; 8];
        for (dst, src) in bytes[..4].iter_mut().zip(base.bytes()) {
            *dst = src;
        }
        for (dst, src) in bytes[4..].iter_mut().zip(quote.bytes()) {
            *dst = src;
        }
        Self(bytes)
    }
}

impl FromStr for FeedId {
    type Err = FeedIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        if s.len() != 16 {
            return Err(FeedIdError::InvalidLength(s.len()));
        }
        let decoded = hex::decode(s).map_err(|e| FeedIdError::InvalidHex(e.to_string()))?;
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&decoded);
        Ok(Self(bytes))
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FeedId({})", hex::encode(self.0))
    }
}

/// A price feed with its decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Feed {
    pub id: FeedId,
    pub decimals: i8,
}

impl Feed {
    pub fn new(id: FeedId, decimals: i8) -> Self {
        Self { id, decimals }
    }
}
