//! # Keccak Hashing Helpers
//!
//! Word-oriented keccak-256 helpers. Every value that enters a hash is laid
//! out the way the chain lays it out: unsigned integers as 32-byte big-endian
//! words, addresses as raw 20 bytes in packed encodings.

use crate::entities::{Hash, U256};
use sha3::{Digest, Keccak256};

/// keccak-256 over the concatenation of `parts`.
pub fn keccak256(parts: &[&[u8]]) -> Hash {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Encode an unsigned integer as a 32-byte big-endian word.
pub fn u256_word(value: U256) -> [u8; 32] {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    word
}

/// Encode a `u64` as a 32-byte big-endian word.
pub fn u64_word(value: u64) -> [u8; 32] {
    u256_word(U256::from(value))
}

/// Interpret a hash as a big-endian unsigned integer.
pub fn hash_to_u256(hash: &Hash) -> U256 {
    U256::from_big_endian(hash)
}
