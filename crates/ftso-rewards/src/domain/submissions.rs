//! Commit/reveal submissions
//!
//! ## Payloads
//!
//! - Commit: `keccak256(submit_address ‖ random ‖ encoded_values)`
//! - Reveal: the random plus one 4-byte big-endian value per canonical feed
//!
//! A reveal counts only if its submitter is registered in the reward epoch,
//! it lands by the round's reveal deadline and it opens the submitter's
//! commit. Registered submitters that committed without a valid reveal are
//! reveal offenders.

use crate::domain::reward_epoch::RewardEpoch;
use serde::{Deserialize, Serialize};
use shared_types::{address_hex, keccak256, Address, Hash, U256};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;
use tracing::warn;

/// Width of one encoded feed value.
pub const FEED_VALUE_BYTES: usize = 4;

/// Encoded value meaning "no price for this feed".
pub const NO_VALUE: u32 = 0;

/// Reveal payload decoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("encoded values length {0} is not a multiple of 4")]
    UnalignedLength(usize),

    #[error("encoded values carry {values} feeds but the epoch has {feeds}")]
    TooManyValues { values: usize, feeds: usize },
}

/// A commit transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSubmission {
    pub submit_address: Address,
    pub commit_hash: Hash,
}

/// A reveal transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealSubmission {
    pub submit_address: Address,
    pub random: Hash,
    pub encoded_values: Vec<u8>,
    /// Block timestamp of the reveal transaction
    pub timestamp: u64,
}

impl RevealSubmission {
    /// Commit hash this reveal opens for `submit_address`.
    pub fn commit_hash(&self) -> Hash {
        commit_hash(&self.submit_address, &self.random, &self.encoded_values)
    }
}

/// Commit hash rule shared by voters and calculators.
pub fn commit_hash(submit_address: &Address, random: &Hash, encoded_values: &[u8]) -> Hash {
    keccak256(&[submit_address.as_slice(), random.as_slice(), encoded_values])
}

/// Encode per-feed values in canonical feed order.
pub fn encode_feed_values(values: &[Option<u32>]) -> Vec<u8> {
    values
        .iter()
        .flat_map(|value| value.unwrap_or(NO_VALUE).to_be_bytes())
        .collect()
}

/// Decode per-feed values; trailing feeds missing from the payload have no value.
pub fn decode_feed_values(encoded: &[u8], feed_count: usize) -> Result<Vec<Option<u32>>, PayloadError> {
    if encoded.len() % FEED_VALUE_BYTES != 0 {
        return Err(PayloadError::UnalignedLength(encoded.len()));
    }
    let value_count = encoded.len() / FEED_VALUE_BYTES;
    if value_count > feed_count {
        return Err(PayloadError::TooManyValues {
            values: value_count,
            feeds: feed_count,
        });
    }

    let mut values: Vec<Option<u32>> = encoded
        .chunks_exact(FEED_VALUE_BYTES)
        .map(|chunk| {
            let value = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            (value != NO_VALUE).then_some(value)
        })
        .collect();
    values.resize(feed_count, None);
    Ok(values)
}

/// A reveal that opened its commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidReveal {
    pub submit_address: Address,
    pub random: U256,
    /// One entry per canonical feed
    pub values: Vec<Option<u32>>,
}

/// Per-round view derived from raw submissions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DataForCalculations {
    /// Keyed by submission address
    pub valid_reveals: BTreeMap<Address, ValidReveal>,
    /// Registered submitters that committed without a valid reveal
    pub reveal_offenders: BTreeSet<Address>,
    /// Submitters benched from random generation by the benching policy
    pub benched: BTreeSet<Address>,
}

impl DataForCalculations {
    /// Match commits against reveals.
    ///
    /// Submissions are in chain order; per submitter only the last commit and
    /// the last reveal by `reveal_deadline` count. Unregistered submitters
    /// are ignored.
    pub fn from_submissions(
        reward_epoch: &RewardEpoch,
        commits: &[CommitSubmission],
        reveals: &[RevealSubmission],
        reveal_deadline: u64,
        benched: BTreeSet<Address>,
    ) -> Self {
        let mut last_commits: HashMap<Address, &CommitSubmission> = HashMap::new();
        for commit in commits {
            if reward_epoch.is_eligible_submission_address(&commit.submit_address) {
                last_commits.insert(commit.submit_address, commit);
            } else {
                warn!(
                    "[ftso-rewards] Ignoring commit from unregistered submitter {}",
                    address_hex(&commit.submit_address)
                );
            }
        }

        let mut last_reveals: HashMap<Address, &RevealSubmission> = HashMap::new();
        for reveal in reveals {
            if !last_commits.contains_key(&reveal.submit_address) {
                continue;
            }
            if reveal.timestamp > reveal_deadline {
                warn!(
                    "[ftso-rewards] Ignoring late reveal from {} at {} (deadline {})",
                    address_hex(&reveal.submit_address),
                    reveal.timestamp,
                    reveal_deadline
                );
                continue;
            }
            last_reveals.insert(reveal.submit_address, reveal);
        }

        let feed_count = reward_epoch.canonical_feed_order().len();
        let mut valid_reveals = BTreeMap::new();
        let mut reveal_offenders = BTreeSet::new();

        for (submit_address, commit) in last_commits {
            match last_reveals.get(&submit_address) {
                Some(reveal) => match validate_reveal(commit, reveal, feed_count) {
                    Ok(valid) => {
                        valid_reveals.insert(submit_address, valid);
                    }
                    Err(reason) => {
                        warn!(
                            "[ftso-rewards] Invalid reveal from {}: {}",
                            address_hex(&submit_address),
                            reason
                        );
                        reveal_offenders.insert(submit_address);
                    }
                },
                None => {
                    reveal_offenders.insert(submit_address);
                }
            }
        }

        Self {
            valid_reveals,
            reveal_offenders,
            benched,
        }
    }
}

fn validate_reveal(
    commit: &CommitSubmission,
    reveal: &RevealSubmission,
    feed_count: usize,
) -> Result<ValidReveal, String> {
    if reveal.commit_hash() != commit.commit_hash {
        return Err("reveal does not match commit".to_string());
    }
    let values = decode_feed_values(&reveal.encoded_values, feed_count).map_err(|e| e.to_string())?;
    Ok(ValidReveal {
        submit_address: reveal.submit_address,
        random: U256::from_big_endian(&reveal.random),
        values,
    })
}
