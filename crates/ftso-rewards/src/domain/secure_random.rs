//! Round random aggregation
//!
//! Combines revealed randoms of non-benched voters by wrapping addition
//! modulo 2^256. Addition is associative and commutative, so the value does
//! not depend on reveal order.

use crate::domain::submissions::DataForCalculations;
use shared_types::{Address, U256};
use std::collections::BTreeSet;

/// Round random and its safety flag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RandomResult {
    pub random: U256,
    pub is_secure: bool,
    /// Submission addresses whose randoms were combined
    pub contributors: BTreeSet<Address>,
}

/// Aggregate the round random.
///
/// Insecure when fewer than `min_revealers` distinct non-benched voters
/// contributed, or when any non-benched voter committed without revealing.
/// A value is produced either way.
pub fn calculate_random(data: &DataForCalculations, min_revealers: usize) -> RandomResult {
    let mut random = U256::zero();
    let mut contributors = BTreeSet::new();

    for (submit_address, reveal) in &data.valid_reveals {
        if data.benched.contains(submit_address) {
            continue;
        }
        random = random.overflowing_add(reveal.random).0;
        contributors.insert(*submit_address);
    }

    let withheld = data
        .reveal_offenders
        .iter()
        .any(|offender| !data.benched.contains(offender));

    RandomResult {
        random,
        is_secure: contributors.len() >= min_revealers && !withheld,
        contributors,
    }
}
