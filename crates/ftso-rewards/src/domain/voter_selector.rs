//! # Deterministic Weighted Voter Selection
//!
//! Picks voters without replacement until their cumulative weight reaches a
//! threshold fraction of the total weight.
//!
//! ## Seeding
//!
//! The initial seed is `keccak256(word(policy_seed) ‖ word(protocol_id) ‖ word(voting_round_id))`
//! so the selection is bound to the epoch's seed and to the round. Nobody can
//! predict it before the seed is fixed on-chain; anybody can recompute it after.
//!
//! ## Draws
//!
//! Each draw maps the current seed to a point in `[0, remaining_weight)`,
//! picks the unselected voter whose cumulative-weight interval contains it,
//! then re-hashes the seed (`seed = keccak256(seed)`) for the next draw.

use crate::config::TOTAL_PPM;
use crate::domain::arith::mul_div;
use crate::error::RewardResult;
use shared_types::{hash_to_u256, keccak256, u256_word, u64_word, Address, Hash, ProtocolId, VotingRoundId, U256};

/// Weighted sampler over an ordered voter list.
#[derive(Clone, Debug)]
pub struct RandomVoterSelector {
    voters: Vec<Address>,
    weights: Vec<u64>,
    total_weight: u64,
    threshold_weight: U256,
}

impl RandomVoterSelector {
    /// `voters` and `weights` are parallel; extra entries of the longer one are ignored.
    pub fn new(voters: &[Address], weights: &[u16], threshold_ppm: u32) -> RewardResult<Self> {
        let len = voters.len().min(weights.len());
        let voters = voters[..len].to_vec();
        let weights: Vec<u64> = weights[..len].iter().map(|w| u64::from(*w)).collect();
        let total_weight: u64 = weights.iter().sum();
        let threshold_weight = mul_div(
            U256::from(total_weight),
            U256::from(threshold_ppm.min(TOTAL_PPM)),
            U256::from(TOTAL_PPM),
        )?;

        Ok(Self {
            voters,
            weights,
            total_weight,
            threshold_weight,
        })
    }

    /// Per-round initial seed.
    pub fn initial_hash_seed(
        policy_seed: U256,
        protocol_id: ProtocolId,
        voting_round_id: VotingRoundId,
    ) -> Hash {
        keccak256(&[
            u256_word(policy_seed).as_slice(),
            u64_word(u64::from(protocol_id)).as_slice(),
            u64_word(u64::from(voting_round_id)).as_slice(),
        ])
    }

    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    pub fn threshold_weight(&self) -> U256 {
        self.threshold_weight
    }

    /// Select voters until their weight reaches the threshold.
    ///
    /// Returns voters in selection order. Zero-weight voters are never
    /// selected; if every positive-weight voter is selected before the
    /// threshold is met, the selection stops there.
    pub fn random_select_threshold_weight_voters(&self, seed: Hash) -> Vec<Address> {
        let mut selected = Vec::new();
        if self.threshold_weight.is_zero() {
            return selected;
        }

        let mut remaining: Vec<usize> = (0..self.voters.len())
            .filter(|i| self.weights[*i] > 0)
            .collect();
        let mut remaining_weight = self.total_weight;
        let mut selected_weight = U256::zero();
        let mut current_seed = seed;

        while selected_weight < self.threshold_weight && remaining_weight > 0 {
            let point = (hash_to_u256(&current_seed) % U256::from(remaining_weight)).low_u64();
            let position = self.position_for_point(&remaining, point);
            let index = remaining.remove(position);

            selected.push(self.voters[index]);
            selected_weight += U256::from(self.weights[index]);
            remaining_weight -= self.weights[index];
            current_seed = keccak256(&[current_seed.as_slice()]);
        }

        selected
    }

    /// Position in `remaining` whose cumulative-weight interval contains `point`.
    fn position_for_point(&self, remaining: &[usize], point: u64) -> usize {
        let mut cumulative = 0u64;
        for (position, index) in remaining.iter().enumerate() {
            cumulative += self.weights[*index];
            if point < cumulative {
                return position;
            }
        }
        remaining.len() - 1
    }
}
