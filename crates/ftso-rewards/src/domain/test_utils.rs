//! Shared fixtures for unit tests.

use crate::domain::events::*;
use crate::domain::offers::PartialRewardOffer;
use crate::domain::reward_epoch::RewardEpoch;
use crate::domain::submissions::{encode_feed_values, CommitSubmission, RevealSubmission};
use shared_types::{Address, Feed, FeedId, RewardEpochId, VotingRoundId, U256};

pub const CURRENCY: Address = [0xCC; 20];
pub const REMAINDER_CLAIMER: Address = [0xAA; 20];
pub const CAPPED_WEIGHT: u64 = 1_000;
pub const SIGNING_WEIGHT: u16 = 100;

fn addr(role: u8, i: u8) -> Address {
    let mut address = [role; 20];
    address[19] = i;
    address
}

pub fn identity(i: u8) -> Address {
    addr(0x11, i)
}

pub fn signing(i: u8) -> Address {
    addr(0x22, i)
}

pub fn submit(i: u8) -> Address {
    addr(0x33, i)
}

pub fn delegation(i: u8) -> Address {
    addr(0x44, i)
}

pub fn btc_feed() -> Feed {
    Feed::new(FeedId::from_symbols("BTC", "USD"), 2)
}

pub fn eth_feed() -> Feed {
    Feed::new(FeedId::from_symbols("ETH", "USD"), 2)
}

pub fn flr_feed() -> Feed {
    Feed::new(FeedId::from_symbols("FLR", "USD"), 5)
}

pub fn registration(epoch: RewardEpochId, i: u8, weight: u64) -> FullVoterRegistrationInfo {
    FullVoterRegistrationInfo {
        voter_registered: VoterRegistered {
            reward_epoch_id: epoch,
            voter: identity(i),
            signing_policy_address: signing(i),
            submit_address: submit(i),
            delegation_address: delegation(i),
            registration_weight: U256::from(weight),
        },
        voter_registration_info: VoterRegistrationInfo {
            reward_epoch_id: epoch,
            voter: identity(i),
            delegation_fee_bips: 2_000,
            capped_weight: U256::from(weight),
        },
    }
}

pub fn reward_offer(epoch: RewardEpochId, feed: Feed, amount: u64) -> RewardOffer {
    RewardOffer {
        reward_epoch_id: epoch,
        feed,
        amount: U256::from(amount),
        currency: CURRENCY,
        iqr_share_ppm: 500_000,
        pct_share_ppm: 500_000,
        reward_belt_ppm: 0,
        elastic_band_width_ppm: 5_000,
        lead_providers: Vec::new(),
        remainder_claimer: REMAINDER_CLAIMER,
    }
}

pub fn partial_offer(feed: Feed, voting_round_id: VotingRoundId, amount: u64) -> PartialRewardOffer {
    PartialRewardOffer {
        voting_round_id,
        feed,
        amount: U256::from(amount),
        currency: CURRENCY,
        iqr_share_ppm: 500_000,
        pct_share_ppm: 500_000,
        reward_belt_ppm: 0,
        elastic_band_width_ppm: 5_000,
        lead_providers: Vec::new(),
        remainder_claimer: REMAINDER_CLAIMER,
    }
}

/// Events of a reward epoch with `voters` equal-weight voters and one offer per listed feed.
pub fn epoch_events(epoch: RewardEpochId, voters: u8, feeds: &[Feed]) -> RewardEpochEvents {
    let start_voting_round_id = epoch * 100;
    RewardEpochEvents {
        previous_reward_epoch_started: RewardEpochStarted {
            reward_epoch_id: epoch - 1,
            start_voting_round_id: start_voting_round_id - 100,
            timestamp: 0,
        },
        random_acquisition_started: RandomAcquisitionStarted {
            reward_epoch_id: epoch,
            timestamp: 0,
        },
        reward_offers: RewardOffers {
            reward_offers: feeds
                .iter()
                .map(|feed| reward_offer(epoch, *feed, 1_000_000))
                .collect(),
            inflation_offers: Vec::new(),
        },
        vote_power_block_selected: VotePowerBlockSelected {
            reward_epoch_id: epoch,
            vote_power_block: 1_000,
            timestamp: 0,
        },
        signing_policy_initialized: SigningPolicyInitialized {
            reward_epoch_id: epoch,
            start_voting_round_id,
            threshold: (u16::from(voters) * SIGNING_WEIGHT) / 2 + 1,
            seed: U256::from(u64::from(epoch) * 1_000 + 7),
            voters: (0..voters).map(signing).collect(),
            weights: vec![SIGNING_WEIGHT; voters as usize],
            timestamp: 0,
        },
        voter_registrations: (0..voters)
            .map(|i| registration(epoch, i, CAPPED_WEIGHT))
            .collect(),
    }
}

pub fn test_epoch(voters: u8, feeds: &[Feed]) -> RewardEpoch {
    RewardEpoch::new(epoch_events(2, voters, feeds)).unwrap()
}

/// Matching commit and reveal of voter `i`.
pub fn commit_reveal(
    i: u8,
    values: &[Option<u32>],
    random_byte: u8,
) -> (CommitSubmission, RevealSubmission) {
    let reveal = RevealSubmission {
        submit_address: submit(i),
        random: [random_byte; 32],
        encoded_values: encode_feed_values(values),
        timestamp: 0,
    };
    let commit = CommitSubmission {
        submit_address: submit(i),
        commit_hash: reveal.commit_hash(),
    };
    (commit, reveal)
}
