//! # Median Reward Scenarios
//!
//! Band membership and conservation of the median sub-offer.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use ftso_rewards::ports::inbound::RewardCalculationApi;
    use ftso_rewards::{ClaimType, PartialRewardClaim};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use shared_types::U256;

    const ROUND: u32 = FIRST_ROUND + 3;

    fn median_total(claims: &[PartialRewardClaim]) -> U256 {
        sum_where(claims, |c| {
            (c.claim_type == ClaimType::Median).then_some(c.amount)
        })
    }

    /// 10 voters at the same price: everyone is in both bands.
    #[tokio::test]
    async fn test_identical_prices_split_both_pools_evenly() {
        let scenario = ScenarioBuilder::new(10)
            .with_offer(feed("BTC"), 10_000_000, 500_000)
            .build();
        scenario.store(ROUND, scenario.honest_round(ROUND, &[Some(6_000_000)]));

        let outcome = scenario
            .service
            .calculate_voting_round(ROUND, true)
            .await
            .unwrap();

        let median = &outcome.median_results[&feed("BTC").id];
        let summary = median.summary.unwrap();
        assert_eq!(summary.final_median_price, 6_000_000);
        assert_eq!(summary.quartile1_price, 6_000_000);
        assert_eq!(summary.quartile3_price, 6_000_000);

        // 1_000_000 per round, 80% of it for the median
        for i in 0..10 {
            let claim = outcome
                .claims
                .iter()
                .find(|c| c.beneficiary == delegation(i))
                .unwrap();
            assert!(!claim.is_fixed);
            assert_eq!(claim.amount, U256::from(80_000u64));
        }
        assert_eq!(median_total(&outcome.claims), U256::from(800_000u64));
        assert!(!outcome
            .claims
            .iter()
            .any(|c| c.beneficiary == REMAINDER_CLAIMER));
    }

    /// Uneven weights and scattered prices never create or destroy value.
    #[tokio::test]
    async fn test_median_sub_offer_is_conserved() {
        let mut rng = StdRng::seed_from_u64(2024);
        let weights: Vec<(u64, u16)> = (0..17)
            .map(|_| (rng.gen_range(1..50_000), rng.gen_range(1..500)))
            .collect();
        let scenario = ScenarioBuilder::new(0)
            .with_voter_weights(&weights)
            .with_offer(feed("BTC"), 9_999_991, 300_000)
            .with_offer(feed("ETH"), 1_234_567, 700_000)
            .build();

        let mut round = scenario.round(ROUND);
        for i in 0..17u8 {
            let btc = rng.gen_range(99_000..101_000);
            let eth = rng.gen_range(3_000..3_010);
            round = round.reveal(i, &[Some(btc), Some(eth)]).sign(i, root(1), 30);
        }
        scenario.store(ROUND, round.finalize(4, 10).finish());

        let outcome = scenario
            .service
            .calculate_voting_round(ROUND, false)
            .await
            .unwrap();

        // fourth round of ten: BTC has no leftover unit, ETH still gets one
        let btc_round = 9_999_991u64 / 10;
        let eth_round = 1_234_567u64 / 10 + 1;
        let median_part = |amount: u64| amount - 2 * (amount / 10);
        assert_eq!(
            median_total(&outcome.claims),
            U256::from(median_part(btc_round) + median_part(eth_round))
        );
        assert_eq!(
            sum_where(&outcome.claims, |c| Some(c.amount)),
            U256::from(btc_round + eth_round)
        );
    }

    #[tokio::test]
    async fn test_outlier_gets_nothing() {
        let scenario = ScenarioBuilder::new(5)
            .with_offer(feed("BTC"), 1_000_000, 500_000)
            .build();
        let round = scenario
            .round(ROUND)
            .reveal(0, &[Some(1_000)])
            .reveal(1, &[Some(1_000)])
            .reveal(2, &[Some(1_001)])
            .reveal(3, &[Some(999)])
            .reveal(4, &[Some(2_000)])
            .finish();
        scenario.store(ROUND, round);

        let outcome = scenario
            .service
            .calculate_voting_round(ROUND, true)
            .await
            .unwrap();

        assert!(outcome.claims.iter().all(|c| c.beneficiary != delegation(4)));
        assert!(outcome.claims.iter().any(|c| c.beneficiary == delegation(2)));
    }

    #[tokio::test]
    async fn test_unpriced_feed_goes_to_remainder_claimer() {
        let scenario = ScenarioBuilder::new(4)
            .with_offer(feed("BTC"), 1_000_000, 500_000)
            .with_offer(feed("XRP"), 1_000_000, 500_000)
            .build();
        // canonical order is BTC, XRP; nobody prices XRP
        scenario.store(ROUND, scenario.honest_round(ROUND, &[Some(50_000), None]));

        let outcome = scenario
            .service
            .calculate_voting_round(ROUND, true)
            .await
            .unwrap();

        assert!(outcome.median_results[&feed("XRP").id].summary.is_none());
        let remainder = sum_where(&outcome.claims, |c| {
            (c.beneficiary == REMAINDER_CLAIMER && c.claim_type == ClaimType::Median)
                .then_some(c.amount)
        });
        assert_eq!(remainder, U256::from(80_000u64));
    }
}
