//! # Penalty Scenarios
//!
//! Reveal withdrawal and double signing, end to end.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use ftso_rewards::ports::inbound::RewardCalculationApi;
    use ftso_rewards::ClaimType;
    use shared_types::U256;

    const ROUND: u32 = FIRST_ROUND + 5;

    #[tokio::test]
    async fn test_commit_without_reveal_is_penalized_once() {
        let scenario = ScenarioBuilder::new(10)
            .with_offer(feed("BTC"), 10_000_000, 500_000)
            .build();
        let mut round = scenario.round(ROUND);
        for i in 0..10u8 {
            round = if i == 3 {
                round.commit_only(3, &[Some(42_000)])
            } else {
                round.reveal(i, &[Some(42_000)]).sign(i, root(1), 15)
            };
        }
        scenario.store(ROUND, round.finalize(0, 70).finish());

        let outcome = scenario
            .service
            .calculate_voting_round(ROUND, true)
            .await
            .unwrap();

        let penalties: Vec<_> = outcome
            .claims
            .iter()
            .filter(|c| c.claim_type == ClaimType::RevealWithdrawalPenalty)
            .collect();
        assert_eq!(penalties.len(), 1);
        assert_eq!(penalties[0].beneficiary, submit(3));
        assert!(penalties[0].is_fixed);
        // 1_000_000 * 1000 * 30 / 10_000
        assert_eq!(penalties[0].amount, U256::from(3_000_000u64));

        assert!(!outcome.claims.iter().any(|c| {
            matches!(c.claim_type, ClaimType::Median | ClaimType::Signing)
                && (c.beneficiary == delegation(3) || c.beneficiary == identity(3))
        }));
        assert!(outcome.reveal_offenders.contains(&submit(3)));
        assert!(!outcome.random.is_secure);
    }

    #[tokio::test]
    async fn test_reveal_after_deadline_is_penalized() {
        let scenario = ScenarioBuilder::new(10)
            .with_offer(feed("BTC"), 10_000_000, 500_000)
            .build();
        let mut round = scenario.round(ROUND);
        for i in 0..10u8 {
            round = if i == 3 {
                // reveal deadline is 45s into the reveal phase
                round.reveal_at(3, &[Some(42_000)], 46)
            } else {
                round.reveal(i, &[Some(42_000)])
            };
            round = round.sign(i, root(1), 15);
        }
        scenario.store(ROUND, round.finalize(0, 70).finish());

        let outcome = scenario
            .service
            .calculate_voting_round(ROUND, true)
            .await
            .unwrap();

        assert!(outcome.reveal_offenders.contains(&submit(3)));
        let penalty = sum_where(&outcome.claims, |c| {
            (c.claim_type == ClaimType::RevealWithdrawalPenalty && c.beneficiary == submit(3))
                .then_some(c.amount)
        });
        assert_eq!(penalty, U256::from(3_000_000u64));
        assert!(!outcome
            .claims
            .iter()
            .any(|c| c.claim_type == ClaimType::Median && c.beneficiary == delegation(3)));
        assert!(!outcome.random.contributors.contains(&submit(3)));
    }

    #[tokio::test]
    async fn test_conflicting_signatures_penalized_once() {
        let scenario = ScenarioBuilder::new(6)
            .with_offer(feed("BTC"), 10_000_000, 500_000)
            .build();
        let mut round = scenario.round(ROUND);
        for i in 0..6u8 {
            round = round.reveal(i, &[Some(7_000)]).sign(i, root(1), 10);
        }
        // voter 2 also signs a conflicting root
        round = round.sign(2, root(9), 11);
        scenario.store(ROUND, round.finalize(1, 90).finish());

        let outcome = scenario
            .service
            .calculate_voting_round(ROUND, true)
            .await
            .unwrap();

        let penalties: Vec<_> = outcome
            .claims
            .iter()
            .filter(|c| c.claim_type == ClaimType::DoubleSigningPenalty)
            .collect();
        assert_eq!(penalties.len(), 1);
        assert_eq!(penalties[0].beneficiary, submit(2));
        assert_eq!(outcome.double_signers.len(), 1);

        // the double signer earns no signing reward
        assert!(!outcome
            .claims
            .iter()
            .any(|c| c.claim_type == ClaimType::Signing && c.beneficiary == identity(2)));
        let signing_total = sum_where(&outcome.claims, |c| {
            (c.claim_type == ClaimType::Signing).then_some(c.amount)
        });
        assert_eq!(signing_total, U256::from(100_000u64));
    }

    #[tokio::test]
    async fn test_penalties_accumulate_across_rounds() {
        let scenario = ScenarioBuilder::new(4)
            .with_offer(feed("BTC"), 1_000_000, 500_000)
            .build();
        for round_id in FIRST_ROUND..=LAST_ROUND {
            let mut round = scenario.round(round_id);
            for i in 0..4u8 {
                round = if i == 1 && round_id % 2 == 0 {
                    round.commit_only(1, &[Some(500)])
                } else {
                    round.reveal(i, &[Some(500)]).sign(i, root(1), 5)
                };
            }
            scenario.store(round_id, round.finalize(0, 70).finish());
        }

        let claims = scenario.service.calculate_reward_epoch(EPOCH).await.unwrap();
        let penalty: Vec<_> = claims
            .iter()
            .filter(|c| c.claim_type == ClaimType::RevealWithdrawalPenalty)
            .collect();
        assert_eq!(penalty.len(), 1);
        // five rounds of 100_000 * 1000 * 30 / 4000
        assert_eq!(penalty[0].amount, U256::from(5 * 750_000u64));
    }
}
