//! # Reward Calculation Benchmarks
//!
//! | Area | Input |
//! |------|-------|
//! | Weighted median | 100..10_000 reveals |
//! | Finalizer selection | 100..1_000 policy voters |
//! | Voting round | 50 voters, 20 feeds |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ftso_rewards::domain::{weighted_median, WeightedReveal};
use ftso_rewards::ports::inbound::RewardCalculationApi;
use ftso_rewards::RandomVoterSelector;
use ftso_tests::fixtures::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared_types::U256;
use std::time::Duration;

fn bench_weighted_median(c: &mut Criterion) {
    let mut group = c.benchmark_group("weighted-median");
    let mut rng = StdRng::seed_from_u64(7);

    for size in [100usize, 1_000, 10_000] {
        let reveals: Vec<WeightedReveal> = (0..size)
            .map(|i| {
                let mut voter = [0u8; 20];
                voter[..8].copy_from_slice(&(i as u64).to_be_bytes());
                WeightedReveal {
                    voter,
                    price: rng.gen_range(1_000_000..2_000_000),
                    weight: U256::from(rng.gen_range(1u64..1_000_000)),
                }
            })
            .collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("reveals", size), &reveals, |b, reveals| {
            b.iter(|| black_box(weighted_median(reveals)))
        });
    }

    group.finish();
}

fn bench_finalizer_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("finalizer-selection");
    let mut rng = StdRng::seed_from_u64(11);

    for size in [100usize, 500, 1_000] {
        let voters: Vec<_> = (0..size)
            .map(|i| {
                let mut address = [0x20u8; 20];
                address[18..].copy_from_slice(&(i as u16).to_be_bytes());
                address
            })
            .collect();
        let weights: Vec<u16> = (0..size).map(|_| rng.gen_range(1..500)).collect();
        let selector = match RandomVoterSelector::new(&voters, &weights, 50_000) {
            Ok(selector) => selector,
            Err(err) => panic!("selector: {err}"),
        };

        group.bench_with_input(BenchmarkId::new("voters", size), &selector, |b, selector| {
            let mut round = 0u32;
            b.iter(|| {
                round = round.wrapping_add(1);
                let seed = RandomVoterSelector::initial_hash_seed(U256::from(42u64), 100, round);
                black_box(selector.random_select_threshold_weight_voters(seed))
            })
        });
    }

    group.finish();
}

fn bench_voting_round(c: &mut Criterion) {
    let mut group = c.benchmark_group("voting-round");
    group.measurement_time(Duration::from_secs(10));

    let feeds: Vec<String> = (0..20).map(|i| format!("F{i:02}")).collect();
    let mut builder = ScenarioBuilder::new(50);
    for symbol in &feeds {
        builder = builder.with_offer(feed(symbol), 10_000_000, 500_000);
    }
    let scenario = builder.build();

    let mut rng = StdRng::seed_from_u64(13);
    let mut round = scenario.round(FIRST_ROUND);
    for i in 0..50u8 {
        let prices: Vec<Option<u32>> = (0..feeds.len())
            .map(|_| Some(rng.gen_range(90_000..110_000)))
            .collect();
        round = round.reveal(i, &prices).sign(i, root(1), 20);
    }
    scenario.store(FIRST_ROUND, round.finalize(0, 30).finish());

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => panic!("runtime: {err}"),
    };
    group.bench_function("50-voters-20-feeds", |b| {
        b.iter(|| {
            let outcome = runtime.block_on(scenario.service.calculate_voting_round(FIRST_ROUND, true));
            black_box(outcome.map(|outcome| outcome.claims.len()))
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_weighted_median,
    bench_finalizer_selection,
    bench_voting_round
);
criterion_main!(benches);
