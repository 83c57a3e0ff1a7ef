use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, SamplingMode};
use dot_cuda::{dot_product, DotConfig, HostDevice, Strategy};
use rand::{Rng, SeedableRng};
use rand_hc::Hc128Rng;

const SEED: &[u8; 32] = b"LVXn6sWNasjDReRS2OZ9a0eY1aprVNYX";

/// Creates the specified number of random floats in `[-1, 1)`.
fn create_random_vec(len: usize, rng: &mut impl Rng) -> Vec<f32> {
    (0..len).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

pub fn strategy_comparison(c: &mut Criterion) {
    let mut group = c.benchmark_group("Strategy comparison");
    group.sample_size(10);
    group.sampling_mode(SamplingMode::Flat);

    let device = HostDevice::new();
    for len in [1_040usize, 100_000, 1_000_000] {
        let mut rng = Hc128Rng::from_seed(*SEED);
        let a = create_random_vec(len, &mut rng);
        let b = create_random_vec(len, &mut rng);

        for (name, strategy) in [("Atomic", Strategy::Atomic), ("Tree", Strategy::Tree)] {
            let config = DotConfig {
                strategy,
                ..DotConfig::default()
            };
            group.bench_with_input(BenchmarkId::new(name, len), &len, |bench, _| {
                bench.iter(|| dot_product(&device, &a, &b, &config).unwrap())
            });
        }
    }

    group.finish();
}

pub fn block_size_comparison(c: &mut Criterion) {
    let mut group = c.benchmark_group("Block size");
    group.sample_size(10);

    let device = HostDevice::new();
    let mut rng = Hc128Rng::from_seed(*SEED);
    let a = create_random_vec(1_000_000, &mut rng);
    let b = create_random_vec(1_000_000, &mut rng);

    for block_size in [64u32, 256, 1024] {
        let config = DotConfig {
            block_size,
            max_grid_size: Some(64),
            strategy: Strategy::Tree,
        };
        group.bench_with_input(
            BenchmarkId::new("Tree", block_size),
            &block_size,
            |bench, _| bench.iter(|| dot_product(&device, &a, &b, &config).unwrap()),
        );
    }

    group.finish();
}

criterion_group!(benches, strategy_comparison, block_size_comparison);
criterion_main!(benches);
