//! Planning and execution benchmarks.
//!
//! Run with: cargo bench --bench plan_bench

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;
use std::hint::black_box;
use std::time::Duration;
use strided_rdft::{
    contiguous_problem, execute, execute_in_place, Planner, PlannerConfig, RdftKind,
};

fn random(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.sample(StandardNormal)).collect()
}

/// Threaded DIF against the direct leaf for 1-D backward transforms.
fn bench_hc2r_threads(c: &mut Criterion) {
    let mut group = c.benchmark_group("hc2r_1d");
    group.sample_size(20);
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(3));

    for n in [256usize, 1024] {
        group.throughput(Throughput::Elements(n as u64));
        let problem = contiguous_problem(&[n], &[RdftKind::Hc2r], true).unwrap();
        let hc = random(n, 42);

        for threads in [1usize, 4] {
            let planner =
                Planner::with_default_solvers(PlannerConfig::default().with_threads(threads));
            let handle = planner.plan(&problem).unwrap();
            group.bench_with_input(BenchmarkId::new(format!("threads{threads}"), n), &n, |b, _| {
                let mut data = hc.clone();
                b.iter(|| {
                    data.copy_from_slice(&hc);
                    execute_in_place(&handle, &mut data).unwrap();
                    black_box(&data);
                })
            });
        }
    }
    group.finish();
}

/// Rank splitting of square 2-D forward transforms.
fn bench_r2hc_2d(c: &mut Criterion) {
    let mut group = c.benchmark_group("r2hc_2d");
    group.sample_size(20);

    for n in [16usize, 32] {
        group.throughput(Throughput::Elements((n * n) as u64));
        let problem = contiguous_problem(&[n, n], &[RdftKind::R2hc; 2], false).unwrap();
        let planner = Planner::with_default_solvers(PlannerConfig::default());
        let handle = planner.plan(&problem).unwrap();
        let x = random(n * n, 7);

        group.bench_with_input(BenchmarkId::new("rank_split", n), &n, |b, _| {
            let mut input = x.clone();
            let mut output = vec![0.0; n * n];
            b.iter(|| {
                execute(&handle, &mut input, &mut output).unwrap();
                black_box(&output);
            })
        });
    }
    group.finish();
}

/// Cost of a cold planning pass, memo cleared each time.
fn bench_planning(c: &mut Criterion) {
    let planner = Planner::with_default_solvers(PlannerConfig::default().with_threads(4));
    let problem = contiguous_problem(&[8, 8, 8], &[RdftKind::R2hc; 3], false).unwrap();
    c.bench_function("plan_8x8x8", |b| {
        b.iter(|| {
            planner.forget();
            black_box(planner.make_plan(&problem).unwrap());
        })
    });
}

criterion_group!(benches, bench_hc2r_threads, bench_r2hc_2d, bench_planning);
criterion_main!(benches);
