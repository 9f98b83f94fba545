//! Criterion benchmarks for complete seeded runs.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use mergesim_bench::{reference_profile, stress_profile};
use mergesim_engine::{IntegrationPolicy, Simulation};

fn bench_reference_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("reference_run");
    for policy in IntegrationPolicy::ALL {
        group.bench_with_input(
            BenchmarkId::from_parameter(policy),
            &policy,
            |b, &policy| {
                b.iter(|| {
                    let mut sim = Simulation::new(reference_profile(42, policy)).unwrap();
                    let outcome = sim.run().unwrap();
                    black_box(sim.report(outcome));
                });
            },
        );
    }
    group.finish();
}

fn bench_stress_run(c: &mut Criterion) {
    c.bench_function("stress_run_merge_queue", |b| {
        b.iter(|| {
            let mut sim =
                Simulation::new(stress_profile(42, IntegrationPolicy::MergeQueue)).unwrap();
            black_box(sim.run().unwrap());
        });
    });
}

criterion_group!(benches, bench_reference_run, bench_stress_run);
criterion_main!(benches);
