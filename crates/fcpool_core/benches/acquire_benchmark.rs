//! # Acquire Benchmark
//!
//! Cost of one acquire/activate/deactivate cycle for every selection policy,
//! on a pool of four prototypes with 64 instances each.
//!
//! Run with: `cargo bench --package fcpool_core`

// Benchmarks don't need docs
#![allow(missing_docs)]

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fcpool_core::{
    MultiTypeOptions, MultiTypePool, ObjectPool, PoolContainers, PoolEntry, Poolable,
    PoolingMethod, Prototype, PrototypeCatalog, SingleTypePool,
};

/// Instances per prototype.
const PER_TYPE: usize = 64;

#[derive(Debug, Default)]
struct Particle {
    x: f32,
    y: f32,
}

impl Poolable for Particle {
    fn on_activate(&mut self) {
        self.x = 0.0;
        self.y = 0.0;
    }
}

fn particle(_: &Prototype) -> Particle {
    Particle::default()
}

fn bench_multi_type_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("multi_type_cycle");

    for method in [
        PoolingMethod::SequentialOrder,
        PoolingMethod::InTurnTypeOrder,
        PoolingMethod::InTurnPriorityOrder,
        PoolingMethod::RandomUniformOverInstances,
        PoolingMethod::RandomWeightedByTypeCount,
        PoolingMethod::RandomUniformOverPool,
        PoolingMethod::RandomWeightedByPriority,
    ] {
        let mut catalog = PrototypeCatalog::new();
        let mut containers: PoolContainers<Particle> = PoolContainers::new();
        let entries = ["Spark", "Smoke", "Ember", "Ash"]
            .iter()
            .zip(1u32..)
            .map(|(name, priority)| {
                PoolEntry::new(catalog.register(name), PER_TYPE).with_priority(priority)
            })
            .collect();
        let options = MultiTypeOptions {
            seed: Some(1),
            ..MultiTypeOptions::with_method(method)
        };
        let mut pool = MultiTypePool::new("Particles", entries, options, particle, &mut containers);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{method:?}")),
            &method,
            |b, _| {
                b.iter(|| {
                    let id = pool.spawn(Duration::ZERO);
                    if let Some(id) = id {
                        pool.deactivate(id);
                    }
                    black_box(id)
                });
            },
        );
    }

    group.finish();
}

fn bench_single_type_drain(c: &mut Criterion) {
    let mut catalog = PrototypeCatalog::new();
    let mut containers: PoolContainers<Particle> = PoolContainers::new();
    let entry = PoolEntry::new(catalog.register("Spark"), PER_TYPE).with_growth(false);
    let mut pool = SingleTypePool::new(
        "Sparks",
        Some(entry),
        fcpool_core::ContainerOptions::default(),
        particle,
        &mut containers,
    );

    c.bench_function("single_type_drain_64", |b| {
        b.iter(|| {
            let mut taken = 0;
            while pool.spawn(Duration::ZERO).is_some() {
                taken += 1;
            }
            pool.update_active(|_, _| false);
            black_box(taken)
        });
    });
}

criterion_group!(benches, bench_multi_type_cycle, bench_single_type_drain);
criterion_main!(benches);
