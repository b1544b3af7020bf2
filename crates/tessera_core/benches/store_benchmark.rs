//! # Component Store Benchmark
//!
//! REQUIREMENTS:
//! - add / remove / lookup stay O(1) as the store grows
//! - packed iteration runs at raw slice speed
//!
//! Run with: `cargo bench --package tessera_core --bench store_benchmark`

// Benchmarks don't need docs
#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tessera_core::{ComponentStore, EntityId, World};

/// Entity count for the large benchmarks; fits either id width.
const ENTITY_COUNT: usize = 60_000;

#[derive(Clone, Copy, Debug, Default)]
struct Position {
    x: f32,
    y: f32,
    z: f32,
}

fn ids(count: usize) -> Vec<EntityId> {
    (1..=count).filter_map(EntityId::from_index).collect()
}

fn filled_store(count: usize) -> ComponentStore<Position> {
    let mut store = ComponentStore::with_capacity(count);
    for id in ids(count) {
        store.add(id, Position::default()).unwrap();
    }
    store
}

/// Benchmark: Fill a store from empty.
fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_add");

    for count in [1_000, 10_000, ENTITY_COUNT] {
        let ids = ids(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &ids, |b, ids| {
            b.iter(|| {
                let mut store = ComponentStore::new();
                for &id in ids {
                    store.add(id, Position::default()).unwrap();
                }
                black_box(store.len())
            });
        });
    }

    group.finish();
}

/// Benchmark: Random lookups against a full store.
fn bench_random_get(c: &mut Criterion) {
    let store = filled_store(ENTITY_COUNT);
    let mut lookups = ids(ENTITY_COUNT);
    lookups.shuffle(&mut ChaCha8Rng::seed_from_u64(7));
    lookups.truncate(10_000);

    c.bench_function("store_random_get_10K", |b| {
        b.iter(|| {
            let mut sum = 0.0_f32;
            for &id in &lookups {
                if let Some(position) = store.get(id) {
                    sum += position.x;
                }
            }
            black_box(sum)
        });
    });
}

/// Benchmark: Swap-remove then re-add the same ids.
fn bench_remove_add_cycle(c: &mut Criterion) {
    let mut store = filled_store(ENTITY_COUNT);
    let mut cycle = ids(ENTITY_COUNT);
    cycle.shuffle(&mut ChaCha8Rng::seed_from_u64(11));
    cycle.truncate(10_000);

    c.bench_function("store_remove_add_cycle_10K", |b| {
        b.iter(|| {
            for &id in &cycle {
                black_box(store.take(id));
            }
            for &id in &cycle {
                store.add(id, Position::default()).unwrap();
            }
        });
    });
}

/// Benchmark: Packed iteration vs raw slice (theoretical minimum).
fn bench_iteration(c: &mut Criterion) {
    let mut store = filled_store(ENTITY_COUNT);
    let mut raw = vec![Position::default(); ENTITY_COUNT];

    let mut group = c.benchmark_group("iteration");

    group.bench_function("store_iter_mut", |b| {
        b.iter(|| {
            for (_, position) in store.iter_mut() {
                position.x += 0.001;
                position.y += 0.002;
                position.z += 0.003;
            }
            black_box(store.len())
        });
    });

    group.bench_function("raw_slice", |b| {
        b.iter(|| {
            for position in &mut raw {
                position.x += 0.001;
                position.y += 0.002;
                position.z += 0.003;
            }
            black_box(raw.len())
        });
    });

    group.finish();
}

/// Benchmark: Entity create/destroy cycle through the world.
fn bench_create_destroy_cycle(c: &mut Criterion) {
    let mut world = World::new();
    for _ in 0..ENTITY_COUNT / 2 {
        let id = world.create_entity().unwrap();
        world.add(id, Position::default()).unwrap();
    }

    c.bench_function("world_create_destroy_cycle_10K", |b| {
        b.iter(|| {
            let mut created = Vec::with_capacity(10_000);
            for _ in 0..10_000 {
                let id = world.create_entity().unwrap();
                world.add(id, Position::default()).unwrap();
                created.push(id);
            }
            for id in created {
                world.destroy_entity(id).unwrap();
            }
            black_box(world.live_count())
        });
    });
}

criterion_group!(
    benches,
    bench_add,
    bench_random_get,
    bench_remove_add_cycle,
    bench_iteration,
    bench_create_destroy_cycle,
);
criterion_main!(benches);
