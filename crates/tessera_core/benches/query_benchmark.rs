//! # Query Benchmark
//!
//! Multi-type queries must cost in proportion to the rarest component:
//! a query over 60K positions and 600 velocities should touch ~600 entities.
//!
//! Run with: `cargo bench --package tessera_core --bench query_benchmark`

// Benchmarks don't need docs
#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use tessera_core::World;

const ENTITY_COUNT: usize = 60_000;

#[derive(Clone, Copy, Debug, Default)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Clone, Copy, Debug, Default)]
struct Velocity {
    x: f32,
    y: f32,
}

#[derive(Clone, Copy, Debug, Default)]
struct Frozen;

/// Every entity has a position; one in `every` also has a velocity.
fn world_with(every: usize) -> World {
    let mut world = World::new();
    for index in 0..ENTITY_COUNT {
        let id = world.create_entity().unwrap();
        world.add(id, Position::default()).unwrap();
        if index % every == 0 {
            world.add(id, Velocity { x: 1.0, y: 0.5 }).unwrap();
        }
        if index % (every * 2) == 0 {
            world.add(id, Frozen).unwrap();
        }
    }
    world
}

/// Benchmark: Two-type query at varying selectivity.
fn bench_pair_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("pools_pair_for_each");

    for every in [1, 10, 100] {
        let mut world = world_with(every);
        group.bench_with_input(BenchmarkId::from_parameter(every), &every, |b, _| {
            b.iter(|| {
                let mut pools = world.pools::<(Position, Velocity)>().unwrap();
                pools.for_each(|_, position, velocity| {
                    position.x += velocity.x * 0.016;
                    position.y += velocity.y * 0.016;
                });
                black_box(pools.len())
            });
        });
    }

    group.finish();
}

/// Benchmark: Three-type query, ordered so the smallest store is last.
fn bench_triple_query(c: &mut Criterion) {
    let mut world = world_with(10);

    c.bench_function("pools_triple_for_each", |b| {
        b.iter(|| {
            let mut pools = world.pools::<(Position, Velocity, Frozen)>().unwrap();
            let mut visited = 0_usize;
            pools.for_each(|_, position, _, _| {
                position.x += 1.0;
                visited += 1;
            });
            black_box(visited)
        });
    });
}

/// Benchmark: Read-only snapshot fan-out over scoped threads.
fn bench_snapshot_scan(c: &mut Criterion) {
    let mut world = world_with(1);

    c.bench_function("snapshot_scan_4_threads", |b| {
        b.iter(|| {
            let store = world.pool::<Position>().unwrap();
            let snapshot = store.snapshot();
            let chunk = snapshot.len().div_ceil(4).max(1);
            let total: f32 = std::thread::scope(|scope| {
                let handles: Vec<_> = snapshot
                    .dense()
                    .chunks(chunk)
                    .map(|part| scope.spawn(move || part.iter().map(|p| p.x).sum::<f32>()))
                    .collect();
                handles.into_iter().map(|h| h.join().unwrap_or(0.0)).sum()
            });
            black_box(total)
        });
    });
}

criterion_group!(
    benches,
    bench_pair_query,
    bench_triple_query,
    bench_snapshot_scan,
);
criterion_main!(benches);
