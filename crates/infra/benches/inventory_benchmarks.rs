use std::sync::Arc;

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tempfile::TempDir;
use tokio::runtime::Runtime;

use drumyard_core::DrumId;
use drumyard_infra::{
    InMemoryInventoryStore, InventoryConfig, InventoryEngine, InventoryStore, SqliteInventoryStore,
};
use drumyard_inventory::{Drum, DrumLookup, GridLayout, InventorySnapshot, register};

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn cycle<S: InventoryStore>(rt: &Runtime, engine: &InventoryEngine<S>) {
    rt.block_on(async {
        engine.place_drum("D1", black_box("B2")).await.unwrap();
        engine.retrieve_drum("D1").await.unwrap();
        engine
            .register_or_update_drum("D1", "O-100", "M1")
            .await
            .unwrap();
    });
}

/// One full IN/OUT/re-stage cycle through the engine.
fn bench_place_retrieve_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("place_retrieve_cycle");
    let rt = runtime();

    group.bench_function("in_memory", |b| {
        let engine = InventoryEngine::new(
            Arc::new(InMemoryInventoryStore::new()),
            GridLayout::default(),
        );
        rt.block_on(async {
            engine.initialize().await.unwrap();
            engine.register_or_update_drum("D1", "O-100", "M1").await.unwrap();
        });
        b.iter(|| cycle(&rt, &engine));
    });

    group.sample_size(20);
    group.bench_function("sqlite", |b| {
        let dir = TempDir::new().unwrap();
        let config = InventoryConfig {
            database_url: format!("sqlite://{}", dir.path().join("bench.db").display()),
            ..InventoryConfig::default()
        };
        let engine = rt.block_on(async {
            let store = SqliteInventoryStore::connect(&config).await.unwrap();
            let engine = InventoryEngine::new(Arc::new(store), config.layout.clone());
            engine.initialize().await.unwrap();
            engine.register_or_update_drum("D1", "O-100", "M1").await.unwrap();
            engine
        });
        b.iter(|| cycle(&rt, &engine));
    });

    group.finish();
}

/// Pure domain decision cost, no store involved.
fn bench_domain_decisions(c: &mut Criterion) {
    let mut group = c.benchmark_group("domain_decisions");
    let now = Utc::now();
    let drum_id = DrumId::new("D1").unwrap();
    let drum = register(DrumLookup::NotFound(drum_id), "O-100", "M1", now)
        .unwrap()
        .into_drum();
    let grid = GridLayout::default().seed().remove(0);

    group.bench_function("place", |b| {
        b.iter(|| drum.place(black_box(&grid), now).unwrap());
    });

    let placed = drum.place(&grid, now).unwrap();
    group.bench_function("retrieve", |b| {
        b.iter(|| placed.drum.retrieve(black_box(&placed.grid), now).unwrap());
    });

    group.finish();
}

fn snapshot_with(layout: &GridLayout) -> InventorySnapshot {
    let now = Utc::now();
    let mut drums: Vec<Drum> = Vec::new();
    let mut grids = Vec::new();
    for (i, grid) in layout.seed().into_iter().enumerate() {
        let id = DrumId::new(format!("D{i}")).unwrap();
        let drum = register(DrumLookup::NotFound(id), "O", "M", now)
            .unwrap()
            .into_drum();
        if i % 2 == 0 {
            let placement = drum.place(&grid, now).unwrap();
            drums.push(placement.drum);
            grids.push(placement.grid);
        } else {
            drums.push(drum);
            grids.push(grid);
        }
    }
    InventorySnapshot {
        revision: 1,
        drums,
        grids,
    }
}

/// Invariant audit over progressively larger yards.
fn bench_audit(c: &mut Criterion) {
    let mut group = c.benchmark_group("audit");
    for columns in [3u16, 30, 300] {
        let layout = GridLayout::new("ABCDEFGHIJ".chars(), columns).unwrap();
        let snapshot = snapshot_with(&layout);
        group.throughput(Throughput::Elements(layout.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(layout.len()),
            &snapshot,
            |b, snapshot| b.iter(|| black_box(snapshot.verify())),
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_place_retrieve_cycle,
    bench_domain_decisions,
    bench_audit
);
criterion_main!(benches);
