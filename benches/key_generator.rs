//! Key 生成性能基准测试

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use link_shorter::keys::{KeyGenerator, KeySpaceCoordinator, next_key};
use link_shorter::services::LinkCollection;
use link_shorter::storage::MemoryLinkStore;
use std::hint::black_box;
use std::sync::Arc;

fn bench_next_key(c: &mut Criterion) {
    let mut group = c.benchmark_group("generator/next_key");

    // 普通递增与整体进位两种情况
    for last in ["a1b2c", "zzzzz"] {
        group.bench_with_input(BenchmarkId::from_parameter(last), last, |b, last| {
            b.iter(|| next_key(black_box(last), 6))
        });
    }

    group.finish();
}

fn bench_generate_batch(c: &mut Criterion) {
    let generator = KeyGenerator::new(6);
    let mut group = c.benchmark_group("generator/batch");

    for size in [1usize, 100, 1_000] {
        let urls: Vec<String> = (0..size).map(|i| format!("https://{}.example", i)).collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &urls, |b, urls| {
            b.iter(|| generator.generate_batch("a1b2", urls))
        });
    }

    group.finish();
}

fn bench_coordinator(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let coordinator = Arc::new(KeySpaceCoordinator::new(
        KeyGenerator::new(8),
        Arc::new(MemoryLinkStore::new()),
    ));
    let urls: Vec<String> = (0..10).map(|i| format!("https://{}.example", i)).collect();

    c.bench_function("coordinator/generate_keys_10", |b| {
        b.to_async(&rt).iter(|| {
            let coord = Arc::clone(&coordinator);
            let urls = urls.clone();
            async move { coord.generate_keys(&urls).await }
        });
    });
}

criterion_group!(benches, bench_next_key, bench_generate_batch, bench_coordinator);
criterion_main!(benches);
