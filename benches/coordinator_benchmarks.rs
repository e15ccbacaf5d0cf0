//! Benchmarks для координатора запросов.
//!
//! Измеряется стоимость `submit` без debounce-ожидания: пачка запросов,
//! из которых до бэкенда доходит только последний.
//!
//! Запуск: `cargo bench --bench coordinator_benchmarks`

use std::{hint::black_box, sync::Arc};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sightline::{IndexBackend, PrefixIndex, QueryConfig, QueryCoordinator, SpatialIndex};
use tokio::runtime::Runtime;

fn backend() -> Arc<IndexBackend<u32>> {
    let backend = IndexBackend::new(
        PrefixIndex::default(),
        SpatialIndex::new(&Default::default()).unwrap(),
        &QueryConfig::default(),
    )
    .unwrap();
    for w in ["kot", "kotlin", "kola", "kazan", "moscow"] {
        backend.insert_word(w).unwrap();
    }
    Arc::new(backend)
}

/// Benchmark: пачка `submit` с последующим ожиданием единственного ответа.
fn bench_submit_burst(c: &mut Criterion) {
    let mut group = c.benchmark_group("coordinator_submit_burst");
    let rt = Runtime::new().unwrap();
    let backend = backend();

    for burst in [1, 10, 100] {
        group.throughput(Throughput::Elements(burst as u64));
        group.bench_function(BenchmarkId::from_parameter(burst), |b| {
            b.to_async(&rt).iter(|| {
                let backend = backend.clone();
                async move {
                    let config = QueryConfig {
                        debounce_ms: 0,
                        ..QueryConfig::default()
                    };
                    let (coordinator, mut rx) = QueryCoordinator::<u32>::new(backend, &config);
                    for i in 0..burst {
                        coordinator.submit(format!("k{}", i % 3).as_str()).unwrap();
                    }
                    black_box(rx.recv().await)
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_submit_burst);
criterion_main!(benches);
