//! Engine throughput benchmarks.
//!
//! Measures single-record puts across worker counts and durability modes,
//! point gets over a warm store, and a full harness run.
//!
//! Run with: cargo bench --bench engine_throughput

use std::sync::Arc;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use kvgauge::{codec, run, DurabilityMode, KvEngine, RocksEngine, RunConfig};

const ITEMS_PER_WORKER: usize = 250;

fn bench_put_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/put_nosync");
    group.measurement_time(Duration::from_secs(10));

    for workers in [1, 2, 4, 8] {
        group.throughput(Throughput::Elements((workers * ITEMS_PER_WORKER) as u64));
        group.bench_function(BenchmarkId::new("workers", workers), |b| {
            b.iter(|| {
                let engine: Arc<dyn KvEngine> =
                    Arc::new(RocksEngine::open_temp().expect("open engine"));

                let handles: Vec<_> = (0..workers)
                    .map(|w| {
                        let engine = Arc::clone(&engine);
                        std::thread::spawn(move || {
                            for idx in w * ITEMS_PER_WORKER..(w + 1) * ITEMS_PER_WORKER {
                                let (key, value) = codec::encode_record(idx, 16, 100);
                                engine
                                    .put(&key, &value, DurabilityMode::NoSync)
                                    .expect("put");
                            }
                        })
                    })
                    .collect();

                for handle in handles {
                    handle.join().expect("worker panicked");
                }
            });
        });
    }

    group.finish();
}

fn bench_put_durability(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/put_durability");
    group.measurement_time(Duration::from_secs(10));
    group.throughput(Throughput::Elements(1));

    for (name, durability) in [
        ("nosync", DurabilityMode::NoSync),
        ("sync", DurabilityMode::Sync),
    ] {
        let engine = RocksEngine::open_temp().expect("open engine");
        let mut counter = 0usize;
        group.bench_function(name, |b| {
            b.iter(|| {
                counter += 1;
                let (key, value) = codec::encode_record(counter, 16, 100);
                engine.put(&key, &value, durability).expect("put");
            });
        });
    }

    group.finish();
}

fn bench_get_point(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/get");
    group.measurement_time(Duration::from_secs(10));
    group.throughput(Throughput::Elements(1));

    let engine = RocksEngine::open_temp().expect("open engine");
    for idx in 0..10_000 {
        let (key, value) = codec::encode_record(idx, 16, 100);
        engine.put(&key, &value, DurabilityMode::NoSync).expect("put");
    }

    let mut next = 0usize;
    group.bench_function("warm_point_read", |b| {
        b.iter(|| {
            next = (next * 6_364_136 + 1_442_695) % 10_000;
            let key = codec::encode_key(next, 16);
            engine.get(&key).expect("get")
        });
    });

    group.finish();
}

fn bench_full_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("harness/run");
    group.measurement_time(Duration::from_secs(15));
    group.sample_size(10);

    let config = RunConfig {
        op_count: 4000,
        workers: 4,
        ..RunConfig::default()
    };
    group.throughput(Throughput::Elements(config.op_count as u64));
    group.bench_function("write_only_4workers", |b| {
        b.iter(|| {
            let engine: Arc<dyn KvEngine> =
                Arc::new(RocksEngine::open_temp().expect("open engine"));
            run(engine, &config).expect("run")
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_put_scaling,
    bench_put_durability,
    bench_get_point,
    bench_full_run
);
criterion_main!(benches);
