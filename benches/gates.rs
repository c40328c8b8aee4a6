use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use callgate::{
    CallPolicy, DebounceOptions, DebouncePolicy, Debounced, ManualScheduler, ThrottleOptions,
    ThrottlePolicy, Throttled,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Benchmark the pure state machines without a scheduler
fn bench_policy_decisions(c: &mut Criterion) {
    let mut group = c.benchmark_group("policy_decisions");
    group.throughput(Throughput::Elements(1000));

    group.bench_function("debounce_on_call", |b| {
        let mut policy = DebouncePolicy::new(DebounceOptions::new(Duration::from_millis(100)));
        let start = Instant::now();
        b.iter(|| {
            for i in 0..1000u64 {
                let now = start + Duration::from_micros(i);
                black_box(policy.on_call(now, black_box(i)));
            }
        })
    });

    group.bench_function("throttle_on_call", |b| {
        let mut policy = ThrottlePolicy::new(ThrottleOptions::new(Duration::from_millis(100)));
        let start = Instant::now();
        b.iter(|| {
            for i in 0..1000u64 {
                let now = start + Duration::from_micros(i);
                black_box(policy.on_call(now, black_box(i)));
            }
        })
    });

    group.finish();
}

/// Benchmark the full call path, including locking and timer bookkeeping
fn bench_gate_calls(c: &mut Criterion) {
    let mut group = c.benchmark_group("gate_calls");
    group.throughput(Throughput::Elements(1000));

    for max_wait in [None, Some(250u64)] {
        let label = match max_wait {
            Some(ms) => format!("max_wait_{ms}ms"),
            None => "plain".to_string(),
        };

        group.bench_with_input(
            BenchmarkId::new("debounce", &label),
            &max_wait,
            |b, max_wait| {
                let scheduler = ManualScheduler::new();
                let mut builder = Debounced::builder(Duration::from_millis(100))
                    .with_scheduler(Arc::new(scheduler.clone()));
                if let Some(ms) = max_wait {
                    builder = builder.with_max_wait(Duration::from_millis(*ms));
                }
                let gate = builder.build(|n: u64| black_box(n)).unwrap();

                b.iter(|| {
                    for i in 0..1000u64 {
                        black_box(gate.call(black_box(i)));
                        scheduler.advance(Duration::from_millis(1));
                    }
                })
            },
        );
    }

    group.bench_function("throttle", |b| {
        let scheduler = ManualScheduler::new();
        let gate = Throttled::builder(Duration::from_millis(100))
            .with_scheduler(Arc::new(scheduler.clone()))
            .build(|n: u64| black_box(n))
            .unwrap();

        b.iter(|| {
            for i in 0..1000u64 {
                black_box(gate.call(black_box(i)));
                scheduler.advance(Duration::from_millis(1));
            }
        })
    });

    group.finish();
}

/// Benchmark contention on one gate from several threads
fn bench_concurrent_calls(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent");

    for num_threads in [2, 4, 8].iter() {
        group.throughput(Throughput::Elements((*num_threads as u64) * 1000));

        group.bench_with_input(
            BenchmarkId::new("threads", num_threads),
            num_threads,
            |b, &num_threads| {
                let scheduler = ManualScheduler::new();
                let gate = Throttled::builder(Duration::from_millis(100))
                    .with_scheduler(Arc::new(scheduler))
                    .build(|n: u64| black_box(n))
                    .unwrap();

                b.iter(|| {
                    let handles: Vec<_> = (0..num_threads)
                        .map(|_| {
                            let gate = gate.clone();
                            std::thread::spawn(move || {
                                for i in 0..1000u64 {
                                    black_box(gate.call(black_box(i)));
                                }
                            })
                        })
                        .collect();

                    for handle in handles {
                        handle.join().unwrap();
                    }
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_policy_decisions,
    bench_gate_calls,
    bench_concurrent_calls
);
criterion_main!(benches);
