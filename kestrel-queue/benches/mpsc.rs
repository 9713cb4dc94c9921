//! Benchmarks for MPSC queue performance.
//!
//! Compares kestrel-queue against crossbeam-queue's ArrayQueue.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use crossbeam_queue::ArrayQueue;
use kestrel_queue::mpsc::MpscQueue;
use std::sync::Arc;
use std::thread;

// ============================================================================
// Single-operation latency benchmarks
// ============================================================================

fn bench_mpsc_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("mpsc_latency");

    // Measure single push+pop round-trip latency (no contention)
    group.bench_function("kestrel_mpsc/u64", |b| {
        let queue = MpscQueue::<u64>::with_capacity(1024).unwrap();
        b.iter(|| {
            queue.push(black_box(42u64)).unwrap();
            black_box(queue.pop().unwrap())
        });
    });

    group.bench_function("crossbeam_array/u64", |b| {
        let q = ArrayQueue::<u64>::new(1024);
        b.iter(|| {
            q.push(black_box(42u64)).unwrap();
            black_box(q.pop().unwrap())
        });
    });

    // 48-byte message, the size of an order-book event record
    #[allow(unused)]
    #[derive(Debug, Clone, Copy)]
    struct Message48([u64; 6]);

    group.bench_function("kestrel_mpsc/48b", |b| {
        let queue = MpscQueue::<Message48>::with_capacity(1024).unwrap();
        let msg = Message48([42; 6]);
        b.iter(|| {
            queue.push(black_box(msg)).unwrap();
            black_box(queue.pop().unwrap())
        });
    });

    group.bench_function("crossbeam_array/48b", |b| {
        let q = ArrayQueue::<Message48>::new(1024);
        let msg = Message48([42; 6]);
        b.iter(|| {
            q.push(black_box(msg)).unwrap();
            black_box(q.pop().unwrap())
        });
    });

    group.finish();
}

// ============================================================================
// Multi-producer throughput benchmarks
// ============================================================================

fn bench_mpsc_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("mpsc_throughput");

    const MESSAGES_PER_PRODUCER: usize = 25_000;

    for num_producers in [1, 2, 4, 8] {
        let total_messages = MESSAGES_PER_PRODUCER * num_producers;
        group.throughput(Throughput::Elements(total_messages as u64));

        group.bench_with_input(
            BenchmarkId::new("kestrel_mpsc", num_producers),
            &num_producers,
            |b, &n| {
                b.iter(|| {
                    let queue = Arc::new(MpscQueue::<u64>::with_capacity(1024).unwrap());

                    let handles: Vec<_> = (0..n)
                        .map(|_| {
                            let queue = Arc::clone(&queue);
                            thread::spawn(move || {
                                for i in 0..MESSAGES_PER_PRODUCER {
                                    while queue.push(i as u64).is_err() {
                                        std::hint::spin_loop();
                                    }
                                }
                            })
                        })
                        .collect();

                    let total = MESSAGES_PER_PRODUCER * n;
                    let mut count = 0;
                    while count < total {
                        match queue.pop() {
                            Some(v) => {
                                black_box(v);
                                count += 1;
                            }
                            None => std::hint::spin_loop(),
                        }
                    }

                    for handle in handles {
                        handle.join().unwrap();
                    }

                    assert_eq!(count, total);
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("crossbeam_array", num_producers),
            &num_producers,
            |b, &n| {
                b.iter(|| {
                    let q = Arc::new(ArrayQueue::<u64>::new(1024));

                    let handles: Vec<_> = (0..n)
                        .map(|_| {
                            let q = q.clone();
                            thread::spawn(move || {
                                for i in 0..MESSAGES_PER_PRODUCER {
                                    while q.push(i as u64).is_err() {
                                        std::hint::spin_loop();
                                    }
                                }
                            })
                        })
                        .collect();

                    let total = MESSAGES_PER_PRODUCER * n;
                    let mut count = 0;
                    while count < total {
                        match q.pop() {
                            Some(v) => {
                                black_box(v);
                                count += 1;
                            }
                            None => std::hint::spin_loop(),
                        }
                    }

                    for handle in handles {
                        handle.join().unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

// ============================================================================
// Contention benchmark (many producers, small queue)
// ============================================================================

fn bench_mpsc_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("mpsc_contention");

    const MESSAGES_PER_PRODUCER: usize = 10_000;
    const NUM_PRODUCERS: usize = 8;
    const TOTAL: usize = MESSAGES_PER_PRODUCER * NUM_PRODUCERS;

    group.throughput(Throughput::Elements(TOTAL as u64));

    // Small queue = high contention
    group.bench_function("kestrel_mpsc/small_queue", |b| {
        b.iter(|| {
            let queue = Arc::new(MpscQueue::<u64>::with_capacity(64).unwrap());

            let handles: Vec<_> = (0..NUM_PRODUCERS)
                .map(|_| {
                    let queue = Arc::clone(&queue);
                    thread::spawn(move || {
                        for i in 0..MESSAGES_PER_PRODUCER {
                            while queue.push(i as u64).is_err() {
                                std::hint::spin_loop();
                            }
                        }
                    })
                })
                .collect();

            let mut count = 0;
            while count < TOTAL {
                match queue.pop() {
                    Some(v) => {
                        black_box(v);
                        count += 1;
                    }
                    None => std::hint::spin_loop(),
                }
            }

            for handle in handles {
                handle.join().unwrap();
            }

            assert_eq!(count, TOTAL);
        });
    });

    group.bench_function("crossbeam_array/small_queue", |b| {
        b.iter(|| {
            let q = Arc::new(ArrayQueue::<u64>::new(64));

            let handles: Vec<_> = (0..NUM_PRODUCERS)
                .map(|_| {
                    let q = q.clone();
                    thread::spawn(move || {
                        for i in 0..MESSAGES_PER_PRODUCER {
                            while q.push(i as u64).is_err() {
                                std::hint::spin_loop();
                            }
                        }
                    })
                })
                .collect();

            let mut count = 0;
            while count < TOTAL {
                match q.pop() {
                    Some(v) => {
                        black_box(v);
                        count += 1;
                    }
                    None => std::hint::spin_loop(),
                }
            }

            for handle in handles {
                handle.join().unwrap();
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_mpsc_latency,
    bench_mpsc_throughput,
    bench_mpsc_contention,
);

criterion_main!(benches);
