//! Benchmarks for weak-signals
//!
//! Run with: cargo bench

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::cell::Cell;
use std::rc::Rc;
use weak_signals::{Signal, SlotResult};

struct Sink {
    total: Cell<u64>,
}

impl Sink {
    fn new() -> Rc<Self> {
        Rc::new(Self {
            total: Cell::new(0),
        })
    }

    fn on_value(&self, value: &u64) -> SlotResult {
        self.total.set(self.total.get().wrapping_add(*value));
        Ok(())
    }
}

// =============================================================================
// CONNECT BENCHMARKS
// =============================================================================

fn bench_connect_method(c: &mut Criterion) {
    let sink = Sink::new();
    c.bench_function("connect_method", |b| {
        b.iter_batched(
            Signal::<u64>::new,
            |signal| {
                signal.connect(&sink, Sink::on_value);
                black_box(signal)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_connect_disconnect(c: &mut Criterion) {
    let sink = Sink::new();
    let signal = Signal::<u64>::new();
    c.bench_function("connect_disconnect", |b| {
        b.iter(|| {
            signal.connect(&sink, Sink::on_value);
            black_box(signal.disconnect(&sink, Sink::on_value))
        })
    });
}

// =============================================================================
// EMIT BENCHMARKS
// =============================================================================

fn bench_emit_empty(c: &mut Criterion) {
    let signal = Signal::<u64>::new();
    c.bench_function("emit_empty", |b| b.iter(|| signal.emit(black_box(1))));
}

fn bench_emit_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit_fanout");

    for count in [1, 10, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("method", count), &count, |b, &count| {
            let sinks: Vec<_> = (0..count).map(|_| Sink::new()).collect();
            let signal = Signal::<u64>::new();
            for sink in &sinks {
                signal.connect(sink, Sink::on_value);
            }
            b.iter(|| signal.emit(black_box(1)))
        });

        group.bench_with_input(BenchmarkId::new("strong", count), &count, |b, &count| {
            let total = Rc::new(Cell::new(0u64));
            let signal = Signal::<u64>::new();
            for _ in 0..count {
                let total = total.clone();
                signal.strong_connect_fn(move |value: &u64| {
                    total.set(total.get().wrapping_add(*value));
                    Ok(())
                });
            }
            b.iter(|| signal.emit(black_box(1)))
        });
    }

    group.finish();
}

fn bench_emit_nested(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit_nested");

    for depth in [1u64, 4, 16] {
        group.bench_with_input(BenchmarkId::new("depth", depth), &depth, |b, &depth| {
            let signal = Rc::new(Signal::<u64>::new());
            let weak = Rc::downgrade(&signal);
            signal.strong_connect_fn(move |level: &u64| {
                if *level < depth {
                    if let Some(signal) = weak.upgrade() {
                        signal.emit(level + 1)?;
                    }
                }
                Ok(())
            });
            b.iter(|| signal.emit(black_box(0)))
        });
    }

    group.finish();
}

// =============================================================================
// COMPACTION BENCHMARKS
// =============================================================================

fn bench_emit_reclaims_dead(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit_reclaims_dead");

    for count in [100, 1000] {
        group.bench_with_input(BenchmarkId::new("half_dead", count), &count, |b, &count| {
            b.iter_batched(
                || {
                    let signal = Signal::<u64>::new();
                    let sinks: Vec<_> = (0..count).map(|_| Sink::new()).collect();
                    for sink in &sinks {
                        signal.connect(sink, Sink::on_value);
                    }
                    // Keep every other owner alive
                    let survivors: Vec<_> = sinks.into_iter().step_by(2).collect();
                    (signal, survivors)
                },
                |(signal, survivors)| {
                    let result = signal.emit(1);
                    black_box((result, survivors))
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(connect_benches, bench_connect_method, bench_connect_disconnect);

criterion_group!(
    emit_benches,
    bench_emit_empty,
    bench_emit_fanout,
    bench_emit_nested,
);

criterion_group!(compaction_benches, bench_emit_reclaims_dead);

criterion_main!(connect_benches, emit_benches, compaction_benches);
