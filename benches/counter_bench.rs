#[macro_use]
extern crate criterion;

use std::sync::Arc;
use std::thread;

use criterion::black_box;
use criterion::Criterion;

use curloop::Counter;

fn contended_increments(threads: usize, per_thread: usize) -> u64 {
    let counter = Arc::new(Counter::new());
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let counter = Arc::clone(&counter);
            thread::spawn(move || {
                for _ in 0..per_thread {
                    counter.increment();
                }
            })
        })
        .collect();

    let mut total = 0;
    for handle in handles {
        handle.join().unwrap();
        total += counter.read_and_reset();
    }
    total + counter.read_and_reset()
}

fn criterion_benchmark(c: &mut Criterion) {
    let counter = Counter::new();
    c.bench_function("increment", |b| b.iter(|| counter.increment()));
    c.bench_function("read_and_reset", |b| {
        b.iter(|| black_box(counter.read_and_reset()))
    });
    c.bench_function("contended_4x10k", |b| {
        b.iter(|| contended_increments(black_box(4), black_box(10_000)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
