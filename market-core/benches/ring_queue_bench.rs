use criterion::{black_box, criterion_group, criterion_main, Criterion};
use market_core::{MpscRingQueue, RingQueue};

fn bench_spsc_push_pop(c: &mut Criterion) {
    let queue: RingQueue<u64> = RingQueue::with_capacity(4096);

    c.bench_function("ring_queue/spsc_push_pop_roundtrip", |b| {
        b.iter(|| {
            black_box(queue.try_push(black_box(42)));
            black_box(queue.try_pop());
        })
    });
}

fn bench_spsc_batch_drain(c: &mut Criterion) {
    let queue: RingQueue<u64> = RingQueue::with_capacity(4096);

    c.bench_function("ring_queue/spsc_pop_batch_64", |b| {
        b.iter(|| {
            for i in 0..64u64 {
                queue.try_push(i);
            }
            black_box(queue.pop_batch(64));
        })
    });
}

fn bench_mpsc_push_pop(c: &mut Criterion) {
    let queue: MpscRingQueue<u64> = MpscRingQueue::with_capacity(4096);

    c.bench_function("ring_queue/mpsc_push_pop_roundtrip", |b| {
        b.iter(|| {
            black_box(queue.try_push(black_box(42)));
            black_box(queue.try_pop());
        })
    });
}

criterion_group!(benches, bench_spsc_push_pop, bench_spsc_batch_drain, bench_mpsc_push_pop);
criterion_main!(benches);
