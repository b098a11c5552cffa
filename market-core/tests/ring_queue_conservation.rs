//! Cross-thread conservation tests for both ring queue flavors: every item
//! pushed by a producer is eventually observed by the consumer exactly
//! once, and nothing is silently duplicated or lost under contention.

use market_core::{IngestQueue, MpscRingQueue, RingQueue};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
fn spsc_conserves_every_item_under_concurrent_push_and_pop() {
    let queue: Arc<RingQueue<u64>> = Arc::new(RingQueue::with_capacity(256));
    let total = 20_000u64;

    let producer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            for i in 0..total {
                while !queue.try_push(i) {
                    thread::yield_now();
                }
            }
        })
    };

    let mut received = Vec::with_capacity(total as usize);
    while (received.len() as u64) < total {
        if let Some(v) = queue.try_pop() {
            received.push(v);
        } else {
            thread::yield_now();
        }
    }

    producer.join().unwrap();
    assert_eq!(received, (0..total).collect::<Vec<_>>());
    assert_eq!(queue.dropped_count(), 0);
}

#[test]
fn mpsc_conserves_every_item_across_many_producers() {
    let queue: Arc<MpscRingQueue<u64>> = Arc::new(MpscRingQueue::with_capacity(512));
    let producers = 6;
    let per_producer = 2_000u64;

    let handles: Vec<_> = (0..producers)
        .map(|p| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..per_producer {
                    let value = p as u64 * per_producer + i;
                    while !queue.try_push(value) {
                        thread::yield_now();
                    }
                }
            })
        })
        .collect();

    let total = producers as u64 * per_producer;
    let mut received = Vec::with_capacity(total as usize);
    while (received.len() as u64) < total {
        if let Some(v) = queue.try_pop() {
            received.push(v);
        } else {
            thread::yield_now();
        }
    }

    for h in handles {
        h.join().unwrap();
    }

    received.sort_unstable();
    assert_eq!(received, (0..total).collect::<Vec<_>>());
    assert_eq!(queue.dropped_count(), 0);
}

#[test]
fn ingest_queue_trait_dispatches_identically_for_both_flavors() {
    fn drain_all<Q: IngestQueue<u64>>(q: &Q) -> Vec<u64> {
        q.pop_batch(1_000)
    }

    let spsc: RingQueue<u64> = RingQueue::with_capacity(16);
    for i in 0..10 {
        spsc.try_push(i);
    }
    assert_eq!(drain_all(&spsc), (0..10).collect::<Vec<_>>());

    let mpsc: MpscRingQueue<u64> = MpscRingQueue::with_capacity(16);
    for i in 0..10 {
        mpsc.try_push(i);
    }
    assert_eq!(drain_all(&mpsc), (0..10).collect::<Vec<_>>());
}

#[test]
fn full_queue_increments_dropped_count_exactly_once_per_rejection() {
    let queue: RingQueue<u64> = RingQueue::with_capacity(4);
    let pushed = AtomicUsize::new(0);
    for i in 0..10u64 {
        if queue.try_push(i) {
            pushed.fetch_add(1, Ordering::Relaxed);
        }
    }
    assert_eq!(pushed.load(Ordering::Relaxed) as u64 + queue.dropped_count(), 10);
    assert_eq!(pushed.load(Ordering::Relaxed), 3); // capacity 4, one slot reserved
}
