//! Multi-producer/single-consumer bounded ring queue.
//!
//! Producers reserve a slot with a single `fetch_add` on a shared tail
//! counter, rather than serializing on one lock or one CAS loop per push
//! (spec §4.1, §9: "avoid serialising producers on a single counter").
//! Each slot carries its own sequence number, so a producer that has
//! reserved a slot can publish into it independently of every other
//! producer — this is the classic bounded Vyukov MPSC design.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

struct Slot<T> {
    /// Generation sequence. A slot is ready to write when
    /// `sequence == position`, and ready to read when
    /// `sequence == position + 1`.
    sequence: AtomicUsize,
    value: UnsafeCell<MaybeUninit<T>>,
}

pub struct MpscRingQueue<T> {
    buffer: Box<[Slot<T>]>,
    mask: usize,
    tail: AtomicUsize,
    head: AtomicUsize,
    dropped: AtomicU64,
}

unsafe impl<T: Send> Send for MpscRingQueue<T> {}
unsafe impl<T: Send> Sync for MpscRingQueue<T> {}

impl<T> MpscRingQueue<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(2).next_power_of_two();
        let mut buffer = Vec::with_capacity(capacity);
        for i in 0..capacity {
            buffer.push(Slot {
                sequence: AtomicUsize::new(i),
                value: UnsafeCell::new(MaybeUninit::uninit()),
            });
        }

        MpscRingQueue {
            buffer: buffer.into_boxed_slice(),
            mask: capacity - 1,
            tail: AtomicUsize::new(0),
            head: AtomicUsize::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.mask + 1
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Instantaneous occupied-slot count, eventually consistent under
    /// concurrent producers (spec §4.1).
    #[inline]
    pub fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        tail.saturating_sub(head)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reserves a slot and publishes `item` into it. Many threads may call
    /// this concurrently.
    ///
    /// Returns `false` (incrementing [`dropped_count`](Self::dropped_count))
    /// if the queue is full at the moment of reservation.
    pub fn try_push(&self, item: T) -> bool {
        let mut pos = self.tail.load(Ordering::Relaxed);
        loop {
            let slot = &self.buffer[pos & self.mask];
            let seq = slot.sequence.load(Ordering::Acquire);
            let diff = seq as isize - pos as isize;

            if diff == 0 {
                // Slot is free for `pos`. Try to claim it.
                match self.tail.compare_exchange_weak(
                    pos,
                    pos + 1,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        // SAFETY: only the producer that won the CAS above
                        // writes this slot, and the sequence store below
                        // (Release) is what makes the write visible to the
                        // consumer's Acquire load.
                        unsafe {
                            (*slot.value.get()).write(item);
                        }
                        slot.sequence.store(pos + 1, Ordering::Release);
                        return true;
                    }
                    Err(actual) => {
                        pos = actual;
                    }
                }
            } else if diff < 0 {
                // Consumer hasn't caught up to free this slot: queue is full.
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return false;
            } else {
                // Another producer has already advanced the slot past `pos`;
                // re-read tail and retry.
                pos = self.tail.load(Ordering::Relaxed);
            }
        }
    }

    /// Dequeues the oldest item, if any. Must only be called from the
    /// single designated consumer thread.
    pub fn try_pop(&self) -> Option<T> {
        let pos = self.head.load(Ordering::Relaxed);
        let slot = &self.buffer[pos & self.mask];
        let seq = slot.sequence.load(Ordering::Acquire);
        let diff = seq as isize - (pos + 1) as isize;

        if diff != 0 {
            return None;
        }

        // SAFETY: the Acquire load above synchronizes with the producer's
        // Release store, making the write visible. Only the single
        // consumer reads/advances `head`.
        let item = unsafe { (*slot.value.get()).assume_init_read() };
        slot.sequence.store(pos + self.capacity(), Ordering::Release);
        self.head.store(pos + 1, Ordering::Relaxed);
        Some(item)
    }

    /// Drains up to `max` items in FIFO order. Single-consumer only.
    pub fn pop_batch(&self, max: usize) -> Vec<T> {
        let mut out = Vec::with_capacity(max.min(self.capacity()));
        while out.len() < max {
            match self.try_pop() {
                Some(item) => out.push(item),
                None => break,
            }
        }
        out
    }
}

impl<T> Drop for MpscRingQueue<T> {
    fn drop(&mut self) {
        while self.try_pop().is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn single_producer_round_trips() {
        let q: MpscRingQueue<u64> = MpscRingQueue::with_capacity(8);
        for i in 0..5 {
            assert!(q.try_push(i));
        }
        for i in 0..5 {
            assert_eq!(q.try_pop(), Some(i));
        }
        assert_eq!(q.try_pop(), None);
    }

    #[test]
    fn reports_full_and_recovers_after_pop() {
        let q: MpscRingQueue<u64> = MpscRingQueue::with_capacity(4);
        for i in 0..4 {
            assert!(q.try_push(i));
        }
        assert!(!q.try_push(999));
        assert_eq!(q.dropped_count(), 1);

        assert_eq!(q.try_pop(), Some(0));
        assert!(q.try_push(4));
        assert_eq!(q.dropped_count(), 1);
    }

    #[test]
    fn many_producers_deliver_every_item_exactly_once() {
        let q = Arc::new(MpscRingQueue::<u64>::with_capacity(1024));
        let producers = 8;
        let per_producer = 100u64;

        let handles: Vec<_> = (0..producers)
            .map(|p| {
                let q = Arc::clone(&q);
                thread::spawn(move || {
                    for i in 0..per_producer {
                        let value = p as u64 * per_producer + i;
                        while !q.try_push(value) {
                            thread::yield_now();
                        }
                    }
                })
            })
            .collect();

        let mut received = Vec::new();
        let total = producers as u64 * per_producer;
        while (received.len() as u64) < total {
            if let Some(v) = q.try_pop() {
                received.push(v);
            } else {
                thread::yield_now();
            }
        }

        for h in handles {
            h.join().unwrap();
        }

        received.sort_unstable();
        let expected: Vec<u64> = (0..total).collect();
        assert_eq!(received, expected);
        assert_eq!(q.dropped_count(), 0);
    }
}
