//! Single-producer/single-consumer bounded ring queue.

use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// A bounded SPSC ring queue with a reserved sentinel slot.
///
/// Capacity is rounded up to the next power of two at construction time,
/// and one slot is always held back: `size() == capacity() - 1` is "full".
/// This sentinel lets the producer and consumer each maintain a single
/// cursor with no separately-tracked count, avoiding any shared counter
/// beyond the two cursors themselves (spec §4.1).
///
/// The producer publishes a written slot by storing the new `tail` with
/// `Release`; the consumer pairs this with an `Acquire` load, so the
/// written item is always visible by the time the consumer observes the
/// advanced tail.
pub struct RingQueue<T> {
    buffer: Box<[UnsafeCell<MaybeUninit<T>>]>,
    mask: usize,
    // Producer-owned cursor: written only by the producer, read by both.
    tail: CachePadded<AtomicUsize>,
    // Consumer-owned cursor: written only by the consumer, read by both.
    head: CachePadded<AtomicUsize>,
    dropped: AtomicU64,
}

// SAFETY: the queue hands off ownership of `T` between exactly one producer
// thread and one consumer thread; the atomic cursors establish the
// happens-before edges needed for that handoff.
unsafe impl<T: Send> Send for RingQueue<T> {}
unsafe impl<T: Send> Sync for RingQueue<T> {}

impl<T> RingQueue<T> {
    /// Creates a queue whose capacity is the next power of two `>= capacity.max(2)`.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(2).next_power_of_two();
        let mut buffer = Vec::with_capacity(capacity);
        buffer.resize_with(capacity, || UnsafeCell::new(MaybeUninit::uninit()));

        RingQueue {
            buffer: buffer.into_boxed_slice(),
            mask: capacity - 1,
            tail: CachePadded::new(AtomicUsize::new(0)),
            head: CachePadded::new(AtomicUsize::new(0)),
            dropped: AtomicU64::new(0),
        }
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.mask + 1
    }

    /// Instantaneous occupied-slot count. Eventually consistent across
    /// threads (spec §4.1): a concurrent producer/consumer may move `len()`
    /// between the two loads used internally.
    #[inline]
    pub fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        // Cursors are kept within `0..capacity` (see `advance`), so the
        // occupied count is `(tail - head) mod capacity`, computed via the
        // same power-of-two mask used to wrap the cursors themselves.
        tail.wrapping_sub(head) & self.mask
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity() - 1
    }

    /// Fraction of usable capacity (`capacity() - 1`) currently occupied.
    #[inline]
    pub fn utilisation(&self) -> f64 {
        self.len() as f64 / (self.capacity() - 1) as f64
    }

    /// Number of pushes rejected because the queue was full.
    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    #[inline(always)]
    fn advance(&self, idx: usize) -> usize {
        (idx + 1) & self.mask
    }

    /// Attempts to enqueue `item`. Never blocks and never allocates.
    ///
    /// Returns `false` (and increments [`dropped_count`](Self::dropped_count))
    /// if the queue is full; `item` is dropped by the caller in that case.
    pub fn try_push(&self, item: T) -> bool {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        let next = self.advance(tail);

        if next == head {
            // Full: one slot reserved, so `next == head` means no room.
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        // SAFETY: `tail` is owned exclusively by the producer; the slot at
        // `tail` is not read by the consumer until `self.tail` is published
        // below, so writing it now is race-free.
        unsafe {
            (*self.buffer[tail].get()).write(item);
        }
        self.tail.store(next, Ordering::Release);
        true
    }

    /// Attempts to dequeue the oldest item, if any.
    pub fn try_pop(&self) -> Option<T> {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);

        if head == tail {
            return None;
        }

        // SAFETY: the Acquire load of `tail` synchronizes with the
        // producer's Release store, so the write at `head` is visible.
        // `head` is owned exclusively by the consumer.
        let item = unsafe { (*self.buffer[head].get()).assume_init_read() };
        self.head.store(self.advance(head), Ordering::Release);
        Some(item)
    }

    /// Drains up to `max` contiguous items in FIFO order.
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

impl<T> Drop for RingQueue<T> {
    fn drop(&mut self) {
        while self.try_pop().is_some() {}
    }
}
