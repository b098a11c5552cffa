//! Bounded, cache-line-aware ring queues used to move typed messages
//! between pipeline stages without blocking (spec §4.1).
//!
//! Two variants are provided:
//! - [`spsc::RingQueue`]: single-producer/single-consumer, the fast path
//!   for one feed driving one aggregator.
//! - [`mpsc::MpscRingQueue`]: many producers, one consumer, used when
//!   several feeds share a single aggregator input.
//!
//! The SPSC ring reserves one slot to distinguish full from empty so
//! neither side needs a separately-maintained item count; the MPSC ring
//! uses a per-slot sequence number for the same purpose instead, so it
//! has no reserved slot and uses its full capacity. Both keep their
//! cursors on distinct cache lines to eliminate false sharing.

pub mod mpsc;
pub mod spsc;

pub use crossbeam_utils::CachePadded;
pub use mpsc::MpscRingQueue;
pub use spsc::RingQueue;

/// Consumer-side view shared by both ring queue variants, so the
/// aggregator (spec §4.5) can be written once against either an SPSC feed
/// from a single producer or an MPSC feed shared by several.
pub trait IngestQueue<T> {
    fn try_pop(&self) -> Option<T>;
    fn pop_batch(&self, max: usize) -> Vec<T>;
    fn len(&self) -> usize;
    fn dropped_count(&self) -> u64;
}

impl<T> IngestQueue<T> for RingQueue<T> {
    fn try_pop(&self) -> Option<T> {
        RingQueue::try_pop(self)
    }
    fn pop_batch(&self, max: usize) -> Vec<T> {
        RingQueue::pop_batch(self, max)
    }
    fn len(&self) -> usize {
        RingQueue::len(self)
    }
    fn dropped_count(&self) -> u64 {
        RingQueue::dropped_count(self)
    }
}

impl<T> IngestQueue<T> for MpscRingQueue<T> {
    fn try_pop(&self) -> Option<T> {
        MpscRingQueue::try_pop(self)
    }
    fn pop_batch(&self, max: usize) -> Vec<T> {
        MpscRingQueue::pop_batch(self, max)
    }
    fn len(&self) -> usize {
        MpscRingQueue::len(self)
    }
    fn dropped_count(&self) -> u64 {
        MpscRingQueue::dropped_count(self)
    }
}
