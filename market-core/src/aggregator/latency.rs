use std::sync::atomic::{AtomicU64, Ordering};

/// Tracks the aggregator's steady-state processing latency (spec §4.5).
///
/// `avg_latency_ns` is an exponential moving average with smoothing
/// `1/16`: `avg_new = (15*avg_old + sample) / 16`. `max_latency_ns` only
/// ever moves up, via a compare-and-swap loop that retries until the
/// stored value either already dominates the sample or has been replaced.
#[derive(Debug, Default)]
pub struct LatencyTracker {
    avg_ns: AtomicU64,
    max_ns: AtomicU64,
}

impl LatencyTracker {
    pub fn new() -> Self {
        LatencyTracker { avg_ns: AtomicU64::new(0), max_ns: AtomicU64::new(0) }
    }

    /// Folds one new latency sample (nanoseconds) into the running average
    /// and max.
    pub fn record(&self, sample_ns: u64) {
        let mut current = self.avg_ns.load(Ordering::Relaxed);
        loop {
            let updated = (current.saturating_mul(15) + sample_ns) / 16;
            match self.avg_ns.compare_exchange_weak(
                current,
                updated,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }

        let mut current_max = self.max_ns.load(Ordering::Relaxed);
        while sample_ns > current_max {
            match self.max_ns.compare_exchange_weak(
                current_max,
                sample_ns,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => current_max = actual,
            }
        }
    }

    pub fn avg_ns(&self) -> u64 {
        self.avg_ns.load(Ordering::Relaxed)
    }

    pub fn max_ns(&self) -> u64 {
        self.max_ns.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_smooths_toward_repeated_samples() {
        let tracker = LatencyTracker::new();
        for _ in 0..64 {
            tracker.record(1600);
        }
        // After enough repeats the EMA should have converged close to the
        // steady input.
        assert!((tracker.avg_ns() as i64 - 1600).abs() < 5);
    }

    #[test]
    fn max_only_moves_up() {
        let tracker = LatencyTracker::new();
        tracker.record(100);
        tracker.record(500);
        tracker.record(50);
        assert_eq!(tracker.max_ns(), 500);
    }
}
