//! Prometheus metrics for the ingestion pipeline.
//!
//! Tracks `messages_parsed`, `parse_errors`, `dropped_messages`,
//! `messages_processed`, `avg_latency_ns`, `max_latency_ns`, `queue_depth`,
//! plus a per-symbol `active_books` gauge.

use crate::aggregator::AggregatorMetrics;
use prometheus::{Gauge, IntCounter, IntGauge, Opts, Registry};
use tracing::info;

/// Central registry for the core's Prometheus metric families.
pub struct MetricsRegistry {
    registry: Registry,
    messages_parsed: IntCounter,
    parse_errors: IntCounter,
    dropped_messages: IntCounter,
    messages_processed: IntCounter,
    avg_latency_ns: Gauge,
    max_latency_ns: Gauge,
    queue_depth: IntGauge,
    active_books: IntGauge,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let messages_parsed = IntCounter::with_opts(
            Opts::new("messages_parsed_total", "Total wire frames successfully parsed")
                .namespace("market_core"),
        )?;
        let parse_errors = IntCounter::with_opts(
            Opts::new("parse_errors_total", "Total wire frames rejected by the parser")
                .namespace("market_core"),
        )?;
        let dropped_messages = IntCounter::with_opts(
            Opts::new("dropped_messages_total", "Total messages dropped by a full ring queue")
                .namespace("market_core"),
        )?;
        let messages_processed = IntCounter::with_opts(
            Opts::new("messages_processed_total", "Total messages applied to the book manager")
                .namespace("market_core"),
        )?;
        let avg_latency_ns = Gauge::with_opts(
            Opts::new("avg_latency_ns", "EMA of dequeue-to-apply latency, nanoseconds")
                .namespace("market_core"),
        )?;
        let max_latency_ns = Gauge::with_opts(
            Opts::new("max_latency_ns", "Highest observed dequeue-to-apply latency, nanoseconds")
                .namespace("market_core"),
        )?;
        let queue_depth = IntGauge::with_opts(
            Opts::new("queue_depth", "Instantaneous ring queue occupancy").namespace("market_core"),
        )?;
        let active_books = IntGauge::with_opts(
            Opts::new("active_books", "Number of symbols with a live book").namespace("market_core"),
        )?;

        registry.register(Box::new(messages_parsed.clone()))?;
        registry.register(Box::new(parse_errors.clone()))?;
        registry.register(Box::new(dropped_messages.clone()))?;
        registry.register(Box::new(messages_processed.clone()))?;
        registry.register(Box::new(avg_latency_ns.clone()))?;
        registry.register(Box::new(max_latency_ns.clone()))?;
        registry.register(Box::new(queue_depth.clone()))?;
        registry.register(Box::new(active_books.clone()))?;

        info!("prometheus metrics registry initialized");

        Ok(MetricsRegistry {
            registry,
            messages_parsed,
            parse_errors,
            dropped_messages,
            messages_processed,
            avg_latency_ns,
            max_latency_ns,
            queue_depth,
            active_books,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Copies an [`AggregatorMetrics`] snapshot into the Prometheus gauges
    /// and counters. Counters only move forward, matching their source
    /// atomics; this recomputes the delta against the counter's current
    /// value since `prometheus::IntCounter` has no direct "set" operation.
    pub fn observe_aggregator(&self, snapshot: AggregatorMetrics) {
        bump_counter_to(&self.messages_parsed, snapshot.messages_parsed);
        bump_counter_to(&self.parse_errors, snapshot.parse_errors);
        bump_counter_to(&self.dropped_messages, snapshot.dropped_messages);
        bump_counter_to(&self.messages_processed, snapshot.messages_processed);
        self.avg_latency_ns.set(snapshot.avg_latency_ns as f64);
        self.max_latency_ns.set(snapshot.max_latency_ns as f64);
        self.queue_depth.set(snapshot.queue_depth as i64);
    }

    pub fn set_active_books(&self, count: usize) {
        self.active_books.set(count as i64);
    }
}

fn bump_counter_to(counter: &IntCounter, target: u64) {
    let current = counter.get();
    if target > current {
        counter.inc_by(target - current);
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new().unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to create metrics registry");
            panic!("cannot create metrics registry: {e}")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observe_aggregator_moves_counters_forward_only() {
        let registry = MetricsRegistry::new().unwrap();
        registry.observe_aggregator(AggregatorMetrics {
            messages_processed: 5,
            ..Default::default()
        });
        assert_eq!(registry.messages_processed.get(), 5);

        registry.observe_aggregator(AggregatorMetrics {
            messages_processed: 5,
            ..Default::default()
        });
        assert_eq!(registry.messages_processed.get(), 5, "counter must not double-count a repeat snapshot");

        registry.observe_aggregator(AggregatorMetrics {
            messages_processed: 9,
            ..Default::default()
        });
        assert_eq!(registry.messages_processed.get(), 9);
    }
}
