//! Metrics and (optionally) their HTTP exposition. Cold-path observability
//! for the ambient stack (SPEC_FULL.md §E); never touched by the
//! aggregator's hot loop.

mod metrics;
#[cfg(feature = "metrics-server")]
mod server;

pub use metrics::MetricsRegistry;
#[cfg(feature = "metrics-server")]
pub use server::{MetricsServer, MetricsServerConfig};
