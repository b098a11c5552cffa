//! Runtime (cold-path) configuration, loaded from an optional TOML file.
//!
//! Queue capacities, eviction ages, and parser limits are all read once at
//! startup and never touch the hot path again, so this is a plain runtime
//! TOML layer rather than a compile-time/runtime split.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub spsc_capacity: usize,
    pub mpsc_capacity: usize,
    pub mpsc_max_producers: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        QueueConfig { spsc_capacity: 1 << 16, mpsc_capacity: 1 << 16, mpsc_max_producers: 8 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookConfig {
    pub eviction_max_age_secs: u64,
    pub depth_levels: usize,
}

impl Default for BookConfig {
    fn default() -> Self {
        BookConfig { eviction_max_age_secs: 300, depth_levels: 10 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub max_fields: usize,
    pub enforce_checksum: bool,
    pub calibration_offset_ns: i64,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig { max_fields: 256, enforce_checksum: false, calibration_offset_ns: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub log_level: String,
    pub json_logs: bool,
    pub prometheus_addr: Option<String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        MetricsConfig { log_level: "info".to_string(), json_logs: false, prometheus_addr: None }
    }
}

/// The crate's full set of cold-path runtime knobs (spec §9: ambient
/// concerns, not hot-path parameters, so this is runtime TOML rather than
/// compile-time features).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub queue: QueueConfig,
    pub book: BookConfig,
    pub parser: ParserConfig,
    pub metrics: MetricsConfig,
}

impl RuntimeConfig {
    /// Loads and validates a `RuntimeConfig` from a TOML file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: RuntimeConfig =
            toml::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Sane defaults, usable with no config file present at all.
    pub fn load_default() -> Self {
        RuntimeConfig::default()
    }

    /// Rejects configurations that would violate a core invariant before
    /// they reach the queue/book/parser constructors (spec §4.1: power-of-
    /// two capacity; §4.3/§4.4: non-zero depth and field limits).
    pub fn validate(&self) -> Result<()> {
        if self.queue.spsc_capacity == 0 || !self.queue.spsc_capacity.is_power_of_two() {
            anyhow::bail!("queue.spsc_capacity must be a non-zero power of two");
        }
        if self.queue.mpsc_capacity == 0 || !self.queue.mpsc_capacity.is_power_of_two() {
            anyhow::bail!("queue.mpsc_capacity must be a non-zero power of two");
        }
        if self.queue.mpsc_max_producers == 0 {
            anyhow::bail!("queue.mpsc_max_producers must be positive");
        }
        if self.book.depth_levels == 0 {
            anyhow::bail!("book.depth_levels must be positive");
        }
        if self.parser.max_fields == 0 || self.parser.max_fields > 256 {
            anyhow::bail!("parser.max_fields must be in 1..=256 (the parser's fixed-array bound)");
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.metrics.log_level.as_str()) {
            anyhow::bail!(
                "invalid log level '{}', must be one of: {:?}",
                self.metrics.log_level,
                valid_log_levels
            );
        }

        Ok(())
    }
}
