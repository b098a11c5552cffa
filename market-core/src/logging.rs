//! Structured logging setup built on `tracing`/`tracing-subscriber`.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes the global `tracing` subscriber once for the process.
///
/// `log_level` is used as the default filter when `RUST_LOG` is unset;
/// `json` selects machine-readable output (suited to production log
/// shipping) over the human-readable, thread-annotated format used for
/// local development.
pub fn init_tracing(log_level: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    if json {
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .try_init();
    } else {
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .try_init();
    }
}
