//! Logging and tracing setup.
//!
//! Installs a global tracing subscriber writing to stderr, filtered by
//! `RUST_LOG` (default `warn`), in either human-readable or JSON form.

use std::sync::Once;
use tracing::debug;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};

static INIT: Once = Once::new();

const DEFAULT_FILTER: &str = "warn";

/// Another global subscriber may already be set by the embedding program.
fn installed(result: Result<(), TryInitError>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            eprintln!("warning: tracing subscriber not installed: {}", e);
            false
        }
    }
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Initialize the global tracing subscriber.
///
/// `default_filter` applies when `RUST_LOG` is unset; `None` means `warn`.
/// Subsequent calls are ignored.
pub fn init_tracing(default_filter: Option<&str>) {
    INIT.call_once(|| {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_file(true)
            .with_line_number(true);

        let result = tracing_subscriber::registry()
            .with(env_filter(default_filter.unwrap_or(DEFAULT_FILTER)))
            .with(fmt_layer)
            .try_init();

        if installed(result) {
            debug!("Tracing initialized");
        }
    });
}

/// Initialize tracing with JSON output for structured logging.
pub fn init_tracing_json(default_filter: Option<&str>) {
    INIT.call_once(|| {
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_current_span(true);

        let result = tracing_subscriber::registry()
            .with(env_filter(default_filter.unwrap_or(DEFAULT_FILTER)))
            .with(fmt_layer)
            .try_init();

        if installed(result) {
            debug!("Tracing initialized (JSON mode)");
        }
    });
}
