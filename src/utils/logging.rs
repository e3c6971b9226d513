//! Logging initialization
//!
//! Human-readable output goes to stderr. When `LOG_DIR` is set, the same events are
//! also written as JSON to a daily rolling file in that directory.

use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_FILTER: &str = "info,vault_warden=debug";

/// Initialize the global tracing subscriber.
///
/// The log level is read from `RUST_LOG` (default `info,vault_warden=debug`).
///
/// The returned `WorkerGuard` must be held by `main` so buffered file output is
/// flushed before the process exits. It is `None` when file logging is disabled.
pub fn init_logging() -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match std::env::var("LOG_DIR") {
        Ok(log_dir) if !log_dir.trim().is_empty() => {
            let file_appender = rolling::daily(log_dir, "vault-warden.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .json()
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_current_span(true)
                .flatten_event(false)
                .with_ansi(false)
                .with_writer(non_blocking)
                .boxed();
            (Some(layer), Some(guard))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .or_else(|err| {
            // Detect "already initialized" via source downcasting
            use std::error::Error;
            if err
                .source()
                .and_then(|s| s.downcast_ref::<tracing::dispatcher::SetGlobalDefaultError>())
                .is_some()
            {
                return Ok(());
            }
            eprintln!("Failed to initialize tracing: {}", err);
            Err(err)
        })
        .ok();

    guard
}
