//! Logging utilities for the GoForCab shell.
//!
//! All crates log through `tracing`; this module installs the subscriber once
//! at process start.

use goforcab_config::LoggingConfig;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize logging from the `logging` configuration section.
///
/// When `directory` is set, a daily rolling file is written next to the
/// console output. The returned guard must be held for the lifetime of the
/// process, otherwise buffered file output is lost.
pub fn init_with_config(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = build_filter(&config.level);

    let console = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    match &config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "goforcab.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);

            let result = tracing_subscriber::registry()
                .with(console)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .with(filter)
                .try_init();

            if result.is_ok() {
                info!(
                    "Logging initialized at level {} (file output in {})",
                    config.level, directory
                );
            }
            Some(guard)
        }
        None => {
            let result = tracing_subscriber::registry()
                .with(console)
                .with(filter)
                .try_init();

            if result.is_ok() {
                info!("Logging initialized at level: {}", config.level);
            }
            None
        }
    }
}

fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Log an error with context at the ERROR level.
pub fn log_error<E: std::fmt::Display>(error: E, context: &str) {
    error!("{}: {}", context, error);
}

/// Log a result, with different messages for success and error cases.
///
/// Passes the result through so the call can sit in a chain.
pub fn log_result<T, E: std::fmt::Display>(
    result: Result<T, E>,
    success_message: &str,
    error_context: &str,
) -> Result<T, E> {
    match &result {
        Ok(_) => info!("{}", success_message),
        Err(e) => error!("{}: {}", error_context, e),
    }
    result
}
