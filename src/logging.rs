use crate::config::LogConfig;
use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "blindtest=info,warn";

/// Installs the global subscriber: console output plus, when
/// `config.directory` is set, a daily-rolling JSON file.
///
/// The returned guard flushes the file writer when dropped, so the caller
/// keeps it alive for as long as it wants logs written.
pub fn init_logging(config: &LogConfig) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directives = config.filter.as_deref().unwrap_or(DEFAULT_FILTER);
        EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    });

    let console_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);

    let directory = usable_log_directory(config);

    let (file_layer, guard) = match directory {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "blindtest.log");
            let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer().json().with_writer(non_blocking_writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    guard
}

/// The configured log directory, created if needed. `None` when unset or
/// when it cannot be created; the failure goes to stderr since no
/// subscriber is installed yet.
fn usable_log_directory(config: &LogConfig) -> Option<&Path> {
    let dir = config.directory.as_deref()?;
    match fs::create_dir_all(dir) {
        Ok(()) => Some(dir),
        Err(e) => {
            eprintln!(
                "Cannot create log directory {}: {}; logging to console only",
                dir.display(),
                e
            );
            None
        }
    }
}
