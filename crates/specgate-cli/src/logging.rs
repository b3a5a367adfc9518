//! Tracing subscriber setup.
//!
//! Level priority: `--verbose` > `RUST_LOG` > `gatewayConfig.logLevel`.
//! With `logToFile` set, output goes to `logFile` only, through a
//! non-blocking appender; otherwise it goes to stdout.

use std::path::Path;

use specgate_core::{LogLevel, ServerConfig};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::CliError;

/// Filter for the configured level.
pub fn build_filter(level: LogLevel, verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new(LogLevel::Debug.as_filter());
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter()))
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the life of the process. A subscriber that is already installed is left in
/// place.
pub fn init(config: &ServerConfig, verbose: bool) -> Result<Option<WorkerGuard>, CliError> {
    let filter = build_filter(config.log_level, verbose);

    let log_file = config.log_file.as_deref().filter(|_| config.log_to_file);
    let Some(log_file) = log_file else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
            .try_init()
            .ok();
        return Ok(None);
    };

    let (directory, file_name) = split_log_path(log_file)?;
    std::fs::create_dir_all(directory).map_err(|e| {
        CliError::Io(format!(
            "Failed to create log directory {}: {e}",
            directory.display()
        ))
    })?;

    let appender = tracing_appender::rolling::never(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .try_init()
        .ok();
    Ok(Some(guard))
}

/// `logs/gateway.log` → (`logs`, `gateway.log`); a bare file name lives in
/// the working directory.
fn split_log_path(path: &Path) -> Result<(&Path, &std::ffi::OsStr), CliError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| CliError::Config(format!("logFile '{}' is not a file path", path.display())))?;
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Ok((directory, file_name))
}
