// src/telemetry.rs

use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{config::Config, error::AppError};

/// Installs the global subscriber: stdout plus a daily file under `config.log_dir`.
///
/// The returned guard flushes the file writer on drop, so keep it alive in `main`.
pub fn init(config: &Config, file_name: &str) -> Result<WorkerGuard, AppError> {
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(file_name)
        .build(&config.log_dir)
        .map_err(|e| AppError::Config(format!("LOG_DIR {}: {}", config.log_dir, e)))?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_new(&config.rust_log)
        .map_err(|e| AppError::Config(format!("RUST_LOG is invalid: {}", e)))?;
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}
