//! Logging setup: colored console output plus a rotating file handler.

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::TracingFormat;
use crate::config::Config;

/// Configures and initializes the global subscriber: a level-colored console
/// layer on stdout and a plain-text daily-rotating file layer in the logs
/// directory.
///
/// The returned guard must stay alive for the life of the program so buffered
/// file output is flushed on exit.
pub fn setup_logging(config: &Config, tracing_format: TracingFormat) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&config.scraper_logs_dir).with_context(|| {
        format!(
            "Failed to create logs directory {}",
            config.scraper_logs_dir.display()
        )
    })?;

    let file_appender =
        tracing_appender::rolling::daily(&config.scraper_logs_dir, "sis-scraper.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,sis_scraper={}", config.log_level)));

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true);

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);

    match tracing_format {
        TracingFormat::Pretty => registry
            .with(fmt::layer().with_ansi(true).with_target(true))
            .init(),
        TracingFormat::Json => registry.with(fmt::layer().json().with_target(true)).init(),
    }

    Ok(guard)
}
