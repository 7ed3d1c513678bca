//! Logging setup
//!
//! Builds one `tracing` subscriber from [`LoggingConfig`]: an `EnvFilter`
//! from the global and per-module levels, a console layer, and optionally a
//! rolling file layer written through a non-blocking appender.

mod config;

#[cfg(test)]
mod tests;

pub use config::{LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig};

use std::path::PathBuf;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

/// Logging system errors
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to initialize logging: {0}")]
    InitializationError(String),

    #[error("Failed to create log directory: {0}")]
    DirectoryCreationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for logging operations
pub type LoggingResult<T> = Result<T, LoggingError>;

/// Installed logging state. Keep it alive for the life of the process;
/// dropping it flushes and stops the file writer.
pub struct LoggingSystem {
    config: LoggingConfig,
    _guards: Vec<WorkerGuard>,
}

impl LoggingSystem {
    /// Install the global subscriber described by `config`
    pub fn init(config: LoggingConfig) -> LoggingResult<Self> {
        let mut guards = Vec::new();
        let env_filter = build_env_filter(&config);
        let registry = tracing_subscriber::registry().with(env_filter);

        match config.output {
            LogOutput::Console => registry
                .with(console_layer(&config))
                .try_init()
                .map_err(|e| LoggingError::InitializationError(e.to_string()))?,
            LogOutput::File => {
                let (file_layer, guard) = file_layer(&config)?;
                guards.push(guard);
                registry
                    .with(file_layer)
                    .try_init()
                    .map_err(|e| LoggingError::InitializationError(e.to_string()))?;
            }
            LogOutput::Both => {
                let (file_layer, guard) = file_layer(&config)?;
                guards.push(guard);
                registry
                    .with(console_layer(&config))
                    .with(file_layer)
                    .try_init()
                    .map_err(|e| LoggingError::InitializationError(e.to_string()))?;
            }
        }

        Ok(Self {
            config,
            _guards: guards,
        })
    }

    /// Get current log directory
    pub fn log_directory(&self) -> Option<&PathBuf> {
        self.config.log_directory.as_ref()
    }

    /// Get current log level
    pub fn log_level(&self) -> LogLevel {
        self.config.level
    }
}

/// Global level plus per-module directives
pub(crate) fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    let mut filter = EnvFilter::new(config.level.to_string());

    for (module, level) in &config.module_levels {
        match format!("{}={}", module, level).parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(e) => eprintln!("ignoring invalid log directive for '{}': {}", module, e),
        }
    }

    filter
}

fn console_layer<S>(config: &LoggingConfig) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    let layer = fmt::layer()
        .with_target(config.include_target)
        .with_thread_ids(config.include_thread_id)
        .with_file(config.include_file_info)
        .with_line_number(config.include_file_info);

    if config.format == LogFormat::Json {
        layer.json().boxed()
    } else {
        layer.boxed()
    }
}

fn file_layer<S>(
    config: &LoggingConfig,
) -> LoggingResult<(Box<dyn Layer<S> + Send + Sync>, WorkerGuard)>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    let log_dir = config
        .log_directory
        .clone()
        .unwrap_or_else(|| PathBuf::from("logs"));
    std::fs::create_dir_all(&log_dir).map_err(|e| {
        LoggingError::DirectoryCreationError(format!(
            "Failed to create log directory {:?}: {}",
            log_dir, e
        ))
    })?;

    let rotation = match config.rotation {
        LogRotation::Daily => Rotation::DAILY,
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Never => Rotation::NEVER,
    };
    let appender = RollingFileAppender::new(rotation, &log_dir, &config.file_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    let layer = fmt::layer()
        .with_writer(non_blocking)
        .with_target(config.include_target)
        .with_thread_ids(config.include_thread_id)
        .with_file(config.include_file_info)
        .with_line_number(config.include_file_info)
        .with_ansi(false);

    if config.format == LogFormat::Json {
        Ok((layer.json().boxed(), guard))
    } else {
        Ok((layer.boxed(), guard))
    }
}
