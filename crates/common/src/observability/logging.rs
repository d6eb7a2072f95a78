//! Logging configuration and subscriber initialization.

use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::subscriber::DefaultGuard;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{ErrorClassification, ErrorSeverity};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON structured logging (default for production).
    #[default]
    Json,
    /// Human-readable multi-line output (for development).
    Pretty,
    /// Single-line human-readable output.
    Compact,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Output format.
    pub format: LogFormat,
    /// `EnvFilter` directive (e.g. `"info"`, `"respool_cache=debug"`).
    pub level: String,
    /// Optional file to write logs to. Logs go to stderr when unset.
    pub output_path: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { format: LogFormat::Json, level: "info".to_string(), output_path: None }
    }
}

impl LogConfig {
    /// Development preset: pretty output at `debug`.
    pub fn development() -> Self {
        Self { format: LogFormat::Pretty, level: "debug".to_string(), output_path: None }
    }

    /// Builds the `EnvFilter` described by `level`.
    ///
    /// # Errors
    /// Returns [`ObservabilityError::InvalidFilter`] when the directive does
    /// not parse.
    pub fn env_filter(&self) -> Result<EnvFilter, ObservabilityError> {
        EnvFilter::try_new(&self.level)
            .map_err(|e| ObservabilityError::InvalidFilter(format!("{}: {}", self.level, e)))
    }
}

/// Errors that can occur during logging initialization.
#[derive(Debug, Error)]
pub enum ObservabilityError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("Failed to open log file: {0}")]
    FileOpen(#[from] std::io::Error),

    #[error("Tracing subscriber already initialized")]
    AlreadyInitialized,
}

impl ErrorClassification for ObservabilityError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::FileOpen(_))
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::AlreadyInitialized => ErrorSeverity::Info,
            Self::InvalidFilter(_) | Self::FileOpen(_) => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<std::time::Duration> {
        None
    }
}

/// Installs the global tracing subscriber described by `config`.
///
/// Call once at application startup.
///
/// # Errors
/// Fails when the filter is invalid, the log file cannot be created, or a
/// global subscriber is already installed.
pub fn init_tracing(config: &LogConfig) -> Result<(), ObservabilityError> {
    let filter = config.env_filter()?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = match (&config.output_path, config.format) {
        (Some(path), format) => {
            let file = std::fs::File::create(path)?;
            let writer = Mutex::new(file);
            match format {
                LogFormat::Json => registry.with(fmt::layer().json().with_writer(writer)).try_init(),
                LogFormat::Pretty => {
                    registry.with(fmt::layer().pretty().with_ansi(false).with_writer(writer)).try_init()
                }
                LogFormat::Compact => registry
                    .with(fmt::layer().compact().with_ansi(false).with_writer(writer))
                    .try_init(),
            }
        }
        (None, LogFormat::Json) => registry.with(fmt::layer().json()).try_init(),
        (None, LogFormat::Pretty) => registry.with(fmt::layer().pretty()).try_init(),
        (None, LogFormat::Compact) => registry.with(fmt::layer().compact()).try_init(),
    };

    result.map_err(|_| ObservabilityError::AlreadyInitialized)
}

fn test_subscriber<W>(filter: EnvFilter, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt().with_env_filter(filter).with_ansi(false).with_writer(writer).finish()
}

/// Routes tracing output through the test harness writer.
///
/// Safe to call from every test; only the first call installs a subscriber.
/// Honours `RUST_LOG`, defaulting to `debug`.
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = test_subscriber(filter, fmt::TestWriter::new()).try_init();
}

/// Sends `debug` and above to `writer` on the current thread until the
/// returned guard drops.
///
/// Used by tests that assert on log output; a global subscriber installed
/// by [`init_test_tracing`] is shadowed while the guard lives.
pub fn capture_test_tracing<W>(writer: W) -> DefaultGuard
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    test_subscriber(EnvFilter::new("debug"), writer).set_default()
}
