//! # Logging Utilities
//!
//! Logging infrastructure for stabsym using `tracing`.
//!
//! The symbol loader reports every rejected STABS record through `tracing`, so
//! the subscriber configured here decides where those diagnostics end up:
//! - Pretty or JSON output on stderr
//! - Optional daily-rolled log file
//! - Level filtering through `RUST_LOG`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stabsym_utils::init_logging;
//!
//! // Reads RUST_LOG, STABSYM_LOG_FORMAT and STABSYM_LOG_FILE
//! let _guard = init_logging().expect("Failed to initialize logging");
//!
//! tracing::info!("Loading symbols");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Level filter (e.g., `RUST_LOG=debug`, `RUST_LOG=stabsym_core=trace`)
//! - `STABSYM_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
//! - `STABSYM_LOG_FILE`: Optional log file path. A directory gets a dated file name.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use stabsym_utils::{LogFormat, LogLevel, init_logging_with_level};
//!
//! let _guard = init_logging_with_level(LogLevel::Debug, LogFormat::Pretty)
//!     .expect("Failed to initialize logging");
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, io};

use chrono::Utc;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable selecting the output format.
pub const LOG_FORMAT_ENV: &str = "STABSYM_LOG_FORMAT";

/// Environment variable naming the optional log file.
pub const LOG_FILE_ENV: &str = "STABSYM_LOG_FILE";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat
{
    /// Pretty-printed, human-readable format
    #[default]
    Pretty,
    /// JSON format, one object per event
    Json,
}

impl FromStr for LogFormat
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(LogFormat::Pretty),
            "json" | "prod" | "production" => Ok(LogFormat::Json),
            _ => Err(LoggingError::InvalidFormat(s.to_string())),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel
{
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level (default)
    #[default]
    Info,
    /// Debug level
    Debug,
    /// Trace level (most verbose)
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(LoggingError::InvalidLevel(s.to_string())),
        }
    }
}

/// Resolved logging configuration.
///
/// `level` is only the fallback: a parseable `RUST_LOG` directive always wins so
/// per-module filters such as `stabsym_core::stabs=trace` keep working.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogConfig
{
    /// Fallback level when `RUST_LOG` is unset or invalid.
    pub level: LogLevel,
    /// Console and file output format.
    pub format: LogFormat,
    /// Optional log file (or directory for a dated file).
    pub file: Option<PathBuf>,
}

impl LogConfig
{
    /// Build a configuration from `RUST_LOG`, `STABSYM_LOG_FORMAT` and `STABSYM_LOG_FILE`.
    ///
    /// Unparseable values fall back to the defaults.
    #[must_use]
    pub fn from_env() -> Self
    {
        let format = env::var(LOG_FORMAT_ENV)
            .ok()
            .and_then(|s| LogFormat::from_str(&s).ok())
            .unwrap_or_default();

        let level = env::var("RUST_LOG")
            .ok()
            .and_then(|s| LogLevel::from_str(&s).ok())
            .unwrap_or_default();

        let file = env::var_os(LOG_FILE_ENV).filter(|value| !value.is_empty()).map(PathBuf::from);

        Self { level, format, file }
    }

    /// Set the fallback level.
    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self
    {
        self.level = level;
        self
    }

    /// Set the output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self
    {
        self.format = format;
        self
    }

    /// Also write events to `path`.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self
    {
        self.file = Some(path.into());
        self
    }
}

/// Keeps the non-blocking file writer alive.
///
/// Dropping the guard flushes buffered file output. Hold it for as long as
/// logging should reach the file.
#[derive(Debug, Default)]
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard
{
    file: Option<WorkerGuard>,
}

impl LoggingGuard
{
    /// Whether a file writer is attached.
    pub fn has_file(&self) -> bool
    {
        self.file.is_some()
    }
}

/// Initialize logging from the environment.
///
/// ## Errors
///
/// Returns an error if a global subscriber is already installed or the log
/// file directory cannot be created.
pub fn init_logging() -> Result<LoggingGuard, LoggingError>
{
    init_logging_with_config(&LogConfig::from_env())
}

/// Initialize logging with an explicit level and format.
///
/// `STABSYM_LOG_FILE` is still honoured.
///
/// ## Errors
///
/// Returns an error if a global subscriber is already installed or the log
/// file directory cannot be created.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<LoggingGuard, LoggingError>
{
    let config = LogConfig::from_env().with_level(level).with_format(format);
    init_logging_with_config(&config)
}

/// Initialize logging from a resolved configuration.
///
/// ## Errors
///
/// Returns [`LoggingError::InitializationFailed`] when a global subscriber is
/// already installed and [`LoggingError::FileError`] when the log directory
/// cannot be created.
pub fn init_logging_with_config(config: &LogConfig) -> Result<LoggingGuard, LoggingError>
{
    let default_level: Level = config.level.into();
    let console = console_layer(config.format, build_filter(default_level));

    let mut layers = vec![console];
    let mut guard = LoggingGuard::default();
    if let Some(path) = &config.file {
        let path = resolve_log_file(path);
        let directory = path.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        std::fs::create_dir_all(&directory)?;
        let file_name = path.file_name().map(ToOwned::to_owned).unwrap_or_default();
        let appender = tracing_appender::rolling::daily(directory, file_name);
        let (writer, worker) = tracing_appender::non_blocking(appender);
        guard.file = Some(worker);
        layers.push(file_layer(config.format, writer, build_filter(default_level)));
    }

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|err| LoggingError::InitializationFailed(err.to_string()))?;

    Ok(guard)
}

/// Turn a configured log path into a file path.
///
/// Paths naming an existing directory, or ending in a separator, get a
/// `YYYY-MM-DD-stabsym.log` file inside them.
#[must_use]
pub fn resolve_log_file(path: &Path) -> PathBuf
{
    let names_directory = path.is_dir() || path.as_os_str().to_string_lossy().ends_with(std::path::MAIN_SEPARATOR);
    if names_directory {
        let today = Utc::now().format("%Y-%m-%d");
        path.join(format!("{today}-stabsym.log"))
    } else {
        path.to_path_buf()
    }
}

fn build_filter(default_level: Level) -> EnvFilter
{
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level.to_string()))
}

fn console_layer(format: LogFormat, filter: EnvFilter) -> BoxedLayer
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(true)
            .with_writer(io::stderr)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(io::stderr)
            .with_filter(filter)
            .boxed(),
    }
}

fn file_layer(format: LogFormat, writer: tracing_appender::non_blocking::NonBlocking, filter: EnvFilter) -> BoxedLayer
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(false)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_current_span(true)
            .with_span_list(true)
            .with_filter(filter)
            .boxed(),
    }
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Unknown log format: {0}. Use 'pretty' or 'json'")]
    InvalidFormat(String),

    /// Invalid log level
    #[error("Unknown log level: {0}. Use 'error', 'warn', 'info', 'debug', or 'trace'")]
    InvalidLevel(String),

    /// A global subscriber was already installed
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}
