//! Tracing subscriber setup
//!
//! Available with the `telemetry` feature. The library itself only emits
//! `tracing` events; applications call one of the `init_*` functions once to
//! print them.
//!
//! ## Example
//!
//! ```rust,ignore
//! use aiface::telemetry::{init_subscriber, OutputFormat, SubscriberConfig};
//!
//! let config = SubscriberConfig::builder()
//!     .log_level(tracing::Level::DEBUG)
//!     .output_format(OutputFormat::Json)
//!     .build();
//! let _guard = init_subscriber(config)?;
//! ```

use std::path::PathBuf;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

/// Subscriber setup failure.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Invalid telemetry setting: {0}")]
    InvalidSetting(String),

    #[error("Failed to initialize tracing: {0}")]
    Init(String),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Output format for tracing logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    Json,
    /// Single-line JSON
    JsonCompact,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "json-compact" => Ok(Self::JsonCompact),
            _ => Err(TelemetryError::InvalidSetting(format!(
                "Invalid log format: {value}. Valid options: text, json, json-compact"
            ))),
        }
    }
}

/// Configuration for tracing subscriber
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    pub log_level: tracing::Level,
    pub output_format: OutputFormat,
    /// Write to stderr
    pub enable_console: bool,
    /// Also write to this file through a non-blocking writer
    pub log_file: Option<PathBuf>,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            log_level: tracing::Level::INFO,
            output_format: OutputFormat::Text,
            enable_console: true,
            log_file: None,
        }
    }
}

impl SubscriberConfig {
    pub fn builder() -> SubscriberConfigBuilder {
        SubscriberConfigBuilder::default()
    }

    /// Debug-level text output on the console.
    pub fn debug() -> Self {
        Self {
            log_level: tracing::Level::DEBUG,
            ..Self::default()
        }
    }

    /// Read `AIFACE_LOG_LEVEL`, `AIFACE_LOG_FORMAT` and `AIFACE_LOG_FILE`
    /// through `lookup`. Unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();
        if let Some(level) = lookup("AIFACE_LOG_LEVEL") {
            builder = builder.log_level_str(&level)?;
        }
        if let Some(format) = lookup("AIFACE_LOG_FORMAT") {
            builder = builder.output_format(OutputFormat::parse(&format)?);
        }
        if let Some(path) = lookup("AIFACE_LOG_FILE") {
            builder = builder.log_file(PathBuf::from(path));
        }
        Ok(builder.build())
    }
}

/// Builder for SubscriberConfig
#[derive(Debug, Default)]
pub struct SubscriberConfigBuilder {
    log_level: Option<tracing::Level>,
    output_format: Option<OutputFormat>,
    enable_console: Option<bool>,
    log_file: Option<PathBuf>,
}

impl SubscriberConfigBuilder {
    pub fn log_level(mut self, level: tracing::Level) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Set the log level from a string
    pub fn log_level_str(mut self, level: &str) -> Result<Self> {
        let level = match level.to_lowercase().as_str() {
            "trace" => tracing::Level::TRACE,
            "debug" => tracing::Level::DEBUG,
            "info" => tracing::Level::INFO,
            "warn" => tracing::Level::WARN,
            "error" => tracing::Level::ERROR,
            _ => {
                return Err(TelemetryError::InvalidSetting(format!(
                    "Invalid log level: {level}. Valid options: trace, debug, info, warn, error"
                )));
            }
        };
        self.log_level = Some(level);
        Ok(self)
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn enable_console(mut self, enable: bool) -> Self {
        self.enable_console = Some(enable);
        self
    }

    pub fn log_file(mut self, path: PathBuf) -> Self {
        self.log_file = Some(path);
        self
    }

    pub fn build(self) -> SubscriberConfig {
        SubscriberConfig {
            log_level: self.log_level.unwrap_or(tracing::Level::INFO),
            output_format: self.output_format.unwrap_or_default(),
            enable_console: self.enable_console.unwrap_or(true),
            log_file: self.log_file,
        }
    }
}

/// Install a global subscriber for `aiface` events.
///
/// Returns the file writer guard when file output is enabled; keep it alive
/// for as long as logs should be flushed. An already installed global
/// subscriber is left in place.
pub fn init_subscriber(config: SubscriberConfig) -> Result<Option<WorkerGuard>> {
    let level = config.log_level.to_string().to_lowercase();
    let filter = EnvFilter::new(format!("aiface={level}"));

    let (file_writer, guard) = match &config.log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let file_name = path.file_name().ok_or_else(|| {
                TelemetryError::InvalidSetting(format!(
                    "Log file path has no file name: {}",
                    path.display()
                ))
            })?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let ansi = file_writer.is_none();
    let writer = match (file_writer, config.enable_console) {
        (Some(file), true) => BoxMakeWriter::new(std::io::stderr.and(file)),
        (Some(file), false) => BoxMakeWriter::new(file),
        (None, _) => BoxMakeWriter::new(std::io::stderr),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(true);

    let init_result = match config.output_format {
        OutputFormat::Text => builder.with_ansi(ansi).try_init(),
        OutputFormat::Json => builder.json().with_thread_ids(true).try_init(),
        OutputFormat::JsonCompact => builder.json().flatten_event(true).try_init(),
    };

    match init_result {
        Ok(()) => Ok(guard),
        Err(e) => {
            let error_msg = e.to_string();
            // Either the tracing dispatcher or the `log` bridge was installed earlier.
            if error_msg.contains("already been set") || error_msg.contains("already initialized")
            {
                Ok(None)
            } else {
                Err(TelemetryError::Init(error_msg))
            }
        }
    }
}

pub fn init_default() -> Result<Option<WorkerGuard>> {
    init_subscriber(SubscriberConfig::default())
}

/// Initialize from `AIFACE_LOG_LEVEL`, `AIFACE_LOG_FORMAT` and `AIFACE_LOG_FILE`.
pub fn init_from_env() -> Result<Option<WorkerGuard>> {
    init_subscriber(SubscriberConfig::from_lookup(|key| std::env::var(key).ok())?)
}
