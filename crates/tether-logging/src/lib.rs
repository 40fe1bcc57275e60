//! Structured logging for Tether activity logs
//!
//! Every crate in the workspace logs through `tracing`; this crate owns the
//! subscriber setup so binaries and tests configure output the same way.
//!
//! # Features
//!
//! - **JSONL Output**: Structured JSON lines format for log aggregation (default)
//! - **Connector Context**: Scope log entries to the connector being serviced
//! - **File Rotation**: Daily/hourly log rotation via tracing-appender
//!
//! # Quick Start
//!
//! ```ignore
//! use tether_logging::{TetherSubscriberBuilder, LogConfig};
//!
//! // JSONL to console
//! let _guard = TetherSubscriberBuilder::new().init();
//!
//! // Human-readable output during development
//! let _guard = TetherSubscriberBuilder::new()
//!     .with_config(LogConfig::development())
//!     .init();
//! ```
//!
//! # Connector Context
//!
//! Use [`ConnectorContextGuard`] to tag a scope with a connector:
//!
//! ```ignore
//! use tether_core::SimulatedConnector;
//! use tether_logging::ConnectorContextGuard;
//!
//! let feed = SimulatedConnector::new("feed-1");
//! let _guard = ConnectorContextGuard::new(&feed);
//!
//! tracing::info!("Polling feed");
//! ```

pub mod config;
pub mod context;

pub use config::{
    ConsoleConfig, ConsoleTarget, FileConfig, JsonlConfig, LogConfig, RECORD_TARGET,
    RotationStrategy,
};
pub use context::{ConnectorContextData, ConnectorContextGuard, connector_span};

use std::fs::{self, File};

use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Errors raised while installing the subscriber
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log filter '{level}': {reason}")]
    Filter { level: String, reason: String },

    #[error("Failed to open log file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Global subscriber already installed: {0}")]
    AlreadyInitialized(#[from] tracing_subscriber::util::TryInitError),
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Builder for configuring and initializing the Tether logging subscriber
///
/// By default, console output uses JSONL format. Use `LogConfig::development()`
/// for human-readable pretty output during development.
pub struct TetherSubscriberBuilder {
    config: LogConfig,
}

impl TetherSubscriberBuilder {
    /// Create a new subscriber builder with default configuration
    pub fn new() -> Self {
        Self {
            config: LogConfig::default(),
        }
    }

    /// Use a specific configuration
    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the default log level
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config.default_level = level.into();
        self
    }

    /// Enable or disable console output
    pub fn with_console(mut self, enabled: bool) -> Self {
        self.config.console.enabled = enabled;
        self
    }

    /// Use pretty (human-readable) console output
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.config.console.pretty = pretty;
        self
    }

    /// Configure file output
    pub fn with_file_output(mut self, config: FileConfig) -> Self {
        self.config.file = Some(config);
        self
    }

    /// Initialize the subscriber globally
    ///
    /// Returns a guard that must be kept alive for the duration of the program
    /// when file output is enabled. Failures are reported on stderr and leave
    /// logging uninstalled.
    pub fn init(self) -> Option<WorkerGuard> {
        match self.try_init() {
            Ok(guard) => guard,
            Err(e) => {
                eprintln!("Warning: Failed to initialize logging: {}", e);
                None
            }
        }
    }

    /// Try to initialize the subscriber globally
    pub fn try_init(self) -> Result<Option<WorkerGuard>, LoggingError> {
        let (layers, guard) = self.build_layers()?;
        Registry::default().with(layers).try_init()?;
        Ok(guard)
    }

    fn build_layers(&self) -> Result<(Vec<BoxedLayer>, Option<WorkerGuard>), LoggingError> {
        let mut layers: Vec<BoxedLayer> = Vec::new();
        let mut guard = None;

        if self.config.console.enabled {
            let filter = env_filter(self.config.console_level(), self.config.trace_records)?;
            let writer = match self.config.console.target {
                ConsoleTarget::Stdout => BoxMakeWriter::new(std::io::stdout),
                ConsoleTarget::Stderr => BoxMakeWriter::new(std::io::stderr),
            };
            let layer = if self.config.console.pretty {
                tracing_subscriber::fmt::layer()
                    .with_ansi(self.config.console.ansi)
                    .with_target(true)
                    .with_writer(writer)
                    .with_filter(filter)
                    .boxed()
            } else {
                self.jsonl_layer(writer, filter)
            };
            layers.push(layer);
        }

        if let Some(file_config) = &self.config.file {
            let (writer, file_guard) = file_writer(file_config)?;
            let filter = env_filter(&self.config.default_level, self.config.trace_records)?;
            layers.push(self.jsonl_layer(writer, filter));
            guard = Some(file_guard);
        }

        Ok((layers, guard))
    }

    fn jsonl_layer<W>(&self, writer: W, filter: EnvFilter) -> BoxedLayer
    where
        W: for<'w> tracing_subscriber::fmt::MakeWriter<'w> + Send + Sync + 'static,
    {
        let jsonl = &self.config.jsonl;
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(jsonl.include_current_span)
            .with_span_list(jsonl.include_spans)
            .flatten_event(jsonl.flatten_events)
            .with_thread_ids(jsonl.include_thread_info)
            .with_thread_names(jsonl.include_thread_info)
            .with_file(jsonl.include_location)
            .with_line_number(jsonl.include_location)
            .with_writer(writer)
            .with_filter(filter)
            .boxed()
    }
}

impl Default for TetherSubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// RUST_LOG wins over the configured level when it parses
fn env_filter(level: &str, trace_records: bool) -> Result<EnvFilter, LoggingError> {
    let invalid = |reason: String| LoggingError::Filter {
        level: level.to_string(),
        reason,
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| invalid(e.to_string()))?;

    if !trace_records {
        return Ok(filter);
    }
    let directive = format!("{RECORD_TARGET}=trace")
        .parse()
        .map_err(|e: tracing_subscriber::filter::ParseError| invalid(e.to_string()))?;
    Ok(filter.add_directive(directive))
}

/// Truncates for `Never` rotation, appends for the rolling strategies
fn file_writer(config: &FileConfig) -> Result<(NonBlocking, WorkerGuard), LoggingError> {
    let rotation = match config.rotation {
        RotationStrategy::Never => {
            fs::create_dir_all(&config.directory)?;
            let path = config.directory.join(format!("{}.log", config.prefix));
            let file = File::create(path)?;
            return Ok(tracing_appender::non_blocking(file));
        }
        RotationStrategy::Daily => Rotation::DAILY,
        RotationStrategy::Hourly => Rotation::HOURLY,
    };

    let appender = RollingFileAppender::new(rotation, &config.directory, &config.prefix);
    Ok(tracing_appender::non_blocking(appender))
}

/// Initialize logging with default settings (JSONL to console)
pub fn init_default() {
    TetherSubscriberBuilder::new().init();
}

/// Initialize logging for development (verbose, pretty console output)
pub fn init_development() {
    TetherSubscriberBuilder::new()
        .with_config(LogConfig::development())
        .init();
}

/// Initialize logging for testing (minimal output)
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_testing() {
    let _ = TetherSubscriberBuilder::new()
        .with_config(LogConfig::testing())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_creation() {
        let builder = TetherSubscriberBuilder::new();
        assert_eq!(builder.config.default_level, "info");
        assert!(!builder.config.console.pretty);
    }

    #[test]
    fn test_builder_with_config() {
        let builder = TetherSubscriberBuilder::new().with_config(LogConfig::development());
        assert_eq!(builder.config.default_level, "debug");
        assert!(builder.config.console.pretty);
    }

    #[test]
    fn test_builder_overrides() {
        let builder = TetherSubscriberBuilder::new()
            .with_level("trace")
            .with_console(false)
            .with_pretty(true);
        assert_eq!(builder.config.default_level, "trace");
        assert!(!builder.config.console.enabled);
        assert!(builder.config.console.pretty);
    }

    #[test]
    fn test_build_layers_counts_outputs() {
        let builder = TetherSubscriberBuilder::new();
        let (layers, guard) = builder.build_layers().unwrap();
        assert_eq!(layers.len(), 1);
        assert!(guard.is_none());

        let (layers, _) = TetherSubscriberBuilder::new()
            .with_console(false)
            .build_layers()
            .unwrap();
        assert!(layers.is_empty());
    }

    #[test]
    fn test_report_tool_with_record_tracing_builds() {
        let mut config = LogConfig::report_tool();
        config.trace_records = true;
        let (layers, guard) = TetherSubscriberBuilder::new()
            .with_config(config)
            .build_layers()
            .unwrap();
        assert_eq!(layers.len(), 1);
        assert!(guard.is_none());
    }

    #[test]
    fn test_never_rotation_creates_file() {
        let dir = std::env::temp_dir().join(format!("tether-logging-{}", std::process::id()));
        let file_config = FileConfig {
            directory: dir.clone(),
            prefix: "unit".to_string(),
            rotation: RotationStrategy::Never,
        };

        let (layers, guard) = TetherSubscriberBuilder::new()
            .with_console(false)
            .with_file_output(file_config)
            .build_layers()
            .unwrap();
        assert_eq!(layers.len(), 1);
        assert!(guard.is_some());
        assert!(dir.join("unit.log").exists());

        drop(guard);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_invalid_level_is_reported() {
        // Only meaningful when RUST_LOG does not override the level
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let err = env_filter("tether=loud", false).unwrap_err();
        assert!(matches!(err, LoggingError::Filter { .. }));
    }
}
