//! Logging configuration for Tether processes
//!
//! The activity log emits `debug` for attach/detach bookkeeping, `warn` for
//! listener faults and `trace` for every recorded event. The presets below pick
//! which of those a given kind of process wants to see, and where they go.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Target that carries one `trace` line per recorded event
pub const RECORD_TARGET: &str = "tether_activity::log";

/// Logging configuration for a Tether process
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when RUST_LOG is unset, e.g. `"info"`
    pub default_level: String,

    /// Emit a `trace` line for every event the activity log records
    ///
    /// Off by default; at steady state this is one line per connector event.
    pub trace_records: bool,

    /// Console sink
    pub console: ConsoleConfig,

    /// Rolling JSONL file sink
    pub file: Option<FileConfig>,

    /// Shape of JSONL lines, for both sinks
    pub jsonl: JsonlConfig,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_level: "info".to_string(),
            trace_records: false,
            console: ConsoleConfig::default(),
            file: None,
            jsonl: JsonlConfig::default(),
        }
    }
}

impl LogConfig {
    /// Watching connectors by hand: pretty, coloured, attach/detach visible
    pub fn development() -> Self {
        Self {
            default_level: "debug".to_string(),
            console: ConsoleConfig {
                pretty: true,
                ansi: true,
                ..ConsoleConfig::default()
            },
            ..Default::default()
        }
    }

    /// Long-running service: JSONL files under `log_dir`, nothing on the console
    pub fn production(log_dir: PathBuf) -> Self {
        Self {
            console: ConsoleConfig {
                enabled: false,
                ..ConsoleConfig::default()
            },
            file: Some(FileConfig {
                directory: log_dir,
                ..FileConfig::default()
            }),
            ..Default::default()
        }
    }

    /// Test runs: only listener faults and worse
    pub fn testing() -> Self {
        Self {
            default_level: "warn".to_string(),
            ..Default::default()
        }
    }

    /// Command-line tools whose stdout is a report: JSONL on stderr
    pub fn report_tool() -> Self {
        Self {
            default_level: "warn".to_string(),
            console: ConsoleConfig {
                target: ConsoleTarget::Stderr,
                ..ConsoleConfig::default()
            },
            ..Default::default()
        }
    }

    /// Filter directive for the console sink
    pub fn console_level(&self) -> &str {
        self.console.level.as_deref().unwrap_or(&self.default_level)
    }
}

/// Console sink settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Write to the console at all
    pub enabled: bool,
    /// Human-readable lines instead of JSONL
    pub pretty: bool,
    /// Colour pretty output
    pub ansi: bool,
    /// Which stream receives console output
    pub target: ConsoleTarget,
    /// Console-only filter directive; falls back to `default_level`
    pub level: Option<String>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pretty: false,
            ansi: false,
            target: ConsoleTarget::Stdout,
            level: None,
        }
    }
}

/// Console stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ConsoleTarget {
    #[default]
    Stdout,
    Stderr,
}

/// Rolling file sink settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Directory the log files are written to
    pub directory: PathBuf,
    /// File name prefix; the rotation date is appended
    pub prefix: String,
    /// When to start a new file
    pub rotation: RotationStrategy,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./logs"),
            prefix: "tether-activity".to_string(),
            rotation: RotationStrategy::Daily,
        }
    }
}

/// When the file sink starts a new file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RotationStrategy {
    #[default]
    Daily,
    Hourly,
    /// One `<prefix>.log`, truncated at startup
    Never,
}

/// Shape of each JSONL line
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonlConfig {
    /// Put event fields (`connector`, `listener`, ...) at the top level
    pub flatten_events: bool,
    /// Include the enclosing spans, e.g. the `connector` span
    pub include_spans: bool,
    /// Include the innermost span on its own
    pub include_current_span: bool,
    /// Include thread id and name; producers usually run one per thread
    pub include_thread_info: bool,
    /// Include source file and line
    pub include_location: bool,
}

impl Default for JsonlConfig {
    fn default() -> Self {
        Self {
            flatten_events: true,
            include_spans: true,
            include_current_span: true,
            include_thread_info: true,
            include_location: false,
        }
    }
}
