use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub tool: ToolConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Name or path of the external executable. A bare name is resolved via
    /// a PATH search; a path is used as-is.
    #[serde(default = "default_tool_bin")]
    pub bin: String,

    /// Bounded wait for JSON-emitting subcommands. Streaming subcommands
    /// have no deadline.
    #[serde(default = "default_capture_timeout_ms")]
    pub capture_timeout_ms: u64,

    /// Bounded wait for each per-environment interpreter probe.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    #[serde(default = "default_line_channel_capacity")]
    pub line_channel_capacity: usize,
}

fn default_tool_bin() -> String {
    "conda".to_string()
}

fn default_capture_timeout_ms() -> u64 {
    30_000
}

fn default_probe_timeout_ms() -> u64 {
    5_000
}

fn default_line_channel_capacity() -> usize {
    1024
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            bin: default_tool_bin(),
            capture_timeout_ms: default_capture_timeout_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
            line_channel_capacity: default_line_channel_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default)]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "condabridge_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: false,
            level: default_logging_level(),
            directory: None,
        }
    }
}
