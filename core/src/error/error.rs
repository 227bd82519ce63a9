use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("tool failed: {0}")]
    Tool(#[from] ToolError),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Everything that can go wrong talking to the external tool.
///
/// Probe-level failures during listing enrichment are recovered locally and
/// never surface as one of these; every other kind becomes the terminal
/// `ok:false` result of the invocation.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("conda not found in PATH")]
    NotFound,
    #[error("'{command}' timed out after {timeout_ms} ms")]
    Timeout { command: String, timeout_ms: u64 },
    #[error("{message}")]
    NonZeroExit { exit_code: i32, message: String },
    #[error("malformed JSON from tool: {0}")]
    MalformedOutput(String),
    #[error("spawn failed: {0}")]
    Spawn(String),
    #[error("stream io error: {stream} {source}")]
    StreamIo {
        stream: &'static str,
        source: std::io::Error,
    },
}
