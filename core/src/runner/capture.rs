use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::error::ToolError;

use super::display_argv;

/// Runs the tool to completion and returns its raw stdout.
///
/// Used for fast subcommands whose output is consumed as a whole; the wait
/// is bounded by `timeout` and an exceeded bound kills the child.
pub async fn run_capturing(
    tool: &Path,
    argv: &[String],
    timeout: Duration,
) -> Result<String, ToolError> {
    let mut cmd = Command::new(tool);
    cmd.args(argv)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(res) => res.map_err(|e| ToolError::Spawn(e.to_string()))?,
        Err(_) => {
            return Err(ToolError::Timeout {
                command: display_argv(tool, argv),
                timeout_ms: timeout.as_millis() as u64,
            })
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        return Err(ToolError::NonZeroExit {
            exit_code: output.status.code().unwrap_or(-1),
            message: pick_diagnostic(&stderr, &stdout),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Capture variant for JSON-emitting subcommands.
pub async fn run_capturing_json(
    tool: &Path,
    argv: &[String],
    timeout: Duration,
) -> Result<serde_json::Value, ToolError> {
    let stdout = run_capturing(tool, argv, timeout).await?;
    serde_json::from_str(&stdout).map_err(|e| ToolError::MalformedOutput(e.to_string()))
}

/// Failure message for a non-zero exit: stderr, falling back to stdout,
/// trimmed of whitespace.
fn pick_diagnostic(stderr: &str, stdout: &str) -> String {
    let err = stderr.trim();
    if !err.is_empty() {
        return err.to_string();
    }
    stdout.trim().to_string()
}
