use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tokio::sync::mpsc;

use crate::config::ToolConfig;
use crate::error::ToolError;
use crate::protocol::{Channel, ProtocolSink};

use super::io_pump::{pump_lines, LineStream, LineTap};

/// Spawns the tool and forwards every output line to the sink as it is
/// produced, stdout on the primary channel and stderr on the diagnostic one.
///
/// Blocks the calling task until the child exits and returns the exit code.
/// There is no deadline: these are long-running subcommands with no useful
/// upper bound on duration. The bounded line channel means a slow sink
/// back-pressures the pumps and, through the pipe buffer, the child itself;
/// the whole output is never held in memory.
pub async fn run_streaming(
    tool: &Path,
    argv: &[String],
    cfg: &ToolConfig,
    sink: &dyn ProtocolSink,
) -> Result<i32, ToolError> {
    let mut child = Command::new(tool)
        .args(argv)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ToolError::Spawn(e.to_string()))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| ToolError::Spawn("no stdout".into()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| ToolError::Spawn("no stderr".into()))?;

    let (line_tx, mut line_rx) = mpsc::channel::<LineTap>(cfg.line_channel_capacity);
    let out_task = pump_lines(stdout, line_tx.clone(), LineStream::Stdout);
    let err_task = pump_lines(stderr, line_tx, LineStream::Stderr);

    // Both senders drop at pipe EOF, ending this loop.
    while let Some(tap) = line_rx.recv().await {
        let channel = match tap.stream {
            LineStream::Stdout => Channel::Primary,
            LineStream::Stderr => Channel::Diagnostic,
        };
        sink.progress(&tap.line, channel).await;
    }

    out_task.await.ok();
    err_task.await.ok();

    let status = child
        .wait()
        .await
        .map_err(|e| ToolError::Spawn(e.to_string()))?;
    Ok(status.code().unwrap_or(-1))
}
