//! Operation dispatch: maps a typed operation onto one external invocation
//! shape (capture, stream, enrichment, workflow) and emits exactly one
//! terminal result.

mod export;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;

use crate::config::ToolConfig;
use crate::context::AppContext;
use crate::enrich;
use crate::locate::locate;
use crate::protocol::{Channel, ExecutionResult, ProtocolSink};
use crate::runner;
use crate::workflow::{WorkflowOrchestrator, WorkflowStep};

pub use export::{rewrite_flat, rewrite_structured};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// YAML environment file (`env export`).
    Structured,
    /// One `name=version=build` pin per line (`list --export`).
    Flat,
}

/// A fully-typed request from the caller. Constructed once from CLI input,
/// consumed once by [`dispatch`].
#[derive(Debug, Clone)]
pub enum Operation {
    Probe,
    EnvList,
    PkgList {
        prefix: String,
    },
    EnvCreate {
        name: String,
        python: String,
    },
    EnvRemove {
        prefix: String,
    },
    EnvRename {
        old_name: String,
        new_name: String,
    },
    EnvExport {
        name: String,
        file: PathBuf,
        format: ExportFormat,
        no_build: bool,
    },
    EnvImport {
        file: PathBuf,
        name: String,
    },
    EnvClone {
        source: String,
        dest: String,
    },
}

impl Operation {
    /// Wire identifier used in the `command` field of the terminal result.
    pub fn command(&self) -> &'static str {
        match self {
            Operation::Probe => "probe",
            Operation::EnvList => "env-list",
            Operation::PkgList { .. } => "pkg-list",
            Operation::EnvCreate { .. } => "env-create",
            Operation::EnvRemove { .. } => "env-remove",
            Operation::EnvRename { .. } => "env-rename",
            Operation::EnvExport { .. } => "env-export",
            Operation::EnvImport { .. } => "env-import",
            Operation::EnvClone { .. } => "env-clone",
        }
    }
}

/// Single entry point of the core.
///
/// Emits exactly one terminal result on the sink, after any progress lines,
/// and returns it for exit-code mapping. When the external tool cannot be
/// located, every operation fails here without spawning anything.
pub async fn dispatch(
    op: Operation,
    ctx: &AppContext,
    sink: &dyn ProtocolSink,
) -> ExecutionResult {
    let result = match locate(&ctx.cfg().tool) {
        Some(tool) => execute(&op, &tool, &ctx.cfg().tool, sink).await,
        None => {
            tracing::warn!(command = op.command(), "external tool not found");
            ExecutionResult::failure(op.command(), "conda not found in PATH")
        }
    };
    sink.result(&result).await;
    result
}

async fn execute(
    op: &Operation,
    tool: &Path,
    cfg: &ToolConfig,
    sink: &dyn ProtocolSink,
) -> ExecutionResult {
    let command = op.command();
    match op {
        Operation::Probe => capture_json(command, tool, cfg, argv(&["info", "--json"]), sink).await,
        Operation::EnvList => env_list(command, tool, cfg, sink).await,
        Operation::PkgList { prefix } => {
            capture_json(
                command,
                tool,
                cfg,
                argv(&["list", "--prefix", prefix, "--json"]),
                sink,
            )
            .await
        }
        Operation::EnvCreate { name, python } => {
            stream_op(
                command,
                tool,
                cfg,
                argv(&["create", "--name", name, &format!("python={python}"), "--yes"]),
                sink,
            )
            .await
        }
        Operation::EnvRemove { prefix } => {
            stream_op(
                command,
                tool,
                cfg,
                argv(&["remove", "--prefix", prefix, "--all", "--yes"]),
                sink,
            )
            .await
        }
        Operation::EnvClone { source, dest } => {
            stream_op(command, tool, cfg, clone_argv(source, dest), sink).await
        }
        Operation::EnvRename { old_name, new_name } => {
            let mut wf = WorkflowOrchestrator::new(
                command,
                vec![
                    WorkflowStep::new("clone", clone_argv(old_name, new_name)).with_leftover(
                        format!(
                            "clone to '{new_name}' succeeded and was not rolled back; \
                             remove '{old_name}' manually"
                        ),
                    ),
                    WorkflowStep::new(
                        "remove",
                        argv(&["remove", "--name", old_name, "--all", "--yes"]),
                    ),
                ],
            );
            wf.run(tool, cfg, sink).await
        }
        Operation::EnvImport { file, name } => {
            stream_op(
                command,
                tool,
                cfg,
                argv(&[
                    "env",
                    "create",
                    "--name",
                    name,
                    "--file",
                    &file.to_string_lossy(),
                    "--yes",
                ]),
                sink,
            )
            .await
        }
        Operation::EnvExport {
            name,
            file,
            format,
            no_build,
        } => export::run(command, name, file, *format, *no_build, tool, cfg, sink).await,
    }
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

fn clone_argv(source: &str, dest: &str) -> Vec<String> {
    argv(&["create", "--name", dest, "--clone", source, "--yes"])
}

/// Read-only queries: capture stdout as JSON, bounded wait.
async fn capture_json(
    command: &str,
    tool: &Path,
    cfg: &ToolConfig,
    args: Vec<String>,
    sink: &dyn ProtocolSink,
) -> ExecutionResult {
    match run_json(command, tool, cfg, &args, sink).await {
        Ok(data) => ExecutionResult::success(command, Some(data)),
        Err(result) => result,
    }
}

/// Shared capture path; the error branch already carries the diagnostic
/// progress line and the terminal failure.
async fn run_json(
    command: &str,
    tool: &Path,
    cfg: &ToolConfig,
    args: &[String],
    sink: &dyn ProtocolSink,
) -> Result<Value, ExecutionResult> {
    sink.progress(
        &format!("Executing: {}", runner::display_argv(tool, args)),
        Channel::Primary,
    )
    .await;
    let timeout = Duration::from_millis(cfg.capture_timeout_ms);
    match runner::run_capturing_json(tool, args, timeout).await {
        Ok(data) => Ok(data),
        Err(e) => {
            sink.progress(
                &format!("Error during '{command}': {e}"),
                Channel::Diagnostic,
            )
            .await;
            Err(ExecutionResult::failure(command, e.to_string()))
        }
    }
}

/// Single-step mutating operations: stream output live, success is exit 0.
async fn stream_op(
    command: &str,
    tool: &Path,
    cfg: &ToolConfig,
    args: Vec<String>,
    sink: &dyn ProtocolSink,
) -> ExecutionResult {
    sink.progress(
        &format!("Executing: {}", runner::display_argv(tool, &args)),
        Channel::Primary,
    )
    .await;
    match runner::run_streaming(tool, &args, cfg, sink).await {
        Ok(0) => {
            sink.progress(&format!("'{command}' successful."), Channel::Primary)
                .await;
            ExecutionResult::success(command, None)
        }
        Ok(exit_code) => {
            sink.progress(
                &format!("'{command}' failed with exit code {exit_code}."),
                Channel::Diagnostic,
            )
            .await;
            ExecutionResult::failure(command, format!("process failed with exit code {exit_code}"))
        }
        Err(e) => ExecutionResult::failure(command, e.to_string()),
    }
}

/// Listing with enrichment: the tool reports environment paths, each path is
/// probed concurrently, output order follows the tool's reported order.
async fn env_list(
    command: &str,
    tool: &Path,
    cfg: &ToolConfig,
    sink: &dyn ProtocolSink,
) -> ExecutionResult {
    let data = match run_json(command, tool, cfg, &argv(&["env", "list", "--json"]), sink).await {
        Ok(data) => data,
        Err(result) => return result,
    };

    let paths: Vec<String> = data
        .get("envs")
        .and_then(Value::as_array)
        .map(|envs| {
            envs.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let records = enrich::enrich(paths, cfg, sink).await;
    sink.progress(&format!("'{command}' successful."), Channel::Primary)
        .await;

    match serde_json::to_value(&records) {
        Ok(data) => ExecutionResult::success(command, Some(data)),
        Err(e) => ExecutionResult::failure(command, e.to_string()),
    }
}
