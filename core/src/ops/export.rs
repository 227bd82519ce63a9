//! Export output rewriting and the export operation itself.

use std::path::Path;
use std::time::Duration;

use crate::config::ToolConfig;
use crate::protocol::{Channel, ExecutionResult, ProtocolSink};
use crate::runner;

use super::{argv, ExportFormat};

pub(super) async fn run(
    command: &str,
    name: &str,
    file: &Path,
    format: ExportFormat,
    no_build: bool,
    tool: &Path,
    cfg: &ToolConfig,
    sink: &dyn ProtocolSink,
) -> ExecutionResult {
    let args = match format {
        ExportFormat::Structured => argv(&["env", "export", "--name", name]),
        ExportFormat::Flat => argv(&["list", "--name", name, "--export"]),
    };

    sink.progress(
        &format!("Executing: {}", runner::display_argv(tool, &args)),
        Channel::Primary,
    )
    .await;
    let timeout = Duration::from_millis(cfg.capture_timeout_ms);
    let raw = match runner::run_capturing(tool, &args, timeout).await {
        Ok(raw) => raw,
        Err(e) => {
            sink.progress(
                &format!("Error during '{command}': {e}"),
                Channel::Diagnostic,
            )
            .await;
            return ExecutionResult::failure(command, e.to_string());
        }
    };

    let text = match format {
        ExportFormat::Structured => rewrite_structured(&raw, no_build),
        ExportFormat::Flat => rewrite_flat(&raw, no_build),
    };

    if let Err(e) = tokio::fs::write(file, text).await {
        return ExecutionResult::failure(
            command,
            format!("failed to write {}: {e}", file.display()),
        );
    }

    sink.progress(&format!("'{command}' successful."), Channel::Primary)
        .await;
    ExecutionResult::success(command, None)
}

/// Structured (YAML) exports: the machine-specific `prefix:` line is always
/// dropped; with `no_build`, `name=version=build` dependency pins lose the
/// build segment.
pub fn rewrite_structured(input: &str, no_build: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for line in input.lines() {
        if line.trim_start().starts_with("prefix:") {
            continue;
        }
        if no_build {
            out.push_str(&strip_build_pin(line));
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}

/// Flat exports are passed through unless `no_build` is set, in which case
/// comment lines are dropped and each `name=version=build` entry is reduced
/// to `name=version`.
pub fn rewrite_flat(input: &str, no_build: bool) -> String {
    if !no_build {
        return input.to_string();
    }
    let mut out = String::with_capacity(input.len());
    for line in input.lines() {
        let entry = line.trim();
        if entry.is_empty() || entry.starts_with('#') {
            continue;
        }
        let mut fields = entry.splitn(3, '=');
        match (fields.next(), fields.next()) {
            (Some(name), Some(version)) => {
                out.push_str(name);
                out.push('=');
                out.push_str(version);
            }
            _ => out.push_str(entry),
        }
        out.push('\n');
    }
    out
}

/// `  - numpy=1.26.0=py311habc` -> `  - numpy=1.26.0`. Lines that are not
/// three-field pins are left alone.
fn strip_build_pin(line: &str) -> String {
    let trimmed = line.trim_start();
    let indent = &line[..line.len() - trimmed.len()];
    let Some(pin) = trimmed.strip_prefix("- ") else {
        return line.to_string();
    };
    let fields: Vec<&str> = pin.split('=').collect();
    if fields.len() == 3 {
        format!("{indent}- {}={}", fields[0], fields[1])
    } else {
        line.to_string()
    }
}
