//! Listing enrichment: one short-lived interpreter probe per environment,
//! run concurrently and joined as a unit.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use tokio::process::Command;

use crate::config::ToolConfig;
use crate::protocol::{Channel, ProtocolSink};

/// Sentinel version for environments whose interpreter could not be probed.
pub const UNKNOWN_VERSION: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentRecord {
    pub path: String,
    pub python_version: String,
}

/// Probes every listed prefix concurrently and returns one record per input
/// path, index-aligned with the input regardless of completion order.
///
/// A failed probe fills its slot with [`UNKNOWN_VERSION`] and emits a
/// diagnostic line; it never fails the listing as a whole. Returns only
/// after every probe has settled.
pub async fn enrich(
    paths: Vec<String>,
    cfg: &ToolConfig,
    sink: &dyn ProtocolSink,
) -> Vec<EnvironmentRecord> {
    let total = paths.len();
    let timeout = Duration::from_millis(cfg.probe_timeout_ms);

    let mut handles = Vec::with_capacity(total);
    for (i, path) in paths.iter().enumerate() {
        sink.progress(
            &format!(
                "Probing Python version for env {}/{}: {}",
                i + 1,
                total,
                path
            ),
            Channel::Primary,
        )
        .await;
        let path = path.clone();
        handles.push(tokio::spawn(async move {
            probe_python_version(Path::new(&path), timeout).await
        }));
    }

    // Await the fan-out as a unit, then fill slots in input order; each task
    // owns its slot, so slow probes cannot reorder the result.
    let outcomes = futures::future::join_all(handles).await;
    let mut records = Vec::with_capacity(total);
    for (path, outcome) in paths.into_iter().zip(outcomes) {
        let python_version = match outcome {
            Ok(Ok(version)) => version,
            Ok(Err(reason)) => {
                sink.progress(
                    &format!("Probe failed for {path}: {reason}"),
                    Channel::Diagnostic,
                )
                .await;
                UNKNOWN_VERSION.to_string()
            }
            Err(e) => {
                sink.progress(
                    &format!("Probe task failed for {path}: {e}"),
                    Channel::Diagnostic,
                )
                .await;
                UNKNOWN_VERSION.to_string()
            }
        };
        records.push(EnvironmentRecord {
            path,
            python_version,
        });
    }
    records
}

/// Expected interpreter location inside a prefix. Computed directly rather
/// than asked of the external tool, so a probe's latency is bounded by the
/// interpreter alone.
fn interpreter_path(prefix: &Path) -> PathBuf {
    if cfg!(windows) {
        prefix.join("python.exe")
    } else {
        prefix.join("bin").join("python")
    }
}

async fn probe_python_version(prefix: &Path, timeout: Duration) -> Result<String, String> {
    let python = interpreter_path(prefix);
    if !python.is_file() {
        return Err("no python interpreter in prefix".to_string());
    }

    let mut cmd = Command::new(&python);
    cmd.arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = tokio::time::timeout(timeout, cmd.output())
        .await
        .map_err(|_| format!("probe timed out after {} ms", timeout.as_millis()))?
        .map_err(|e| e.to_string())?;

    if !output.status.success() {
        return Err(format!(
            "interpreter exited with code {}",
            output.status.code().unwrap_or(-1)
        ));
    }

    // Old interpreters print the version banner to stderr.
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let banner = if stdout.trim().is_empty() {
        stderr
    } else {
        stdout
    };

    parse_version_banner(&banner)
        .ok_or_else(|| format!("unrecognized version output: {}", banner.trim()))
}

fn parse_version_banner(banner: &str) -> Option<String> {
    let mut tokens = banner.split_whitespace();
    while let Some(tok) = tokens.next() {
        if tok == "Python" {
            return tokens.next().map(str::to_string);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_version_banner() {
        assert_eq!(
            parse_version_banner("Python 3.11.4\n"),
            Some("3.11.4".to_string())
        );
        assert_eq!(parse_version_banner("something else"), None);
        assert_eq!(parse_version_banner(""), None);
    }

    #[test]
    fn interpreter_layout_is_platform_dependent() {
        let p = interpreter_path(Path::new("/envs/demo"));
        if cfg!(windows) {
            assert!(p.ends_with("python.exe"));
        } else {
            assert_eq!(p, PathBuf::from("/envs/demo/bin/python"));
        }
    }

    #[tokio::test]
    async fn missing_interpreter_yields_sentinel() {
        let sink = crate::protocol::BufferSink::new();
        let records = enrich(
            vec!["/no/such/prefix".to_string()],
            &ToolConfig::default(),
            &sink,
        )
        .await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].python_version, UNKNOWN_VERSION);
        assert!(sink
            .progress_lines()
            .iter()
            .any(|(c, t)| *c == Channel::Diagnostic && t.contains("/no/such/prefix")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn probes_settle_in_input_order() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let mk_env = |name: &str, script: &str| {
            let bin = dir.path().join(name).join("bin");
            std::fs::create_dir_all(&bin).unwrap();
            let python = bin.join("python");
            std::fs::write(&python, format!("#!/bin/sh\n{script}\n")).unwrap();
            std::fs::set_permissions(&python, std::fs::Permissions::from_mode(0o755)).unwrap();
            dir.path().join(name).to_string_lossy().to_string()
        };

        // The slow probe comes first: completion order is reversed from
        // input order, the output must not be.
        let slow = mk_env("slow", "sleep 0.3; echo 'Python 3.11.4'");
        let fast = mk_env("fast", "echo 'Python 3.9.1'");

        let sink = crate::protocol::BufferSink::new();
        let records = enrich(
            vec![slow.clone(), fast.clone()],
            &ToolConfig::default(),
            &sink,
        )
        .await;

        assert_eq!(
            records,
            vec![
                EnvironmentRecord {
                    path: slow,
                    python_version: "3.11.4".to_string()
                },
                EnvironmentRecord {
                    path: fast,
                    python_version: "3.9.1".to_string()
                },
            ]
        );
    }
}
