#![cfg(unix)]

mod common;

use common::{assert_single_terminal_result, context_for, context_with, write_stub};
use condabridge_core::ops::{dispatch, Operation};
use condabridge_core::protocol::{BufferSink, Channel, Emitted};

#[tokio::test]
async fn probe_returns_tool_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let stub = write_stub(dir.path(), r#"echo '{"conda_version":"24.1.2"}'"#);
    let sink = BufferSink::new();

    let result = dispatch(Operation::Probe, &context_for(&stub), &sink).await;

    assert!(result.is_ok());
    assert_eq!(result.command(), "probe");
    assert_eq!(result.data().unwrap()["conda_version"], "24.1.2");
    assert_single_terminal_result(&sink);

    // The invocation is announced before the result.
    assert!(sink
        .progress_lines()
        .iter()
        .any(|(c, t)| *c == Channel::Primary && t.starts_with("Executing:")));
}

#[tokio::test]
async fn nonzero_exit_carries_tool_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let stub = write_stub(dir.path(), "echo 'whoops: bad channel' >&2; exit 2");
    let sink = BufferSink::new();

    let result = dispatch(Operation::Probe, &context_for(&stub), &sink).await;

    assert!(!result.is_ok());
    assert_eq!(result.error().unwrap(), "whoops: bad channel");
    assert_single_terminal_result(&sink);
    assert!(sink
        .progress_lines()
        .iter()
        .any(|(c, t)| *c == Channel::Diagnostic && t.contains("whoops")));
}

#[tokio::test]
async fn nonzero_exit_falls_back_to_stdout_message() {
    let dir = tempfile::tempdir().unwrap();
    let stub = write_stub(dir.path(), "echo 'printed to stdout'; exit 1");
    let sink = BufferSink::new();

    let result = dispatch(Operation::Probe, &context_for(&stub), &sink).await;

    assert_eq!(result.error().unwrap(), "printed to stdout");
}

#[tokio::test]
async fn malformed_json_is_a_failure() {
    let dir = tempfile::tempdir().unwrap();
    let stub = write_stub(dir.path(), "echo 'this is not json'");
    let sink = BufferSink::new();

    let result = dispatch(Operation::Probe, &context_for(&stub), &sink).await;

    assert!(!result.is_ok());
    assert!(result.error().unwrap().contains("malformed JSON"));
    assert_single_terminal_result(&sink);
}

#[tokio::test]
async fn capture_timeout_is_a_failure() {
    let dir = tempfile::tempdir().unwrap();
    let stub = write_stub(dir.path(), "sleep 5");
    let sink = BufferSink::new();
    let ctx = context_with(&stub, |tool| tool.capture_timeout_ms = 100);

    let result = dispatch(Operation::Probe, &ctx, &sink).await;

    assert!(!result.is_ok());
    assert!(result.error().unwrap().contains("timed out"));
    assert_single_terminal_result(&sink);
}

#[tokio::test]
async fn tool_not_found_short_circuits_without_progress() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("no-such-tool");
    let sink = BufferSink::new();

    let result = dispatch(Operation::EnvList, &context_for(&missing), &sink).await;

    assert!(!result.is_ok());
    assert_eq!(result.error().unwrap(), "conda not found in PATH");

    // No subprocess, no progress lines: the terminal result is the only line.
    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], Emitted::Result(_)));
}

#[tokio::test]
async fn tool_not_found_applies_to_multi_step_operations_too() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("no-such-tool");
    let sink = BufferSink::new();

    let result = dispatch(
        Operation::EnvRename {
            old_name: "a".into(),
            new_name: "b".into(),
        },
        &context_for(&missing),
        &sink,
    )
    .await;

    assert!(!result.is_ok());
    assert_eq!(sink.events().len(), 1);
}

#[tokio::test]
async fn pkg_list_passes_prefix_through() {
    let dir = tempfile::tempdir().unwrap();
    let args_log = dir.path().join("args.log");
    let stub = write_stub(
        dir.path(),
        &format!("echo \"$@\" >> {}\necho '[]'", args_log.display()),
    );
    let sink = BufferSink::new();

    let result = dispatch(
        Operation::PkgList {
            prefix: "/envs/demo".into(),
        },
        &context_for(&stub),
        &sink,
    )
    .await;

    assert!(result.is_ok());
    let recorded = std::fs::read_to_string(&args_log).unwrap();
    assert_eq!(recorded.trim(), "list --prefix /envs/demo --json");
}
