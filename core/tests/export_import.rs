#![cfg(unix)]

mod common;

use std::collections::BTreeSet;

use common::{assert_single_terminal_result, context_for, write_stub};
use condabridge_core::ops::{dispatch, ExportFormat, Operation};
use condabridge_core::protocol::BufferSink;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn flat_export_with_no_build_strips_comments_and_build_tags() {
    let dir = tempfile::tempdir().unwrap();
    let stub = write_stub(
        dir.path(),
        r#"echo '# This file may be used to create an environment'
echo 'numpy=1.26.0=py311h1abc'
echo 'pip=24.0=pyhd8ed1ab_0'"#,
    );
    let out = dir.path().join("demo.txt");
    let sink = BufferSink::new();

    let result = dispatch(
        Operation::EnvExport {
            name: "demo".into(),
            file: out.clone(),
            format: ExportFormat::Flat,
            no_build: true,
        },
        &context_for(&stub),
        &sink,
    )
    .await;

    assert!(result.is_ok());
    assert_single_terminal_result(&sink);
    assert_eq!(
        std::fs::read_to_string(&out).unwrap(),
        "numpy=1.26.0\npip=24.0\n"
    );
}

#[tokio::test]
async fn structured_export_drops_the_prefix_line() {
    let dir = tempfile::tempdir().unwrap();
    let stub = write_stub(
        dir.path(),
        r#"echo 'name: demo'
echo 'dependencies:'
echo '  - numpy=1.26.0=py311h1abc'
echo 'prefix: /home/user/miniconda3/envs/demo'"#,
    );
    let out = dir.path().join("demo.yml");
    let sink = BufferSink::new();

    let result = dispatch(
        Operation::EnvExport {
            name: "demo".into(),
            file: out.clone(),
            format: ExportFormat::Structured,
            no_build: false,
        },
        &context_for(&stub),
        &sink,
    )
    .await;

    assert!(result.is_ok());
    let written = std::fs::read_to_string(&out).unwrap();
    assert!(!written.contains("prefix:"));
    assert!(written.contains("- numpy=1.26.0=py311h1abc"));
}

#[tokio::test]
async fn export_failure_when_tool_errors() {
    let dir = tempfile::tempdir().unwrap();
    let stub = write_stub(dir.path(), "echo 'no such environment: demo' >&2; exit 1");
    let out = dir.path().join("demo.yml");
    let sink = BufferSink::new();

    let result = dispatch(
        Operation::EnvExport {
            name: "demo".into(),
            file: out.clone(),
            format: ExportFormat::Structured,
            no_build: false,
        },
        &context_for(&stub),
        &sink,
    )
    .await;

    assert!(!result.is_ok());
    assert_eq!(result.error().unwrap(), "no such environment: demo");
    assert!(!out.exists());
}

/// Export followed by import hands the same package set back to the tool.
#[tokio::test]
async fn export_then_import_round_trips_the_package_set() {
    let dir = tempfile::tempdir().unwrap();
    let args_log = dir.path().join("args.log");

    // `list --export` emits the package set; `env create` records what it
    // was asked to build.
    let stub = write_stub(
        dir.path(),
        &format!(
            r#"case "$1" in
  list)
    echo '# exported'
    echo 'numpy=1.26.0=py311h1abc'
    echo 'requests=2.31.0=pyhd8ed1ab_0'
    ;;
  env)
    echo "$@" >> {log}
    ;;
esac"#,
            log = args_log.display()
        ),
    );
    let spec_file = dir.path().join("demo.txt");

    let sink = BufferSink::new();
    let result = dispatch(
        Operation::EnvExport {
            name: "demo".into(),
            file: spec_file.clone(),
            format: ExportFormat::Flat,
            no_build: true,
        },
        &context_for(&stub),
        &sink,
    )
    .await;
    assert!(result.is_ok());

    let sink = BufferSink::new();
    let result = dispatch(
        Operation::EnvImport {
            file: spec_file.clone(),
            name: "demo-copy".into(),
        },
        &context_for(&stub),
        &sink,
    )
    .await;
    assert!(result.is_ok());
    assert_single_terminal_result(&sink);

    // The import was asked to build from the exported file...
    let recorded = std::fs::read_to_string(&args_log).unwrap();
    assert_eq!(
        recorded.trim(),
        format!(
            "env create --name demo-copy --file {} --yes",
            spec_file.display()
        )
    );

    // ...and that file carries the same package set the tool exported.
    let package_set: BTreeSet<String> = std::fs::read_to_string(&spec_file)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();
    let expected: BTreeSet<String> = ["numpy=1.26.0", "requests=2.31.0"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(package_set, expected);
}
