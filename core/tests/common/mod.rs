#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use condabridge_core::config::{AppConfig, ToolConfig};
use condabridge_core::context::AppContext;
use condabridge_core::protocol::{BufferSink, Emitted};

/// Writes an executable stub standing in for the external tool.
pub fn write_stub(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("conda-stub");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

pub fn context_for(tool: &Path) -> AppContext {
    context_with(tool, |_| {})
}

pub fn context_with(tool: &Path, tweak: impl FnOnce(&mut ToolConfig)) -> AppContext {
    let mut cfg = AppConfig::default();
    cfg.tool.bin = tool.to_string_lossy().to_string();
    tweak(&mut cfg.tool);
    AppContext::new(cfg)
}

/// Exactly one terminal result was emitted, and it was the last line.
pub fn assert_single_terminal_result(sink: &BufferSink) {
    let events = sink.events();
    let result_count = events
        .iter()
        .filter(|e| matches!(e, Emitted::Result(_)))
        .count();
    assert_eq!(result_count, 1, "expected exactly one terminal result");
    assert!(
        matches!(events.last(), Some(Emitted::Result(_))),
        "terminal result must be the last emitted line"
    );
}

/// A fake environment prefix whose `bin/python` runs the given script body.
pub fn write_env_with_python(dir: &Path, name: &str, script: &str) -> String {
    let bin = dir.join(name).join("bin");
    std::fs::create_dir_all(&bin).unwrap();
    let python = bin.join("python");
    std::fs::write(&python, format!("#!/bin/sh\n{script}\n")).unwrap();
    std::fs::set_permissions(&python, std::fs::Permissions::from_mode(0o755)).unwrap();
    dir.join(name).to_string_lossy().to_string()
}
