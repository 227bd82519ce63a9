use std::path::PathBuf;

use crate::config::ToolConfig;

/// Resolves the external tool executable on the host.
///
/// `None` is a normal outcome, not an error: callers short-circuit with a
/// terminal failure result instead of attempting to spawn anything.
pub fn locate(cfg: &ToolConfig) -> Option<PathBuf> {
    let bin = cfg.bin.trim();
    if bin.is_empty() {
        return None;
    }

    // An explicit path bypasses the PATH search.
    if bin.contains(std::path::MAIN_SEPARATOR) || bin.contains('/') {
        let path = PathBuf::from(bin);
        return path.is_file().then_some(path);
    }

    which::which(bin).ok()
}
