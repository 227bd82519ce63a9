//! Dual-mode executor for the external tool: capture (bounded, collected
//! stdout) and stream (unbounded, live line forwarding).

mod capture;
mod io_pump;
mod stream;

pub use capture::{run_capturing, run_capturing_json};
pub use io_pump::{pump_lines, LineStream, LineTap};
pub use stream::run_streaming;

use std::path::Path;

/// Rendering of an invocation for progress lines and error messages.
pub(crate) fn display_argv(tool: &Path, argv: &[String]) -> String {
    if argv.is_empty() {
        return tool.display().to_string();
    }
    format!("{} {}", tool.display(), argv.join(" "))
}
