//! Stable re-exports for consumers (`cli` and external crates).
//!
//! Prefer importing from `condabridge_core::api` instead of reaching into
//! internal modules.

pub use crate::config::{load_default, AppConfig, LoggingConfig, ToolConfig};
pub use crate::context::AppContext;
pub use crate::enrich::{enrich, EnvironmentRecord, UNKNOWN_VERSION};
pub use crate::error::{CliError, ToolError};
pub use crate::locate::locate;
pub use crate::ops::{dispatch, ExportFormat, Operation};
pub use crate::protocol::{BufferSink, Channel, Emitted, ExecutionResult, ProtocolSink, StdioSink};
pub use crate::runner::{run_capturing, run_capturing_json, run_streaming};
pub use crate::workflow::{StepStatus, WorkflowOrchestrator, WorkflowStep};
