//! Multi-step operations: an ordered sequence of streaming invocations with
//! halt-on-first-failure and explicit partial-effect reporting.

use std::path::Path;

use crate::config::ToolConfig;
use crate::protocol::{Channel, ExecutionResult, ProtocolSink};
use crate::runner;

/// Runtime state of a workflow step.
///
/// Valid transitions:
/// - `Pending` -> `Running`
/// - `Running` -> `Succeeded`
/// - `Running` -> `Failed`
///
/// Steps after a failed one are never started and stay `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// One external invocation inside a multi-step operation.
///
/// Steps never emit their own terminal result; only the workflow as a whole
/// produces one.
pub struct WorkflowStep {
    pub label: &'static str,
    pub argv: Vec<String>,
    /// Warning appended to the workflow error when this step succeeded but a
    /// later step failed, naming the side effect that was not rolled back.
    leftover: Option<String>,
    status: StepStatus,
}

impl WorkflowStep {
    pub fn new(label: &'static str, argv: Vec<String>) -> Self {
        Self {
            label,
            argv,
            leftover: None,
            status: StepStatus::Pending,
        }
    }

    pub fn with_leftover(mut self, warning: impl Into<String>) -> Self {
        self.leftover = Some(warning.into());
        self
    }

    pub fn status(&self) -> StepStatus {
        self.status
    }
}

/// Drives the steps of one logical operation strictly in order, forwarding
/// each step's output live. The first failure halts the workflow; effects of
/// already-completed steps are reported, never rolled back.
pub struct WorkflowOrchestrator {
    command: String,
    steps: Vec<WorkflowStep>,
}

impl WorkflowOrchestrator {
    pub fn new(command: impl Into<String>, steps: Vec<WorkflowStep>) -> Self {
        Self {
            command: command.into(),
            steps,
        }
    }

    pub fn steps(&self) -> &[WorkflowStep] {
        &self.steps
    }

    pub async fn run(
        &mut self,
        tool: &Path,
        cfg: &ToolConfig,
        sink: &dyn ProtocolSink,
    ) -> ExecutionResult {
        for i in 0..self.steps.len() {
            self.steps[i].status = StepStatus::Running;
            tracing::debug!(step = self.steps[i].label, "workflow step starting");
            sink.progress(
                &format!(
                    "Executing: {} {}",
                    tool.display(),
                    self.steps[i].argv.join(" ")
                ),
                Channel::Primary,
            )
            .await;

            let outcome = runner::run_streaming(tool, &self.steps[i].argv, cfg, sink).await;
            match outcome {
                Ok(0) => {
                    self.steps[i].status = StepStatus::Succeeded;
                    tracing::debug!(step = self.steps[i].label, "workflow step succeeded");
                }
                Ok(exit_code) => {
                    self.steps[i].status = StepStatus::Failed;
                    let message = self.failure_message(
                        i,
                        &format!("failed with exit code {exit_code}"),
                    );
                    sink.progress(&message, Channel::Diagnostic).await;
                    return ExecutionResult::failure(&self.command, message);
                }
                Err(e) => {
                    self.steps[i].status = StepStatus::Failed;
                    let message = self.failure_message(i, &e.to_string());
                    sink.progress(&message, Channel::Diagnostic).await;
                    return ExecutionResult::failure(&self.command, message);
                }
            }
        }

        ExecutionResult::success(&self.command, None)
    }

    /// Names the failed step and, when earlier steps already mutated state,
    /// states which side effects remain in place.
    fn failure_message(&self, failed: usize, reason: &str) -> String {
        let mut message = format!("{} step {}", self.steps[failed].label, reason);
        for step in &self.steps[..failed] {
            if step.status == StepStatus::Succeeded {
                if let Some(leftover) = &step.leftover {
                    message.push_str("; ");
                    message.push_str(leftover);
                }
            }
        }
        message
    }
}
