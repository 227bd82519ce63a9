use serde_json::{json, Value};

/// Terminal record of a single operation invocation.
///
/// Exactly one is written per invocation, after every progress line. The
/// variant split makes the invalid field combinations unrepresentable: a
/// success never carries an error message and a failure never carries a
/// payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    Success {
        command: String,
        data: Option<Value>,
    },
    Failure {
        command: String,
        error: String,
    },
}

impl ExecutionResult {
    pub fn success(command: impl Into<String>, data: Option<Value>) -> Self {
        Self::Success {
            command: command.into(),
            data,
        }
    }

    pub fn failure(command: impl Into<String>, error: impl Into<String>) -> Self {
        Self::Failure {
            command: command.into(),
            error: error.into(),
        }
    }

    pub fn command(&self) -> &str {
        match self {
            Self::Success { command, .. } | Self::Failure { command, .. } => command,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error),
        }
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            Self::Success { data, .. } => data.as_ref(),
            Self::Failure { .. } => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Success { command, data } => {
                let mut record = json!({ "command": command, "ok": true });
                if let Some(data) = data {
                    record["data"] = data.clone();
                }
                record
            }
            Self::Failure { command, error } => {
                json!({ "command": command, "ok": false, "error": error })
            }
        }
    }

    /// The single machine-parseable line of the protocol.
    pub fn to_line(&self) -> String {
        self.to_json().to_string()
    }
}
