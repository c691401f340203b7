//! Response value type - the single completion record for a task.
//!
//! Exactly one `Response` is produced for every task the executor dequeues,
//! success or failure. It travels the response queue once and is consumed by
//! the reconciler, which folds it into the operation store.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal status of a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    /// The task ran and the engine reported no error.
    Success,

    /// The engine ran the code and the code itself raised an error.
    ScriptError,

    /// A management view/render call failed inside the engine.
    ViewError,

    /// A host-management command was unknown or rejected its arguments.
    HostCommandError,

    /// The engine could not run the task at all.
    ExecutionFailure,

    /// The task exceeded its allowed execution time.
    Timeout,

    /// The task's kind or payload was not something the executor handles.
    InvalidTask,
}

impl ResponseStatus {
    /// Whether this status represents a completed, non-failed execution.
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::ScriptError => write!(f, "script_error"),
            Self::ViewError => write!(f, "view_error"),
            Self::HostCommandError => write!(f, "host_command_error"),
            Self::ExecutionFailure => write!(f, "execution_failure"),
            Self::Timeout => write!(f, "timeout"),
            Self::InvalidTask => write!(f, "invalid_task"),
        }
    }
}

/// Captured output of a code-execution task.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutput {
    /// Interpreter output, one entry per line, error lines prefixed "Error: ".
    pub text_lines: Vec<String>,

    /// Paths of graphic files the engine emitted during execution.
    pub graphic_artifacts: Vec<String>,
}

/// Captured output of a host-management command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    pub message: String,
}

/// Kind-specific result data carried by a response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultPayload {
    /// No output to report (typical for failures before execution started).
    None,

    /// Output of a code-execution task.
    Execution(ExecutionOutput),

    /// Output of a host-management command.
    Command(CommandOutput),
}

/// The completion record the executor emits for one task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    task_id: String,
    status: ResponseStatus,
    result: ResultPayload,
    error_message: Option<String>,
}

impl Response {
    /// Creates a success response carrying execution output.
    pub fn execution_success(task_id: impl Into<String>, output: ExecutionOutput) -> Self {
        Self {
            task_id: task_id.into(),
            status: ResponseStatus::Success,
            result: ResultPayload::Execution(output),
            error_message: None,
        }
    }

    /// Creates a script-error response: the code ran and raised an error.
    /// Output captured up to the failure point is still carried.
    pub fn script_error(task_id: impl Into<String>, output: ExecutionOutput) -> Self {
        Self {
            task_id: task_id.into(),
            status: ResponseStatus::ScriptError,
            result: ResultPayload::Execution(output),
            error_message: None,
        }
    }

    /// Creates a success response for a host-management command.
    pub fn command_success(task_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: ResponseStatus::Success,
            result: ResultPayload::Command(CommandOutput {
                message: message.into(),
            }),
            error_message: None,
        }
    }

    /// Creates a failure response with no output, only a status and message.
    pub fn failure(
        task_id: impl Into<String>,
        status: ResponseStatus,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            status,
            result: ResultPayload::None,
            error_message: Some(error_message.into()),
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn status(&self) -> ResponseStatus {
        self.status
    }

    pub fn result(&self) -> &ResultPayload {
        &self.result
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Response {{ task_id: {}, status: {} }}", self.task_id, self.status)
    }
}
