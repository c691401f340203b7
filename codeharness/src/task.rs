//! Task value type - one submitted unit of work.
//!
//! A [`Task`] is immutable once constructed and is owned by whichever queue
//! currently holds it: the submitting side moves it into the task queue, the
//! executor loop moves it out. The id assigned at construction is the same id
//! the matching [`Response`](crate::response::Response) and operation record
//! carry, which is how the coordinator connects the three.
//!
//! Tasks are built through factory constructors so that every kind is paired
//! with the right payload shape; there is no way to build a host-command task
//! carrying code, or vice versa.

use rand::Rng;
use std::fmt;

/// Length of a rendered task id: two 64-bit values as fixed-width hex.
pub const TASK_ID_HEX_LEN: usize = 32;

/// Generates a 128-bit random id rendered as a 32-character hex string.
///
/// Draws from the calling thread's RNG, so concurrent submitters need no
/// coordination and can never observe shared seed state. Collisions are
/// treated as impossible for the lifetime of the process.
pub fn generate_task_id() -> String {
    let mut rng = rand::rng();
    let hi: u64 = rng.random();
    let lo: u64 = rng.random();
    format!("{:016x}{:016x}", hi, lo)
}

/// The closed set of work kinds the executor understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskKind {
    /// Client-submitted code to run in the execution engine.
    ClientCode,

    /// Deterministic management code (View-style calls, dataset loads).
    /// Structurally present but not yet handled by the executor.
    ManagementCode,

    /// A command the host process executes itself, serialized with code
    /// execution because it needs the engine thread quiescent.
    HostCommand,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientCode => write!(f, "ClientCode"),
            Self::ManagementCode => write!(f, "ManagementCode"),
            Self::HostCommand => write!(f, "HostCommand"),
        }
    }
}

/// Payload variants, matched exhaustively at every consumption site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskPayload {
    /// Code text for the code-execution kinds.
    Code { code: String },

    /// Command name plus ordered arguments for host-management tasks.
    Command { command: String, args: Vec<String> },
}

/// One unit of work awaiting execution.
#[derive(Debug)]
pub struct Task {
    id: String,
    kind: TaskKind,
    payload: TaskPayload,
}

impl Task {
    fn new(kind: TaskKind, payload: TaskPayload) -> Self {
        Self {
            id: generate_task_id(),
            kind,
            payload,
        }
    }

    /// Creates a client code-execution task.
    pub fn client_code(code: impl Into<String>) -> Self {
        Self::new(TaskKind::ClientCode, TaskPayload::Code { code: code.into() })
    }

    /// Creates a management code-execution task (reserved extension point).
    pub fn management_code(code: impl Into<String>) -> Self {
        Self::new(
            TaskKind::ManagementCode,
            TaskPayload::Code { code: code.into() },
        )
    }

    /// Creates a host-management command task.
    pub fn host_command(command: impl Into<String>, args: Vec<String>) -> Self {
        Self::new(
            TaskKind::HostCommand,
            TaskPayload::Command {
                command: command.into(),
                args,
            },
        )
    }

    /// The task's unique id, shared with its Response and operation record.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn payload(&self) -> &TaskPayload {
        &self.payload
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            TaskPayload::Code { code } => {
                write!(
                    f,
                    "Task {{ id: {}, kind: {}, code: {} bytes }}",
                    self.id,
                    self.kind,
                    code.len()
                )
            }
            TaskPayload::Command { command, args } => {
                write!(
                    f,
                    "Task {{ id: {}, kind: {}, command: {:?}, args: {:?} }}",
                    self.id, self.kind, command, args
                )
            }
        }
    }
}
