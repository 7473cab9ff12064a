//! Error types for the scheduler and for task bodies
//!
//! Two families:
//! - `SchedError` - misuse of the public surface, reported synchronously
//!   to the caller of the offending operation.
//! - `TaskError` - a failure inside a task body. Always caught at the
//!   suspension boundary and confined to that task; never unwinds into
//!   `Scheduler::tick`.

use crate::task::TaskId;
use std::any::Any;

/// Errors from misuse of the scheduler's public operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedError {
    /// A task-only operation (`sleep`, `yield_now`, `next_event`) was
    /// invoked outside an active resume.
    NotInTask,
    /// No live task with this id (unknown, or already pruned).
    NotFound(TaskId),
    /// Bad argument to a public operation (e.g. a negative or non-finite
    /// sleep duration).
    InvalidArgument(String),
}

impl std::fmt::Display for SchedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedError::NotInTask => write!(f, "not inside an active task resume"),
            SchedError::NotFound(id) => write!(f, "no such task: {}", id),
            SchedError::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for SchedError {}

/// A failure raised by user code inside a task body.
///
/// Bodies fail either by returning `Err(TaskError)` or by panicking; both
/// are normalized to this type at the suspension boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskError {
    message: String,
}

impl TaskError {
    /// Create an error from a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The failure message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Normalize a caught panic payload. Panic payloads are dynamically
    /// typed; `&str` and `String` cover what `panic!` produces in practice.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "task body panicked".to_string()
        };
        Self { message }
    }
}

impl std::fmt::Display for TaskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TaskError {}

impl From<String> for TaskError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for TaskError {
    fn from(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Contract violations inside a body (e.g. a leaked context used after its
/// task died) become ordinary task failures via `?`.
impl From<SchedError> for TaskError {
    fn from(err: SchedError) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}
