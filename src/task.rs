//! Task identity, lifecycle, and bookkeeping
//!
//! A task is a named, independently-scheduled logical thread. The scheduler
//! has exclusive ownership of every record here; task bodies only ever see a
//! `TaskContext` handle.

use crate::background::ProgressSink;
use crate::error::TaskError;
use crate::suspension::Suspension;
use serde::Serialize;
use std::any::Any;
use std::rc::Rc;

/// Unique identifier for a task. Monotonic, never reused, so a stale id can
/// at worst name a pruned task - it can never alias a live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TaskId(pub u64);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "task({})", self.0)
    }
}

/// Task lifecycle state.
///
/// `Completed`, `Failed` and `Killed` are terminal; a terminal task is
/// pruned at the start of the next tick and its id is never resumed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaskState {
    /// Spawned, first resume has not happened yet.
    Pending,
    /// Body is on the stack right now (visible only from within a resume,
    /// e.g. inside an error handler).
    Running,
    /// Yielded; waiting on its wake condition.
    Suspended,
    /// Body returned normally; result stored.
    Completed,
    /// Body returned an error or panicked; message stored.
    Failed,
    /// Externally cancelled; will not be resumed.
    Killed,
}

impl TaskState {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::Killed
        )
    }
}

/// Installed wake condition for a suspended task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Wake {
    /// Resume on the very next tick, no event delivered.
    NextTick,
    /// Resume on the very next tick and hand over that tick's host event.
    NextEvent,
    /// Resume on the first tick where `clock.now() >= deadline`.
    At(f64),
}

/// Erased task result. Bodies may return any `'static` value; observers
/// downcast to the type they expect.
pub type TaskValue = Rc<dyn Any>;

pub(crate) type ErrorHandler = Box<dyn FnOnce(&TaskError, TaskId)>;
pub(crate) type CompleteHook = Box<dyn FnOnce(&TaskValue)>;

/// Observable snapshot of a task, for diagnostics widgets.
#[derive(Debug, Clone, Serialize)]
pub struct TaskInfo {
    pub id: TaskId,
    pub name: Option<String>,
    pub state: TaskState,
    /// Failure message, once `state` is `Failed`.
    pub error: Option<String>,
}

/// A live task record. Mutated only by the scheduler's tick cycle, plus the
/// external `kill` request.
pub(crate) struct Task {
    pub(crate) id: TaskId,
    pub(crate) name: Option<String>,
    pub(crate) state: TaskState,
    pub(crate) wake: Option<Wake>,
    pub(crate) suspension: Suspension,
    pub(crate) result: Option<TaskValue>,
    pub(crate) error: Option<TaskError>,
    pub(crate) on_error: Option<ErrorHandler>,
    pub(crate) on_complete: Option<CompleteHook>,
    pub(crate) progress: Option<Rc<dyn ProgressSink>>,
}

impl Task {
    pub(crate) fn new(id: TaskId, name: Option<String>, suspension: Suspension) -> Self {
        Self {
            id,
            name,
            state: TaskState::Pending,
            wake: None,
            suspension,
            result: None,
            error: None,
            on_error: None,
            on_complete: None,
            progress: None,
        }
    }

    pub(crate) fn info(&self) -> TaskInfo {
        TaskInfo {
            id: self.id,
            name: self.name.clone(),
            state: self.state,
            error: self.error.as_ref().map(|e| e.message().to_string()),
        }
    }
}
