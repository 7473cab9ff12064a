//! Fire-and-forget background work with structured completion
//!
//! `run_async` composes spawn + error handler + an optional progress
//! collaborator into one call, so application code can kick off a simulated
//! download or file scan, keep handling input, and get a typed callback when
//! the work finishes - no polling.
//!
//! The progress collaborator is opaque to the scheduler: typically a spinner
//! or toast widget supplied by the caller. Its updates run inside the tick
//! cycle, which is safe because only one task body is ever active.

use crate::context::TaskContext;
use crate::error::TaskError;
use crate::scheduler::Scheduler;
use crate::task::{TaskId, TaskValue};
use std::future::Future;
use std::rc::Rc;

/// Caller-supplied progress display (spinner, toast, status line).
pub trait ProgressSink {
    /// The task has been registered.
    fn started(&self, id: TaskId, name: Option<&str>);
    /// The task reached a terminal state. `success` is false for failures
    /// and kills.
    fn finished(&self, id: TaskId, success: bool);
}

type SuccessHook<T> = Box<dyn FnOnce(&T)>;
type FailureHook = Box<dyn FnOnce(&TaskError, TaskId)>;

/// Options for [`Scheduler::run_async`].
///
/// ```no_run
/// # use cotask::{RunOptions, Scheduler};
/// # let mut sched = Scheduler::new();
/// sched.run_async(
///     |ctx| async move {
///         ctx.sleep(2.0)?.await;
///         Ok("payload".to_string())
///     },
///     RunOptions::new()
///         .name("fetch")
///         .on_success(|body: &String| println!("got {body}"))
///         .on_error(|err, _| eprintln!("failed: {err}")),
/// );
/// ```
pub struct RunOptions<T> {
    name: Option<String>,
    on_success: Option<SuccessHook<T>>,
    on_error: Option<FailureHook>,
    progress: Option<Rc<dyn ProgressSink>>,
}

impl<T> RunOptions<T> {
    pub fn new() -> Self {
        Self {
            name: None,
            on_success: None,
            on_error: None,
            progress: None,
        }
    }

    /// Diagnostic label for the task.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Invoked exactly once with the body's final value, never with
    /// intermediate yields.
    pub fn on_success(mut self, hook: impl FnOnce(&T) + 'static) -> Self {
        self.on_success = Some(Box::new(hook));
        self
    }

    /// Invoked exactly once if the body fails.
    pub fn on_error(mut self, hook: impl FnOnce(&TaskError, TaskId) + 'static) -> Self {
        self.on_error = Some(Box::new(hook));
        self
    }

    /// Attach a progress display.
    pub fn progress(mut self, sink: Rc<dyn ProgressSink>) -> Self {
        self.progress = Some(sink);
        self
    }
}

impl<T> Default for RunOptions<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Spawn `body` and wire up its completion callbacks. Returns the task
    /// id immediately; nothing runs until the next tick.
    pub fn run_async<F, Fut, T>(&mut self, body: F, options: RunOptions<T>) -> TaskId
    where
        F: FnOnce(TaskContext) -> Fut,
        Fut: Future<Output = Result<T, TaskError>> + 'static,
        T: 'static,
    {
        let RunOptions {
            name,
            on_success,
            on_error,
            progress,
        } = options;

        let id = match &name {
            Some(name) => self.spawn_named(name, body),
            None => self.spawn(body),
        };

        if let Some(task) = self.task_mut(id) {
            if let Some(hook) = on_success {
                task.on_complete = Some(Box::new(move |value: &TaskValue| {
                    if let Some(typed) = value.downcast_ref::<T>() {
                        hook(typed);
                    }
                }));
            }
            task.on_error = on_error;
            if let Some(sink) = progress {
                sink.started(id, task.name.as_deref());
                task.progress = Some(sink);
            }
        }
        id
    }
}
