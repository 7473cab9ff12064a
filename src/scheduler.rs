//! The scheduler
//!
//! Owns every live task and drives one resume cycle per host event. The
//! main loop calls `tick` once per iteration with the event it received
//! (or a bare `Tick`), then dispatches the same event to widgets and
//! renders. Nothing here blocks.
//!
//! One scheduler instance belongs to the application's main-loop object and
//! is passed by reference to whatever needs `spawn`/`kill`; there is no
//! process-wide registry.
//!
//! Concurrency model: strictly single-threaded and cooperative. Exactly one
//! task body is ever on the stack, because `tick` resumes tasks one after
//! another and nothing else is allowed to poll a suspension. Task bodies may
//! therefore mutate shared widget state freely - but every `sleep`/yield is
//! a point where siblings may have run in between.

use crate::clock::{Clock, MonotonicClock};
use crate::context::TaskContext;
use crate::error::{SchedError, TaskError};
use crate::event::HostEvent;
use crate::suspension::{ResumeOutcome, Suspension, TaskCell, WakeRequest};
use crate::task::{ErrorHandler, Task, TaskId, TaskInfo, TaskState, TaskValue, Wake};
use crate::timer::TimerQueue;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::future::Future;
use std::rc::Rc;

/// Task counts by state, for observability widgets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerStats {
    pub pending: usize,
    pub running: usize,
    pub suspended: usize,
    pub completed: usize,
    pub failed: usize,
    pub killed: usize,
    pub total: usize,
}

/// Cooperative scheduler for background tasks.
pub struct Scheduler {
    /// Live tasks. BTreeMap keyed by monotonic id gives creation-order
    /// iteration, which is the resume order contract.
    tasks: BTreeMap<TaskId, Task>,
    timers: TimerQueue,
    clock: Box<dyn Clock>,
    next_id: u64,
}

impl Scheduler {
    /// Scheduler on real time.
    pub fn new() -> Self {
        Self::with_clock(Box::new(MonotonicClock::new()))
    }

    /// Scheduler on an injected time source (virtual clocks in tests).
    pub fn with_clock(clock: Box<dyn Clock>) -> Self {
        Self {
            tasks: BTreeMap::new(),
            timers: TimerQueue::new(),
            clock,
            next_id: 0,
        }
    }

    /// Register a task. The body does not run until the next `tick`.
    ///
    /// The body is a closure from the task's context to a future; it fails
    /// by returning `Err` (or panicking, which is caught and treated the
    /// same way).
    pub fn spawn<F, Fut, T>(&mut self, body: F) -> TaskId
    where
        F: FnOnce(TaskContext) -> Fut,
        Fut: Future<Output = Result<T, TaskError>> + 'static,
        T: 'static,
    {
        self.spawn_inner(None, body)
    }

    /// Like [`spawn`](Self::spawn), with a diagnostic label. Names need not
    /// be unique.
    pub fn spawn_named<F, Fut, T>(&mut self, name: &str, body: F) -> TaskId
    where
        F: FnOnce(TaskContext) -> Fut,
        Fut: Future<Output = Result<T, TaskError>> + 'static,
        T: 'static,
    {
        self.spawn_inner(Some(name.to_string()), body)
    }

    fn spawn_inner<F, Fut, T>(&mut self, name: Option<String>, body: F) -> TaskId
    where
        F: FnOnce(TaskContext) -> Fut,
        Fut: Future<Output = Result<T, TaskError>> + 'static,
        T: 'static,
    {
        let id = TaskId(self.next_id);
        self.next_id += 1;

        let cell = Rc::new(RefCell::new(TaskCell::default()));
        let future = body(TaskContext::new(cell.clone(), id));
        let suspension = Suspension::new(future, cell);

        log::debug!("spawn {} ({})", id, name.as_deref().unwrap_or("unnamed"));
        self.tasks.insert(id, Task::new(id, name, suspension));
        id
    }

    /// Cancel a task. Idempotent: killing a terminal or unknown id is a
    /// no-op. The task is never resumed again and is pruned on the next
    /// tick.
    pub fn kill(&mut self, id: TaskId) {
        if let Some(task) = self.tasks.get_mut(&id)
            && !task.state.is_terminal()
        {
            task.state = TaskState::Killed;
            task.wake = None;
            if let Some(progress) = task.progress.take() {
                progress.finished(id, false);
            }
            log::debug!("kill {}", id);
        }
    }

    /// One scheduler cycle, driven by one host event.
    ///
    /// Prunes tasks that were already terminal when the cycle began, then
    /// resumes every ready task in creation order. A task that finishes or
    /// fails during this cycle stays observable until the next one.
    pub fn tick(&mut self, event: HostEvent) {
        self.prune();

        let now = self.clock.now();
        let mut ready: Vec<TaskId> = Vec::new();

        for (id, task) in &self.tasks {
            match (task.state, task.wake) {
                (TaskState::Pending, _) => ready.push(*id),
                (TaskState::Suspended, Some(Wake::NextTick) | Some(Wake::NextEvent)) => {
                    ready.push(*id)
                }
                _ => {}
            }
        }

        // Due sleepers come off the deadline heap; stale entries (killed or
        // re-scheduled tasks) fail revalidation and are dropped.
        for id in self.timers.pop_due(now) {
            if let Some(task) = self.tasks.get(&id)
                && task.state == TaskState::Suspended
                && matches!(task.wake, Some(Wake::At(at)) if at <= now)
            {
                ready.push(id);
            }
        }

        ready.sort_unstable();
        ready.dedup();

        for id in ready {
            self.resume_one(id, &event, now);
        }
    }

    /// Counts by state.
    pub fn stats(&self) -> SchedulerStats {
        let mut stats = SchedulerStats::default();
        for task in self.tasks.values() {
            match task.state {
                TaskState::Pending => stats.pending += 1,
                TaskState::Running => stats.running += 1,
                TaskState::Suspended => stats.suspended += 1,
                TaskState::Completed => stats.completed += 1,
                TaskState::Failed => stats.failed += 1,
                TaskState::Killed => stats.killed += 1,
            }
            stats.total += 1;
        }
        stats
    }

    /// Creation-order snapshot of every live task.
    pub fn list_tasks(&self) -> Vec<TaskInfo> {
        self.tasks.values().map(Task::info).collect()
    }

    /// Snapshot of one task.
    pub fn get_task(&self, id: TaskId) -> Result<TaskInfo, SchedError> {
        self.tasks
            .get(&id)
            .map(Task::info)
            .ok_or(SchedError::NotFound(id))
    }

    /// Stored result of a completed task (present until it is pruned).
    pub fn result_of(&self, id: TaskId) -> Result<Option<TaskValue>, SchedError> {
        self.tasks
            .get(&id)
            .map(|task| task.result.clone())
            .ok_or(SchedError::NotFound(id))
    }

    /// Attach (or replace) the handler invoked if this task fails.
    pub fn set_error_handler(
        &mut self,
        id: TaskId,
        handler: impl FnOnce(&TaskError, TaskId) + 'static,
    ) -> Result<(), SchedError> {
        let task = self.tasks.get_mut(&id).ok_or(SchedError::NotFound(id))?;
        task.on_error = Some(Box::new(handler) as ErrorHandler);
        Ok(())
    }

    /// Earliest outstanding sleep deadline, for main loops that idle
    /// between events.
    pub fn next_deadline(&self) -> Option<f64> {
        self.timers.next_deadline()
    }

    pub(crate) fn task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(&id)
    }

    fn prune(&mut self) {
        self.tasks.retain(|id, task| {
            let keep = !task.state.is_terminal();
            if !keep {
                log::trace!("prune {} ({:?})", id, task.state);
            }
            keep
        });
    }

    fn resume_one(&mut self, id: TaskId, event: &HostEvent, now: f64) {
        let Some(task) = self.tasks.get_mut(&id) else {
            return;
        };

        // Only a next-event wake receives the payload; sleep and plain
        // yields resume empty-handed, and so does the first resume.
        let deliver = if task.wake == Some(Wake::NextEvent) {
            Some(event.clone())
        } else {
            None
        };
        task.wake = None;
        task.state = TaskState::Running;

        match task.suspension.resume(deliver) {
            ResumeOutcome::Yielded(request) => {
                task.state = TaskState::Suspended;
                task.wake = Some(match request {
                    WakeRequest::Duration(secs) => {
                        let at = now + secs;
                        self.timers.schedule(at, id);
                        Wake::At(at)
                    }
                    WakeRequest::NextTick => Wake::NextTick,
                    WakeRequest::NextEvent => Wake::NextEvent,
                });
            }
            ResumeOutcome::Completed(value) => {
                task.state = TaskState::Completed;
                if let Some(hook) = task.on_complete.take() {
                    hook(&value);
                }
                if let Some(progress) = task.progress.take() {
                    progress.finished(id, true);
                }
                task.result = Some(value);
                log::debug!("{} completed", id);
            }
            ResumeOutcome::Failed(err) => {
                task.state = TaskState::Failed;
                if let Some(progress) = task.progress.take() {
                    progress.finished(id, false);
                }
                match task.on_error.take() {
                    Some(handler) => handler(&err, id),
                    None => log::error!("{} failed with no handler: {}", id, err),
                }
                task.error = Some(err);
            }
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
