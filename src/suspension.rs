//! The suspension primitive
//!
//! Wraps a task body (an ordinary future) together with the cell it shares
//! with its `TaskContext`. `resume` polls the body exactly once and reports
//! what happened as a tagged outcome. Failures - `Err` returns and panics
//! alike - are caught here and never unwind into the tick loop.
//!
//! The scheduler drives every poll itself, so no foreign executor can ever
//! run a body; that is what upholds the at-most-one-active-task invariant.

use crate::error::TaskError;
use crate::event::HostEvent;
use crate::task::TaskValue;
use pin_project_lite::pin_project;
use std::cell::RefCell;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

/// What a body asked for when it yielded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum WakeRequest {
    /// `sleep(secs)`: resume no earlier than now + secs.
    Duration(f64),
    /// `yield_now()`: resume on the next tick.
    NextTick,
    /// `next_event()`: resume on the next tick, delivering its host event.
    NextEvent,
}

/// Result of one resume.
pub(crate) enum ResumeOutcome {
    /// Body yielded and asked to be woken under this condition.
    Yielded(WakeRequest),
    /// Body returned normally.
    Completed(TaskValue),
    /// Body returned `Err` or panicked.
    Failed(TaskError),
}

/// State shared between the scheduler and the body's `TaskContext`.
///
/// The scheduler fills it in immediately before each poll and clears it
/// immediately after; the context futures read and write it in between.
/// This is the explicit ambient "current task" channel - no thread-locals.
#[derive(Default)]
pub(crate) struct TaskCell {
    /// True only while the body is on the stack under `resume`.
    pub(crate) in_resume: bool,
    /// Wake condition recorded by the context future that yielded.
    pub(crate) requested: Option<WakeRequest>,
    /// Event delivered for a `next_event` wake, consumed by the body.
    pub(crate) event: Option<HostEvent>,
}

type BoxTaskFuture = Pin<Box<dyn Future<Output = Result<TaskValue, TaskError>>>>;

pin_project! {
    /// Adapter that erases a body's concrete result type to `TaskValue` so
    /// differently-typed tasks can live in one table.
    struct Erase<F> {
        #[pin]
        inner: F,
    }
}

impl<F, T> Future for Erase<F>
where
    F: Future<Output = Result<T, TaskError>>,
    T: 'static,
{
    type Output = Result<TaskValue, TaskError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.project()
            .inner
            .poll(cx)
            .map(|result| result.map(|value| Rc::new(value) as TaskValue))
    }
}

/// A not-yet-finished resumable computation.
pub(crate) struct Suspension {
    future: BoxTaskFuture,
    cell: Rc<RefCell<TaskCell>>,
}

impl Suspension {
    pub(crate) fn new<F, T>(body: F, cell: Rc<RefCell<TaskCell>>) -> Self
    where
        F: Future<Output = Result<T, TaskError>> + 'static,
        T: 'static,
    {
        Self {
            future: Box::pin(Erase { inner: body }),
            cell,
        }
    }

    /// Run the body until it yields, returns, or fails.
    ///
    /// `event` is `Some` only when the task's wake condition asked for the
    /// next host event; sleep and plain-yield wakes resume with nothing.
    pub(crate) fn resume(&mut self, event: Option<HostEvent>) -> ResumeOutcome {
        {
            let mut cell = self.cell.borrow_mut();
            cell.in_resume = true;
            cell.requested = None;
            cell.event = event;
        }

        // The waker is inert: wake conditions are explicit, and the
        // scheduler re-polls according to them, not waker signals.
        let waker = futures::task::noop_waker();
        let mut cx = Context::from_waker(&waker);
        let polled = catch_unwind(AssertUnwindSafe(|| self.future.as_mut().poll(&mut cx)));

        let mut cell = self.cell.borrow_mut();
        cell.in_resume = false;
        cell.event = None;

        match polled {
            Ok(Poll::Ready(Ok(value))) => ResumeOutcome::Completed(value),
            Ok(Poll::Ready(Err(err))) => ResumeOutcome::Failed(err),
            // A pending body that recorded no request awaited something
            // other than the context futures; treat it as a plain yield so
            // it keeps making progress every tick.
            Ok(Poll::Pending) => {
                ResumeOutcome::Yielded(cell.requested.take().unwrap_or(WakeRequest::NextTick))
            }
            Err(payload) => ResumeOutcome::Failed(TaskError::from_panic(payload)),
        }
    }
}
