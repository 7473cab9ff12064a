//! Task-side scheduling surface
//!
//! Every task body receives a `TaskContext`: the only sanctioned way to give
//! up control. The operations validate their contract synchronously (are we
//! inside a resume? is the duration sane?) and then hand back a small future
//! that records the wake condition and yields exactly once.
//!
//! A context is only live while its task's resume is on the stack; calling
//! these operations from the main loop or from widget code fails with
//! `NotInTask` immediately.

use crate::error::SchedError;
use crate::event::HostEvent;
use crate::suspension::{TaskCell, WakeRequest};
use crate::task::TaskId;
use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

/// Handle a task body uses to sleep, yield, and receive events.
#[derive(Clone)]
pub struct TaskContext {
    cell: Rc<RefCell<TaskCell>>,
    id: TaskId,
}

impl TaskContext {
    pub(crate) fn new(cell: Rc<RefCell<TaskCell>>, id: TaskId) -> Self {
        Self { cell, id }
    }

    /// Id of the task this context belongs to.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// True only while the owning task's body is executing under a resume.
    pub fn is_active(&self) -> bool {
        self.cell.borrow().in_resume
    }

    /// Suspend for at least `seconds` (measured against the scheduler's
    /// clock; resumption may be later depending on tick cadence, never
    /// earlier).
    pub fn sleep(&self, seconds: f64) -> Result<Sleep, SchedError> {
        self.guard()?;
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(SchedError::InvalidArgument(format!(
                "sleep duration must be finite and non-negative, got {seconds}"
            )));
        }
        Ok(Sleep {
            cell: self.cell.clone(),
            seconds,
            registered: false,
        })
    }

    /// Suspend until the very next tick.
    pub fn yield_now(&self) -> Result<YieldNow, SchedError> {
        self.guard()?;
        Ok(YieldNow {
            cell: self.cell.clone(),
            registered: false,
        })
    }

    /// Suspend until the next tick and receive the host event that arrives
    /// with it.
    pub fn next_event(&self) -> Result<NextEvent, SchedError> {
        self.guard()?;
        Ok(NextEvent {
            cell: self.cell.clone(),
            registered: false,
        })
    }

    fn guard(&self) -> Result<(), SchedError> {
        if self.cell.borrow().in_resume {
            Ok(())
        } else {
            Err(SchedError::NotInTask)
        }
    }
}

/// Future returned by [`TaskContext::sleep`].
pub struct Sleep {
    cell: Rc<RefCell<TaskCell>>,
    seconds: f64,
    registered: bool,
}

impl Future for Sleep {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        if self.registered {
            return Poll::Ready(());
        }
        self.cell.borrow_mut().requested = Some(WakeRequest::Duration(self.seconds));
        self.registered = true;
        Poll::Pending
    }
}

/// Future returned by [`TaskContext::yield_now`].
pub struct YieldNow {
    cell: Rc<RefCell<TaskCell>>,
    registered: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        if self.registered {
            return Poll::Ready(());
        }
        self.cell.borrow_mut().requested = Some(WakeRequest::NextTick);
        self.registered = true;
        Poll::Pending
    }
}

/// Future returned by [`TaskContext::next_event`].
pub struct NextEvent {
    cell: Rc<RefCell<TaskCell>>,
    registered: bool,
}

impl Future for NextEvent {
    type Output = HostEvent;

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<HostEvent> {
        if self.registered {
            // The scheduler placed the waking event in the cell right
            // before this resume.
            let event = self.cell.borrow_mut().event.take();
            return Poll::Ready(event.unwrap_or(HostEvent::Tick));
        }
        self.cell.borrow_mut().requested = Some(WakeRequest::NextEvent);
        self.registered = true;
        Poll::Pending
    }
}
