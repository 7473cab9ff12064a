//! cotask - cooperative background tasks for character-grid UIs
//!
//! The scheduling core of a retained-mode widget framework for a monospace,
//! 16-color, fixed-grid terminal. The host runtime delivers one event per
//! iteration; this crate lets application code spawn logical background
//! tasks (simulated HTTP calls, file processing, polling loops) that appear
//! to run alongside the UI without ever blocking input handling or a render
//! pass.
//!
//! Design principles:
//! - Strictly single-threaded and cooperative: at most one task body is ever
//!   on the stack, so tasks mutate shared widget state without locks.
//! - The scheduler owns every poll; no foreign executor can run a task.
//! - Deterministic: ready tasks resume in creation order, time is an
//!   injectable clock, so every schedule is reproducible in tests.
//! - Failures stay local: a body that errors or panics takes down only
//!   itself, and stays visible in diagnostics until pruned.
//!
//! The main loop drives everything:
//!
//! ```no_run
//! use cotask::{HostEvent, RunOptions, Scheduler};
//!
//! let mut sched = Scheduler::new();
//! sched.run_async(
//!     |ctx| async move {
//!         ctx.sleep(0.5)?.await; // simulated latency
//!         Ok(vec!["inbox".to_string(), "sent".to_string()])
//!     },
//!     RunOptions::new()
//!         .name("load-folders")
//!         .on_success(|folders: &Vec<String>| { let _ = folders; /* fill the list widget */ }),
//! );
//!
//! loop {
//!     let event = HostEvent::Tick; // really: next host event
//!     sched.tick(event.clone());
//!     // ... dispatch `event` to widgets, then render one frame ...
//!     # break;
//! }
//! ```

pub mod background;
pub mod clock;
pub mod context;
pub mod error;
pub mod event;
pub mod scheduler;
pub mod task;

mod suspension;
mod timer;

pub use background::{ProgressSink, RunOptions};
pub use clock::{Clock, MonotonicClock, VirtualClock};
pub use context::{NextEvent, Sleep, TaskContext, YieldNow};
pub use error::{SchedError, TaskError};
pub use event::{HostEvent, Modifiers};
pub use scheduler::{Scheduler, SchedulerStats};
pub use task::{TaskId, TaskInfo, TaskState, TaskValue};
