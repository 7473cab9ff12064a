//! Integration tests for the cotask scheduler
//!
//! Exercises the full surface the way a UI main loop would: spawn tasks,
//! feed one host event per tick, and observe lifecycles from outside.

use cotask::{
    HostEvent, RunOptions, SchedError, Scheduler, TaskError, TaskState, VirtualClock,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Scheduler on a virtual clock plus the handle to advance it.
fn harness() -> (Scheduler, VirtualClock) {
    let clock = VirtualClock::new();
    let sched = Scheduler::with_clock(Box::new(clock.clone()));
    (sched, clock)
}

// ============================================================================
// End-to-end lifecycle
// ============================================================================

#[test]
fn test_sleep_then_return_lifecycle() {
    let (mut sched, clock) = harness();

    let id = sched.spawn_named("worker", |ctx| async move {
        ctx.sleep(0.2)?.await;
        Ok(42)
    });
    assert_eq!(sched.get_task(id).unwrap().state, TaskState::Pending);

    // First tick at t=0.1: first resume, then suspend until 0.1 + 0.2.
    clock.advance(0.1);
    sched.tick(HostEvent::Tick);
    assert_eq!(sched.get_task(id).unwrap().state, TaskState::Suspended);

    // t=0.2: wake time 0.3 not reached, still suspended.
    clock.advance(0.1);
    sched.tick(HostEvent::Tick);
    assert_eq!(sched.get_task(id).unwrap().state, TaskState::Suspended);

    // t=0.3: wake_at <= now, resumes and completes with 42.
    clock.advance(0.1);
    sched.tick(HostEvent::Tick);
    let info = sched.get_task(id).unwrap();
    assert_eq!(info.state, TaskState::Completed);
    assert_eq!(info.name.as_deref(), Some("worker"));
    let result = sched.result_of(id).unwrap().unwrap();
    assert_eq!(result.downcast_ref::<i32>(), Some(&42));

    // One more tick prunes it.
    sched.tick(HostEvent::Tick);
    assert!(matches!(sched.get_task(id), Err(SchedError::NotFound(_))));
}

#[test]
fn test_immediate_failure_invokes_handler() {
    let (mut sched, _clock) = harness();
    let messages = Rc::new(RefCell::new(Vec::new()));

    let id = sched.spawn(|_| async { Err::<(), _>(TaskError::msg("boom")) });
    let sink = messages.clone();
    sched
        .set_error_handler(id, move |err, failed| {
            sink.borrow_mut().push(format!("{failed}: {err}"));
        })
        .unwrap();

    sched.tick(HostEvent::Tick);
    assert_eq!(sched.get_task(id).unwrap().state, TaskState::Failed);
    assert_eq!(messages.borrow().len(), 1);
    assert!(messages.borrow()[0].contains("boom"));
}

#[test]
fn test_run_async_success_callback() {
    let (mut sched, clock) = harness();
    let delivered = Rc::new(RefCell::new(Vec::new()));

    let sink = delivered.clone();
    sched.run_async(
        |ctx| async move {
            ctx.yield_now()?.await;
            ctx.sleep(0.3)?.await;
            Ok("done".to_string())
        },
        RunOptions::new()
            .name("simulated-fetch")
            .on_success(move |value: &String| sink.borrow_mut().push(value.clone())),
    );

    for _ in 0..6 {
        clock.advance(0.1);
        sched.tick(HostEvent::Tick);
    }
    // Exactly once, only the final value.
    assert_eq!(delivered.borrow().as_slice(), &["done".to_string()]);
}

// ============================================================================
// Scheduler + UI event interplay
// ============================================================================

#[test]
fn test_event_driven_task_alongside_sleepers() {
    let (mut sched, clock) = harness();
    let polls = Rc::new(RefCell::new(0));

    // A key logger that collects characters until a mouse click.
    let logger = sched.spawn_named("keylog", |ctx| async move {
        let mut collected = String::new();
        loop {
            match ctx.next_event()?.await {
                HostEvent::Char(c) => collected.push(c),
                HostEvent::MouseDown { .. } => break,
                _ => {}
            }
        }
        Ok(collected)
    });

    // A poller that wakes every 0.5s.
    let count = polls.clone();
    sched.spawn_named("poller", move |ctx| async move {
        for _ in 0..2 {
            ctx.sleep(0.5)?.await;
            *count.borrow_mut() += 1;
        }
        Ok(())
    });

    // First tick arms both tasks.
    sched.tick(HostEvent::Tick);

    for (step, event) in [
        HostEvent::Char('h'),
        HostEvent::Tick,
        HostEvent::Char('i'),
        HostEvent::MouseDown { x: 1, y: 1, button: 0 },
    ]
    .into_iter()
    .enumerate()
    {
        clock.advance(0.25);
        sched.tick(event);
        // Poller fires at t=0.5 (step 1) and t=1.0 (step 3).
        assert_eq!(*polls.borrow(), step / 2 + step % 2);
    }

    assert_eq!(*polls.borrow(), 2);
    assert_eq!(sched.get_task(logger).unwrap().state, TaskState::Completed);
    let collected = sched.result_of(logger).unwrap().unwrap();
    assert_eq!(collected.downcast_ref::<String>().map(String::as_str), Some("hi"));
}

#[test]
fn test_stats_reflect_a_mixed_workload() {
    let (mut sched, _clock) = harness();

    sched.spawn_named("finishes", |_| async { Ok(()) });
    sched.spawn_named("fails", |_| async { Err::<(), _>("bad".into()) });
    sched.spawn_named("sleeps", |ctx| async move {
        ctx.sleep(30.0)?.await;
        Ok(())
    });

    sched.tick(HostEvent::Tick);

    let stats = sched.stats();
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.suspended, 1);
    assert_eq!(stats.total, 3);

    let listing = sched.list_tasks();
    assert_eq!(listing.len(), 3);
    assert_eq!(listing[0].name.as_deref(), Some("finishes"));
    assert_eq!(listing[1].error.as_deref(), Some("bad"));

    // Terminal tasks disappear on the next tick; the sleeper stays.
    sched.tick(HostEvent::Tick);
    let stats = sched.stats();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.suspended, 1);
}

#[test]
fn test_shared_state_interleaves_only_at_yield_points() {
    // Two tasks cooperatively build a transcript. Within a tick each
    // resume segment is atomic; across ticks they interleave.
    let (mut sched, _clock) = harness();
    let transcript = Rc::new(RefCell::new(Vec::new()));

    for label in ["left", "right"] {
        let transcript = transcript.clone();
        sched.spawn(move |ctx| async move {
            for round in 0..2 {
                transcript.borrow_mut().push(format!("{label}:{round}"));
                ctx.yield_now()?.await;
            }
            Ok(())
        });
    }

    sched.tick(HostEvent::Tick);
    sched.tick(HostEvent::Tick);
    sched.tick(HostEvent::Tick);

    assert_eq!(
        transcript.borrow().as_slice(),
        &["left:0", "right:0", "left:1", "right:1"]
    );
}

#[test]
fn test_contract_misuse_fails_that_task_only() {
    let (mut sched, _clock) = harness();

    // Leak a context out of the body and misuse it later from the outside.
    let leaked = Rc::new(RefCell::new(None));
    let stash = leaked.clone();
    let id = sched.spawn(move |ctx| async move {
        *stash.borrow_mut() = Some(ctx.clone());
        // Invalid duration: the error propagates as this task's failure.
        ctx.sleep(-1.0)?.await;
        Ok(())
    });

    sched.tick(HostEvent::Tick);
    let info = sched.get_task(id).unwrap();
    assert_eq!(info.state, TaskState::Failed);
    assert!(info.error.unwrap().contains("invalid argument"));

    // Outside any resume the leaked context refuses to sleep.
    let ctx = leaked.borrow().clone().unwrap();
    assert!(!ctx.is_active());
    assert_eq!(ctx.sleep(1.0).err(), Some(SchedError::NotInTask));
}
