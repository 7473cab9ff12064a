//! Deadline queue for sleeping tasks
//!
//! A min-heap of (deadline, task) entries. Entries are never removed early;
//! a task that was killed or otherwise moved on leaves a stale entry behind,
//! and the scheduler revalidates every popped id against the task's actual
//! wake condition. That keeps cancellation O(1).

use crate::task::TaskId;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug)]
struct TimerEntry {
    deadline: f64,
    task: TaskId,
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TimerEntry {}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap, we want the earliest deadline
        // first, ties broken by creation order.
        other
            .deadline
            .partial_cmp(&self.deadline)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.task.cmp(&self.task))
    }
}

/// All outstanding sleep deadlines.
#[derive(Debug, Default)]
pub(crate) struct TimerQueue {
    heap: BinaryHeap<TimerEntry>,
}

impl TimerQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register `task` to be considered for wake-up once `now >= deadline`.
    pub(crate) fn schedule(&mut self, deadline: f64, task: TaskId) {
        self.heap.push(TimerEntry { deadline, task });
    }

    /// Pop every entry whose deadline has arrived.
    pub(crate) fn pop_due(&mut self, now: f64) -> Vec<TaskId> {
        let mut due = Vec::new();
        while let Some(entry) = self.heap.peek() {
            if entry.deadline > now {
                break;
            }
            if let Some(entry) = self.heap.pop() {
                due.push(entry.task);
            }
        }
        due
    }

    /// Earliest outstanding deadline, if any. Lets the main loop stretch
    /// its idle interval when no task needs waking soon.
    pub(crate) fn next_deadline(&self) -> Option<f64> {
        self.heap.peek().map(|entry| entry.deadline)
    }
}
