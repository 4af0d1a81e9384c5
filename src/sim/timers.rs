//! Cancellable periodic tasks on a virtual millisecond clock
//!
//! The engine owns one `Scheduler`. Platforms feed elapsed time in; the
//! scheduler hands back due tasks one at a time so each callback sees any
//! cancellation or re-arm made by the one before it.

use serde::{Deserialize, Serialize};

/// The three periodic activities of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerKind {
    /// Clear and repopulate the grid
    Spawn,
    /// One second off the clock
    Countdown,
    /// Ramp spawn density and speed
    Difficulty,
}

#[derive(Debug, Clone)]
struct PeriodicTask {
    kind: TimerKind,
    period_ms: u64,
    next_due_ms: u64,
    /// Arm order; breaks ties between tasks due at the same instant
    seq: u64,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    now_ms: u64,
    tasks: Vec<PeriodicTask>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Start `kind` with a fresh phase, replacing any existing schedule for it
    pub fn arm(&mut self, kind: TimerKind, period_ms: u32) {
        self.cancel(kind);
        let period_ms = u64::from(period_ms.max(1));
        self.tasks.push(PeriodicTask {
            kind,
            period_ms,
            next_due_ms: self.now_ms.saturating_add(period_ms),
            seq: self.next_seq,
        });
        self.next_seq += 1;
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        self.tasks.retain(|t| t.kind != kind);
    }

    pub fn cancel_all(&mut self) {
        self.tasks.clear();
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.tasks.iter().any(|t| t.kind == kind)
    }

    pub fn period_ms(&self, kind: TimerKind) -> Option<u64> {
        self.tasks.iter().find(|t| t.kind == kind).map(|t| t.period_ms)
    }

    pub fn armed_count(&self) -> usize {
        self.tasks.len()
    }

    /// Earliest pending task
    pub fn next_due(&self) -> Option<(u64, TimerKind)> {
        self.tasks
            .iter()
            .min_by_key(|t| (t.next_due_ms, t.seq))
            .map(|t| (t.next_due_ms, t.kind))
    }

    /// Fire the earliest task due at or before `until`.
    ///
    /// Moves the clock to that task's due time and schedules its next
    /// occurrence. Returns `None` once nothing is due in the window.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<TimerKind> {
        let index = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.next_due_ms <= until_ms)
            .min_by_key(|(_, t)| (t.next_due_ms, t.seq))
            .map(|(i, _)| i)?;

        let task = &mut self.tasks[index];
        let kind = task.kind;
        self.now_ms = task.next_due_ms;
        match task.next_due_ms.checked_add(task.period_ms) {
            Some(next) => task.next_due_ms = next,
            // Next occurrence is past the end of the clock
            None => {
                self.tasks.remove(index);
            }
        }
        Some(kind)
    }

    /// Move the clock forward to `until` once all due tasks have fired
    pub fn settle(&mut self, until_ms: u64) {
        self.now_ms = self.now_ms.max(until_ms);
    }
}
