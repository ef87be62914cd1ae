//! Single-flight admission for download runs.
//!
//! At most one run holds a [`TaskPermit`]. The permit returns the guard to
//! idle when dropped, which covers normal completion, early returns, errors
//! and a panicking task body alike.

use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::sync::Arc;

/// Whether a run is currently admitted
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskState {
    /// No run in progress
    Idle,
    /// A run holds the permit
    Running,
}

/// Mutex-guarded run flag shared by every trigger source
#[derive(Debug)]
pub struct TaskGuard {
    state: Mutex<TaskState>,
}

impl TaskGuard {
    /// Create an idle guard
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(TaskState::Idle),
        })
    }

    /// Admit a run if none is active
    ///
    /// Returns `None` without touching any state when a run is already in
    /// progress.
    pub fn try_start(self: &Arc<Self>) -> Option<TaskPermit> {
        let mut state = self.state.lock();
        match *state {
            TaskState::Running => None,
            TaskState::Idle => {
                *state = TaskState::Running;
                tracing::debug!("task admitted");
                Some(TaskPermit {
                    guard: Arc::clone(self),
                })
            }
        }
    }

    /// Like [`try_start`](Self::try_start), reporting rejection as [`Error::TaskInProgress`]
    pub fn acquire(self: &Arc<Self>) -> Result<TaskPermit> {
        self.try_start().ok_or(Error::TaskInProgress)
    }

    /// Current state
    pub fn state(&self) -> TaskState {
        *self.state.lock()
    }

    /// Whether a run currently holds the permit
    pub fn is_running(&self) -> bool {
        self.state() == TaskState::Running
    }

    fn finish(&self) {
        let mut state = self.state.lock();
        debug_assert_eq!(*state, TaskState::Running);
        *state = TaskState::Idle;
        tracing::debug!("task finished, guard released");
    }
}

/// Proof of admission; releases the guard exactly once when dropped
#[must_use = "dropping the permit immediately releases the guard"]
#[derive(Debug)]
pub struct TaskPermit {
    guard: Arc<TaskGuard>,
}

impl TaskPermit {
    /// Release the guard now instead of at end of scope
    pub fn finish(self) {
        drop(self);
    }
}

impl Drop for TaskPermit {
    fn drop(&mut self) {
        self.guard.finish();
    }
}
