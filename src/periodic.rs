//! Interval-based trigger for scheduled download runs
//!
//! The trigger owns at most one timer task. Reconfiguring first cancels the
//! running timer and waits for its task to exit, then arms a replacement, all
//! while holding the timer slot, so two timers never overlap and a cancelled
//! timer never fires after [`PeriodicTrigger::configure`] returns.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use subtitlarr::periodic::PeriodicTrigger;
//!
//! # async fn example() {
//! let trigger = PeriodicTrigger::new(Arc::new(|| {
//!     println!("tick");
//!     Ok(())
//! }));
//!
//! trigger.configure(true, 60).await;
//! // ...
//! trigger.shutdown().await;
//! # }
//! ```

use crate::error::{Error, Result};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Callback invoked on every timer firing; `Err(TaskInProgress)` means the
/// firing was skipped because a run is already active
pub type FireFn = Arc<dyn Fn() -> Result<()> + Send + Sync>;

/// Longest accepted interval (one year); longer ones leave the trigger stopped
pub const MAX_INTERVAL_MINUTES: i64 = 365 * 24 * 60;

/// Externally visible trigger state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerState {
    /// No timer armed
    Stopped,
    /// A timer fires every `interval_minutes`
    Armed {
        /// Firing interval in minutes
        interval_minutes: u64,
    },
}

struct ArmedTimer {
    interval_minutes: u64,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Timer-driven trigger that can be replaced at runtime
pub struct PeriodicTrigger {
    fire: FireFn,
    shutdown: CancellationToken,
    slot: Mutex<Option<ArmedTimer>>,
}

impl PeriodicTrigger {
    /// Create a stopped trigger that calls `fire` on each firing once armed
    pub fn new(fire: FireFn) -> Self {
        Self {
            fire,
            shutdown: CancellationToken::new(),
            slot: Mutex::new(None),
        }
    }

    /// Replace the schedule
    ///
    /// Any armed timer is stopped first. A disabled schedule or a
    /// non-positive interval leaves the trigger stopped.
    pub async fn configure(&self, enabled: bool, interval_minutes: i64) -> TriggerState {
        let mut slot = self.slot.lock().await;

        if let Some(previous) = slot.take() {
            stop_timer(previous).await;
        }

        if self.shutdown.is_cancelled() {
            warn!("Periodic trigger is shut down, ignoring reconfiguration");
            return TriggerState::Stopped;
        }

        if !enabled {
            info!("Scheduler disabled.");
            return TriggerState::Stopped;
        }

        if interval_minutes <= 0 || interval_minutes > MAX_INTERVAL_MINUTES {
            warn!(interval_minutes, "Invalid schedule interval, scheduler disabled.");
            return TriggerState::Stopped;
        }

        let interval_minutes = interval_minutes as u64;
        let period = Duration::from_secs(interval_minutes * 60);
        let cancel = self.shutdown.child_token();
        let handle = tokio::spawn(run_timer(period, cancel.clone(), self.fire.clone()));

        info!(
            interval_minutes,
            "Scheduler updated: task will run every {} minutes.", interval_minutes
        );

        *slot = Some(ArmedTimer {
            interval_minutes,
            cancel,
            handle,
        });

        TriggerState::Armed { interval_minutes }
    }

    /// Stop the armed timer, if any, and keep the trigger usable
    pub async fn disarm(&self) -> bool {
        let mut slot = self.slot.lock().await;
        match slot.take() {
            Some(timer) => {
                stop_timer(timer).await;
                true
            }
            None => false,
        }
    }

    /// Stop the timer and refuse further arming
    ///
    /// Idempotent. A run already started by an earlier firing keeps going.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        if self.disarm().await {
            info!("Periodic trigger stopped");
        } else {
            debug!("Periodic trigger already stopped");
        }
    }

    /// Current state
    pub async fn state(&self) -> TriggerState {
        match self.slot.lock().await.as_ref() {
            Some(timer) => TriggerState::Armed {
                interval_minutes: timer.interval_minutes,
            },
            None => TriggerState::Stopped,
        }
    }

    /// Whether [`shutdown`](Self::shutdown) has been called
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

impl Drop for PeriodicTrigger {
    fn drop(&mut self) {
        // Child tokens stop any timer still running
        self.shutdown.cancel();
    }
}

async fn stop_timer(timer: ArmedTimer) {
    timer.cancel.cancel();
    // The loop exits at its next select; awaiting guarantees it has
    if let Err(e) = timer.handle.await
        && e.is_panic()
    {
        warn!(error = %e, "Periodic timer task panicked");
    }
    debug!(interval_minutes = timer.interval_minutes, "Periodic timer cancelled");
}

async fn run_timer(period: Duration, cancel: CancellationToken, fire: FireFn) {
    // First firing one full period after arming, like a ticker
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if cancel.is_cancelled() {
                    break;
                }
                match fire() {
                    Ok(()) => info!("Scheduled task started"),
                    Err(Error::TaskInProgress) => {
                        info!("Scheduled firing skipped: a download task is already in progress");
                    }
                    Err(e) => warn!(error = %e, "Scheduled firing failed"),
                }
            }
        }
    }
}
