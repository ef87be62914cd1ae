//! Service facade wiring the event log, guard, trigger and collaborators.
//!
//! The `SubtitleService` struct and its methods are organized by domain:
//! - [`tasks`] - Run admission and the background run body
//! - [`config_ops`] - Runtime configuration replacement, media scan, webhook test
//! - [`lifecycle`] - Startup, API server spawning and shutdown

mod config_ops;
mod lifecycle;
mod tasks;


pub use tasks::{TASK_FINISHED_MARKER, TASK_STARTED_MARKER};

use crate::broadcast::{Broadcaster, Subscription};
use crate::config::Config;
use crate::driver::TaskDriver;
use crate::event_log::EventLog;
use crate::fetcher::{SubliminalFetcher, SubtitleFetcher};
use crate::notifications::Notifier;
use crate::periodic::{PeriodicTrigger, TriggerState};
use crate::scanner::{VideoScanner, WalkdirScanner};
use crate::task_guard::TaskGuard;
use crate::types::{EventMessage, TriggerSource};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tasks::TaskLauncher;
use tokio::sync::{Mutex, RwLock};
use utoipa::ToSchema;

/// Schedule part of [`ServiceStatus`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct ScheduleStatus {
    /// Whether a timer is armed
    pub armed: bool,
    /// Interval of the armed timer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_minutes: Option<u64>,
}

impl From<TriggerState> for ScheduleStatus {
    fn from(state: TriggerState) -> Self {
        match state {
            TriggerState::Stopped => Self {
                armed: false,
                interval_minutes: None,
            },
            TriggerState::Armed { interval_minutes } => Self {
                armed: true,
                interval_minutes: Some(interval_minutes),
            },
        }
    }
}

/// Snapshot returned by `GET /status`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct ServiceStatus {
    /// Whether a run currently holds the task guard
    pub running: bool,
    /// Periodic trigger state
    pub schedule: ScheduleStatus,
}

/// Main service instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct SubtitleService {
    /// Current configuration, replaced wholesale on update
    pub(crate) config: Arc<RwLock<Arc<Config>>>,
    /// Where updates are persisted (None = in-memory only)
    pub(crate) config_path: Option<PathBuf>,
    /// Serializes config updates: save, swap and trigger re-arm happen as one step
    pub(crate) update_lock: Arc<Mutex<()>>,
    /// Log history, also the sink of every run
    pub(crate) event_log: Arc<EventLog>,
    /// Single-flight admission
    pub(crate) guard: Arc<TaskGuard>,
    /// Timer starting scheduled runs
    pub(crate) trigger: Arc<PeriodicTrigger>,
    /// Starts runs for both trigger sources
    pub(crate) launcher: TaskLauncher,
    /// Used by the media status scan
    pub(crate) scanner: Arc<dyn VideoScanner>,
    /// Webhook sender
    pub(crate) notifier: Notifier,
}

impl SubtitleService {
    /// Create a service using `walkdir` scanning and the `subliminal` CLI
    ///
    /// The subliminal binary is resolved once from `config.tools`; tool
    /// changes take effect on restart.
    pub fn new(config: Config, config_path: Option<PathBuf>) -> Self {
        let fetcher = Arc::new(SubliminalFetcher::from_config(&config.tools));
        tracing::info!(
            fetcher = fetcher.name(),
            binary = %fetcher.binary_path().display(),
            "Subtitle fetcher initialized"
        );
        Self::with_collaborators(
            config,
            config_path,
            Arc::new(WalkdirScanner::new()),
            fetcher,
        )
    }

    /// Create a service with explicit scanner and fetcher implementations
    pub fn with_collaborators(
        config: Config,
        config_path: Option<PathBuf>,
        scanner: Arc<dyn VideoScanner>,
        fetcher: Arc<dyn SubtitleFetcher>,
    ) -> Self {
        let hub = Broadcaster::new(config.subscriber_queue_capacity);
        let event_log = Arc::new(EventLog::new(config.log_history_limit, hub));
        let guard = TaskGuard::new();
        let config = Arc::new(RwLock::new(Arc::new(config)));
        let notifier = Notifier::new();

        let launcher = TaskLauncher {
            config: config.clone(),
            event_log: event_log.clone(),
            guard: guard.clone(),
            driver: TaskDriver::new(scanner.clone(), fetcher),
            notifier: notifier.clone(),
        };

        let scheduled = launcher.clone();
        let trigger = Arc::new(PeriodicTrigger::new(Arc::new(move || {
            scheduled.start(TriggerSource::Scheduled).map(|_| ())
        })));

        Self {
            config,
            config_path,
            update_lock: Arc::new(Mutex::new(())),
            event_log,
            guard,
            trigger,
            launcher,
            scanner,
            notifier,
        }
    }

    /// Subscribe to live messages, starting with the current log history
    ///
    /// Dropping the subscription unsubscribes.
    pub fn subscribe(&self) -> Subscription {
        self.event_log.subscribe()
    }

    /// Copy of the log history, oldest first
    pub fn logs(&self) -> Vec<EventMessage> {
        self.event_log.snapshot()
    }

    /// The event log shared by every run
    pub fn event_log(&self) -> &Arc<EventLog> {
        &self.event_log
    }

    /// Broadcaster feeding live viewers
    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        self.event_log.broadcaster()
    }

    /// Get the current configuration
    pub async fn get_config(&self) -> Arc<Config> {
        Arc::clone(&*self.config.read().await)
    }

    /// Whether a run is in progress
    pub fn is_running(&self) -> bool {
        self.guard.is_running()
    }

    /// Run and schedule state
    pub async fn status(&self) -> ServiceStatus {
        ServiceStatus {
            running: self.is_running(),
            schedule: self.trigger.state().await.into(),
        }
    }
}
