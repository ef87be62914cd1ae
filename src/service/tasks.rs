//! Run admission and the background run body.

use crate::config::Config;
use crate::driver::{RunPlan, TaskDriver};
use crate::error::{Error, Result};
use crate::event_log::EventLog;
use crate::notifications::{Notifier, WebhookEvent};
use crate::task_guard::{TaskGuard, TaskPermit};
use crate::types::TriggerSource;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::SubtitleService;

/// Log line written before a background run
pub const TASK_STARTED_MARKER: &str = "--- BACKGROUND TASK STARTED ---";
/// Log line written after a background run
pub const TASK_FINISHED_MARKER: &str = "--- BACKGROUND TASK FINISHED ---";

/// Everything a run needs, shared by manual and scheduled starts
#[derive(Clone)]
pub(crate) struct TaskLauncher {
    pub(crate) config: Arc<RwLock<Arc<Config>>>,
    pub(crate) event_log: Arc<EventLog>,
    pub(crate) guard: Arc<TaskGuard>,
    pub(crate) driver: TaskDriver,
    pub(crate) notifier: Notifier,
}

impl TaskLauncher {
    /// Admit and spawn a run, or reject with [`Error::TaskInProgress`]
    pub(crate) fn start(&self, source: TriggerSource) -> Result<JoinHandle<()>> {
        let Some(permit) = self.guard.try_start() else {
            tracing::info!(%source, "run rejected: a download task is already in progress");
            return Err(Error::TaskInProgress);
        };

        tracing::info!(%source, "run admitted");
        let launcher = self.clone();
        Ok(tokio::spawn(async move {
            launcher.run(source, permit).await;
        }))
    }

    async fn run(self, source: TriggerSource, permit: TaskPermit) {
        // Released on every exit path, panics included
        let _permit = permit;

        // The plan is fixed for the whole run, later updates apply to the next one
        let config = Arc::clone(&*self.config.read().await);
        let notifications = &config.notifications;

        self.event_log.append(TASK_STARTED_MARKER);
        self.notifier
            .notify(notifications, WebhookEvent::Start, "Download process started.")
            .await;

        match self
            .driver
            .run(&RunPlan::from(config.as_ref()), self.event_log.as_ref())
            .await
        {
            Ok(summary) => {
                self.notifier
                    .notify(notifications, WebhookEvent::Completion, &summary.message())
                    .await;
            }
            Err(e) => {
                let message = if notifications.include_errors {
                    format!("Error scanning videos: {e}")
                } else {
                    "Error scanning videos.".to_string()
                };
                self.notifier
                    .notify(notifications, WebhookEvent::Error, &message)
                    .await;
            }
        }

        self.event_log.append(TASK_FINISHED_MARKER);
        tracing::info!(%source, "run finished");
    }
}

impl SubtitleService {
    /// Start a run unless one is already active
    ///
    /// Returns the handle of the spawned run. Scheduled firings go through
    /// the same admission.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TaskInProgress`] without side effects when a run is
    /// already active.
    pub fn start_task(&self, source: TriggerSource) -> Result<JoinHandle<()>> {
        self.launcher.start(source)
    }

    /// Start a run and wait for it to finish
    pub async fn run_task(&self, source: TriggerSource) -> Result<()> {
        self.start_task(source)?
            .await
            .map_err(|e| Error::Other(format!("background task failed: {e}")))
    }
}
