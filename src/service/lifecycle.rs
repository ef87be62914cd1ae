//! Startup and shutdown coordination.

use crate::error::Result;
use crate::periodic::TriggerState;

use super::SubtitleService;

impl SubtitleService {
    /// Arm the periodic trigger from the current configuration
    pub async fn start(&self) -> TriggerState {
        let config = self.get_config().await;
        let state = self
            .trigger
            .configure(config.schedule_enabled, config.schedule_interval_minutes)
            .await;

        match state {
            TriggerState::Armed { interval_minutes } => {
                self.event_log.append(format!(
                    "Scheduler started: task will run every {interval_minutes} minutes."
                ));
            }
            TriggerState::Stopped => {
                tracing::info!("Scheduler not armed at startup");
            }
        }
        state
    }

    /// Spawn the REST API server in a background task
    ///
    /// The server runs until the process exits or the task is aborted.
    pub fn spawn_api_server(&self) -> tokio::task::JoinHandle<Result<()>> {
        let service = self.clone();
        tokio::spawn(async move { crate::api::start_api_server(service).await })
    }

    /// Stop the periodic trigger
    ///
    /// Idempotent. A run in progress is not cancelled and keeps the guard
    /// until it finishes on its own.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");
        self.trigger.shutdown().await;

        if self.is_running() {
            tracing::info!("A download task is still running and will finish on its own");
        }

        tracing::info!("Graceful shutdown complete");
        Ok(())
    }
}
