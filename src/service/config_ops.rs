//! Runtime configuration replacement, media status scan and webhook test.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::notifications::{Notifier, TEST_MESSAGE, WebhookEvent};
use crate::periodic::TriggerState;
use crate::scanner::scan_media_status;
use crate::types::PathStatus;
use std::sync::Arc;

use super::SubtitleService;

impl SubtitleService {
    /// Replace the whole configuration
    ///
    /// The new config is validated, persisted when the service has a config
    /// path, swapped in, and the periodic trigger is re-armed from it. A run
    /// already in progress keeps the config it started with. Updates are
    /// applied one at a time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for invalid values and I/O or serialization
    /// errors from persisting; the running config is untouched on error.
    pub async fn update_config(&self, new_config: Config) -> Result<TriggerState> {
        new_config.validate()?;

        // Concurrent updates must not interleave: the file on disk, the live
        // config and the armed timer all come from the last update
        let _update = self.update_lock.lock().await;

        if let Some(path) = &self.config_path {
            new_config.save(path)?;
            tracing::info!(path = %path.display(), "configuration saved");
        }

        let (enabled, interval) = (
            new_config.schedule_enabled,
            new_config.schedule_interval_minutes,
        );
        *self.config.write().await = Arc::new(new_config);

        let state = self.trigger.configure(enabled, interval).await;
        self.event_log.append(match state {
            TriggerState::Armed { interval_minutes } => {
                format!("Scheduler updated: task will run every {interval_minutes} minutes.")
            }
            TriggerState::Stopped => "Scheduler disabled.".to_string(),
        });
        Ok(state)
    }

    /// Per-path video and missing-subtitle counts for the current config
    ///
    /// Read-only; does not take the task guard.
    pub async fn scan_status(&self) -> Vec<PathStatus> {
        let config = self.get_config().await;
        scan_media_status(
            self.scanner.as_ref(),
            &config.search_paths,
            &config.languages,
        )
        .await
    }

    /// Send a test notification
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotificationsDisabled`] when notifications are off
    /// or no URL is configured; delivery failures are only logged.
    pub async fn test_webhook(&self) -> Result<()> {
        let config = self.get_config().await;
        if !Notifier::should_send(&config.notifications, WebhookEvent::Test) {
            return Err(Error::NotificationsDisabled);
        }

        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            notifier
                .notify(&config.notifications, WebhookEvent::Test, TEST_MESSAGE)
                .await;
        });
        Ok(())
    }
}
