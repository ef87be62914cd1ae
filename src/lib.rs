//! # subtitlarr
//!
//! Background subtitle fetcher for media libraries with a live-streaming web
//! console.
//!
//! ## Overview
//!
//! A run walks the configured search paths for video files and asks an
//! external fetcher (the `subliminal` CLI by default) for every subtitle
//! language that has no `.<lang>.srt` next to the video. Runs are started
//! manually over the REST API or by a periodic timer, and at most one runs at
//! a time. Everything a run reports goes into a bounded log history and is
//! fanned out to live viewers of `GET /stream`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use subtitlarr::{Config, SubtitleService, TriggerSource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         search_paths: vec!["/media/movies".into()],
//!         languages: vec!["en".to_string()],
//!         ..Default::default()
//!     };
//!
//!     let service = SubtitleService::new(config, None);
//!
//!     // Follow the run as it happens
//!     let mut subscription = service.subscribe();
//!     tokio::spawn(async move {
//!         while let Some(message) = subscription.recv().await {
//!             println!("{}", message.display_text());
//!         }
//!     });
//!
//!     service.run_task(TriggerSource::Manual).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Fan-out of live messages to stream viewers
pub mod broadcast;
/// Configuration types
pub mod config;
/// Scan-and-fetch run body
pub mod driver;
/// Error types
pub mod error;
/// Bounded log history
pub mod event_log;
/// External subtitle fetcher
pub mod fetcher;
/// Webhook notifications
pub mod notifications;
/// Interval timer for scheduled runs
pub mod periodic;
/// Video discovery
pub mod scanner;
/// Service facade (decomposed into focused submodules)
pub mod service;
/// Single-flight run admission
pub mod task_guard;
/// Core types and messages
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use broadcast::{Broadcaster, Subscription};
pub use config::{Config, NotificationConfig, WebhookType};
pub use driver::{EventSink, RunPlan, TaskDriver};
pub use error::{ApiError, Error, ErrorDetail, FetchError, Result, ToHttpStatus};
pub use event_log::EventLog;
pub use fetcher::{FetchRequest, SubliminalFetcher, SubtitleFetcher};
pub use periodic::{PeriodicTrigger, TriggerState};
pub use scanner::{VideoScanner, WalkdirScanner};
pub use service::{ServiceStatus, SubtitleService};
pub use task_guard::{TaskGuard, TaskPermit};
pub use types::{EventKind, EventMessage, PathStatus, RunSummary, StreamRecord, TriggerSource};

/// Run the service until a termination signal arrives.
///
/// Waits for a termination signal and then calls the service's `shutdown()` method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use subtitlarr::{Config, SubtitleService, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let service = SubtitleService::new(Config::default(), None);
///     service.start().await;
///
///     // Run with automatic signal handling
///     run_with_shutdown(service).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(service: SubtitleService) -> Result<()> {
    wait_for_signal().await;
    service.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
