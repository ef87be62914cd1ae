//! One scan-and-download pass over the configured libraries
//!
//! [`TaskDriver::run`] scans every root, asks the fetcher for each video that
//! lacks a subtitle, and reports through an [`EventSink`]:
//!
//! - a `Log` line when the pass starts and for every processed file
//! - `Progress` as `done/total`, starting at `0/total` and advancing after
//!   every file (skipped files included), so the last one is `total/total`
//! - a summary `Log` line and exactly one terminal `Status`: `finished`, or
//!   `failed` when the scan itself fails
//!
//! A failure on one file is logged and counted; it never stops the pass.

use crate::config::{Config, Credentials};
use crate::error::Result;
use crate::fetcher::{FetchRequest, SubtitleFetcher};
use crate::scanner::{VideoScanner, missing_languages};
use crate::types::{EventMessage, RunSummary, WorkItem};
use std::path::PathBuf;
use std::sync::Arc;

/// Status text of a pass that ran to the end
pub const STATUS_FINISHED: &str = "finished";
/// Status text of a pass that could not scan
pub const STATUS_FAILED: &str = "failed";

/// Destination for everything a pass reports
pub trait EventSink: Send + Sync {
    /// Record one message
    fn emit(&self, message: EventMessage);
}

/// Inputs of one pass, captured from the config when the pass starts
#[derive(Clone, Debug, Default)]
pub struct RunPlan {
    /// Directories to scan
    pub search_paths: Vec<PathBuf>,
    /// Target subtitle languages
    pub languages: Vec<String>,
    /// Provider logins handed to the fetcher
    pub credentials: Credentials,
}

impl From<&Config> for RunPlan {
    fn from(config: &Config) -> Self {
        Self {
            search_paths: config.search_paths.clone(),
            languages: config.languages.clone(),
            credentials: config.credentials.clone(),
        }
    }
}

/// Runs passes with a fixed scanner and fetcher
#[derive(Clone)]
pub struct TaskDriver {
    scanner: Arc<dyn VideoScanner>,
    fetcher: Arc<dyn SubtitleFetcher>,
}

impl TaskDriver {
    /// Create a driver from its collaborators
    pub fn new(scanner: Arc<dyn VideoScanner>, fetcher: Arc<dyn SubtitleFetcher>) -> Self {
        Self { scanner, fetcher }
    }

    /// Execute one pass
    ///
    /// # Errors
    ///
    /// Returns the scan error after reporting it; per-file failures are only
    /// counted in the returned [`RunSummary`].
    pub async fn run(&self, plan: &RunPlan, sink: &dyn EventSink) -> Result<RunSummary> {
        sink.emit(EventMessage::log("Starting scan and download process..."));

        let videos = match self.scanner.scan(&plan.search_paths).await {
            Ok(videos) => videos,
            Err(e) => {
                tracing::warn!(error = %e, "video scan failed");
                sink.emit(EventMessage::log(format!("Error scanning videos: {e}")));
                sink.emit(EventMessage::status(STATUS_FAILED));
                return Err(e);
            }
        };

        let total = videos.len();
        let mut summary = RunSummary {
            scanned: total,
            ..Default::default()
        };
        tracing::info!(videos = total, fetcher = self.fetcher.name(), "scan complete");
        sink.emit(EventMessage::progress(0, total));

        for (index, video) in videos.into_iter().enumerate() {
            let name = video
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| video.display().to_string());
            sink.emit(EventMessage::log(format!("Processing: {name}")));

            let item = WorkItem {
                missing_languages: missing_languages(&video, &plan.languages).await,
                video,
            };

            if item.missing_languages.is_empty() {
                tracing::debug!(video = %item.video.display(), "all subtitles present, skipping");
                summary.skipped += 1;
            } else {
                let request = FetchRequest {
                    video: &item.video,
                    languages: &item.missing_languages,
                    credentials: &plan.credentials,
                };
                match self.fetcher.fetch(request, sink).await {
                    Ok(()) => summary.succeeded += 1,
                    Err(e) => {
                        tracing::warn!(video = %item.video.display(), error = %e, "subtitle fetch failed");
                        sink.emit(EventMessage::log(format!("ERROR processing {name}: {e}")));
                        summary.failed += 1;
                    }
                }
            }

            sink.emit(EventMessage::progress(index + 1, total));
        }

        sink.emit(EventMessage::log(summary.message()));
        sink.emit(EventMessage::status(STATUS_FINISHED));
        tracing::info!(
            scanned = summary.scanned,
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            "pass finished"
        );

        Ok(summary)
    }
}
