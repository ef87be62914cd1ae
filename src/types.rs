//! Core types shared across the crate: event messages, run summaries, scan results.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;

/// What an [`EventMessage`] carries
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// A line of human-readable output; kept in the event log history
    Log,
    /// A `done/total` progress counter
    Progress,
    /// A run state marker such as `finished`
    Status,
}

impl EventKind {
    /// Wire name used in the `type` field of stream records
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Log => "log",
            EventKind::Progress => "progress",
            EventKind::Status => "status",
        }
    }
}

/// An immutable message produced by a task run
///
/// Messages are created once and then shared between the event log and every
/// live subscriber, so none of the fields are mutable after construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventMessage {
    kind: EventKind,
    text: String,
    timestamp: DateTime<Local>,
}

impl EventMessage {
    /// Create a message of the given kind stamped with the current local time
    pub fn new(kind: EventKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            timestamp: Local::now(),
        }
    }

    /// Shorthand for a [`EventKind::Log`] message
    pub fn log(text: impl Into<String>) -> Self {
        Self::new(EventKind::Log, text)
    }

    /// Shorthand for a [`EventKind::Progress`] message
    pub fn progress(done: usize, total: usize) -> Self {
        Self::new(EventKind::Progress, format!("{done}/{total}"))
    }

    /// Shorthand for a [`EventKind::Status`] message
    pub fn status(text: impl Into<String>) -> Self {
        Self::new(EventKind::Status, text)
    }

    /// Kind of the message
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Raw text as produced
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Creation time
    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    /// Text as shown to viewers: log lines get a `[HH:MM:SS]` prefix
    pub fn display_text(&self) -> String {
        match self.kind {
            EventKind::Log => format!("[{}] {}", self.timestamp.format("%H:%M:%S"), self.text),
            EventKind::Progress | EventKind::Status => self.text.clone(),
        }
    }

    /// Wire record used by the live stream: `{"type":"log","message":"..."}`
    pub fn to_record(&self) -> StreamRecord {
        StreamRecord {
            kind: self.kind,
            message: self.display_text(),
        }
    }
}

/// JSON body of one live-stream record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StreamRecord {
    /// Message kind
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Rendered message text
    pub message: String,
}

/// What asked for a task run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerSource {
    /// `POST /download`
    Manual,
    /// The periodic trigger fired
    Scheduled,
}

impl std::fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerSource::Manual => f.write_str("manual"),
            TriggerSource::Scheduled => f.write_str("scheduled"),
        }
    }
}

/// A video together with the target languages it still lacks subtitles for
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkItem {
    /// Video file path
    pub video: PathBuf,
    /// Languages with no `<stem>.<lang>.srt` next to the video
    pub missing_languages: Vec<String>,
}

/// Outcome tally of one completed run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct RunSummary {
    /// Videos found by the scan (progress denominator)
    pub scanned: usize,
    /// Videos for which the external tool succeeded
    pub succeeded: usize,
    /// Videos for which the external tool failed
    pub failed: usize,
    /// Videos that already had every subtitle
    pub skipped: usize,
}

impl RunSummary {
    /// Summary line written to the event log at the end of a run
    pub fn message(&self) -> String {
        format!(
            "Scan and download finished. Downloaded subtitles for {} file(s), with {} error(s).",
            self.succeeded, self.failed
        )
    }
}

/// Subtitle coverage of one search path, as returned by `POST /scan`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PathStatus {
    /// Search path as configured
    pub path: String,
    /// Number of video files found
    pub videos: usize,
    /// Number of (video, language) pairs with no subtitle
    pub missing: usize,
    /// Set when the path could not be scanned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
