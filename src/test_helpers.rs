//! Shared test doubles for the driver and service tests.

use crate::driver::EventSink;
use crate::error::{Error, FetchError, Result};
use crate::fetcher::{FetchRequest, SubtitleFetcher};
use crate::scanner::VideoScanner;
use crate::types::{EventKind, EventMessage};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Notify;

/// Sink that keeps every emitted message in order
#[derive(Default)]
pub(crate) struct CapturingSink {
    messages: Mutex<Vec<EventMessage>>,
}

impl CapturingSink {
    pub(crate) fn messages(&self) -> Vec<EventMessage> {
        self.messages.lock().clone()
    }

    pub(crate) fn texts(&self) -> Vec<String> {
        self.messages
            .lock()
            .iter()
            .map(|m| m.text().to_string())
            .collect()
    }

    pub(crate) fn of_kind(&self, kind: EventKind) -> Vec<String> {
        self.messages
            .lock()
            .iter()
            .filter(|m| m.kind() == kind)
            .map(|m| m.text().to_string())
            .collect()
    }
}

impl EventSink for CapturingSink {
    fn emit(&self, message: EventMessage) {
        self.messages.lock().push(message);
    }
}

/// Scanner returning a fixed list, or a scan error
pub(crate) struct FakeScanner {
    pub(crate) videos: Vec<PathBuf>,
    pub(crate) fail: bool,
}

impl FakeScanner {
    pub(crate) fn with(videos: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            videos: videos.iter().map(PathBuf::from).collect(),
            fail: false,
        })
    }

    pub(crate) fn failing() -> Arc<Self> {
        Arc::new(Self {
            videos: Vec::new(),
            fail: true,
        })
    }
}

#[async_trait]
impl VideoScanner for FakeScanner {
    async fn scan(&self, roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
        if self.fail {
            return Err(Error::Scan {
                path: roots.first().cloned().unwrap_or_default(),
                reason: "not a directory".to_string(),
            });
        }
        Ok(self.videos.clone())
    }
}

/// Fetcher with scripted per-file outcomes
///
/// Files listed in `failures` exit unsuccessfully with the given code; every
/// call is recorded. When `gate` is set each call waits for a notification
/// before returning, which lets tests hold a run open.
#[derive(Default)]
pub(crate) struct FakeFetcher {
    pub(crate) failures: HashMap<PathBuf, i32>,
    pub(crate) calls: Mutex<Vec<(PathBuf, Vec<String>)>>,
    pub(crate) gate: Option<Arc<Notify>>,
}

impl FakeFetcher {
    pub(crate) fn failing_on(files: &[(&str, i32)]) -> Self {
        Self {
            failures: files
                .iter()
                .map(|(path, code)| (PathBuf::from(path), *code))
                .collect(),
            ..Default::default()
        }
    }

    pub(crate) fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Default::default()
        }
    }

    pub(crate) fn called_for(&self) -> Vec<PathBuf> {
        self.calls.lock().iter().map(|(p, _)| p.clone()).collect()
    }
}

#[async_trait]
impl SubtitleFetcher for FakeFetcher {
    async fn fetch(
        &self,
        request: FetchRequest<'_>,
        sink: &dyn EventSink,
    ) -> std::result::Result<(), FetchError> {
        self.calls
            .lock()
            .push((request.video.to_path_buf(), request.languages.to_vec()));
        sink.emit(EventMessage::log(format!(
            "fake fetch {}",
            file_name(request.video)
        )));

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        match self.failures.get(request.video) {
            Some(code) => Err(FetchError::Unsuccessful { code: Some(*code) }),
            None => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
