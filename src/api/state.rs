//! Application state for the API server

use crate::SubtitleService;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request; the service itself is a bundle of `Arc`s.
#[derive(Clone)]
pub struct AppState {
    /// The service every handler talks to
    pub service: SubtitleService,
}

impl AppState {
    /// Create a new AppState
    pub fn new(service: SubtitleService) -> Self {
        Self { service }
    }
}
