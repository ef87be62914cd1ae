//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`tasks`] - Starting runs, media status, log history
//! - [`config`] - Configuration and webhook test
//! - [`system`] - Health, status, live stream, OpenAPI

use serde::Serialize;

mod config;
mod system;
mod tasks;

pub use config::*;
pub use system::*;
pub use tasks::*;

// ============================================================================
// Response Types (shared across handlers)
// ============================================================================

/// Plain acknowledgement body
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    /// Human-readable outcome
    pub message: String,
}

impl MessageResponse {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
