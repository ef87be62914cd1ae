//! Configuration types for subtitlarr

use crate::broadcast::DEFAULT_QUEUE_CAPACITY;
use crate::error::{Error, Result};
use crate::event_log::DEFAULT_HISTORY_LIMIT;
use crate::periodic::MAX_INTERVAL_MINUTES;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, path::PathBuf};
use utoipa::ToSchema;

/// Placeholder shown instead of secrets by [`Config::redacted`]
pub const REDACTED: &str = "***REDACTED***";

/// Login for one subtitle provider
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProviderCredentials {
    /// Account name; the provider is only passed to subliminal when set
    #[serde(default)]
    pub username: String,

    /// Account password
    #[serde(default)]
    pub password: String,

    /// API key (only used by opensubtitles.com)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Credentials for every provider subliminal is told about
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Credentials {
    /// opensubtitles.org
    #[serde(default)]
    pub opensubtitles: ProviderCredentials,

    /// opensubtitles.com
    #[serde(default)]
    pub opensubtitlescom: ProviderCredentials,

    /// addic7ed.com
    #[serde(default)]
    pub addic7ed: ProviderCredentials,
}

/// Payload shape used when posting to a webhook
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum WebhookType {
    /// Slack for `hooks.slack.com` URLs, Discord shape otherwise
    #[default]
    Auto,
    /// `{"content": ...}` (Discord and most generic receivers)
    Discord,
    /// `{"text": ...}`
    Slack,
}

/// Webhook notification settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NotificationConfig {
    /// Master switch
    #[serde(default)]
    pub enabled: bool,

    /// Target URL
    #[serde(default)]
    pub webhook_url: String,

    /// Notify when a run starts
    #[serde(default = "default_true")]
    pub notify_on_start: bool,

    /// Notify with the summary when a run finishes
    #[serde(default = "default_true")]
    pub notify_on_completion: bool,

    /// Notify when a run fails to scan
    #[serde(default = "default_true")]
    pub notify_on_errors: bool,

    /// Include the error text in error notifications
    #[serde(default = "default_true")]
    pub include_errors: bool,

    /// Payload shape
    #[serde(default)]
    pub webhook_type: WebhookType,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            webhook_url: String::new(),
            notify_on_start: true,
            notify_on_completion: true,
            notify_on_errors: true,
            include_errors: true,
            webhook_type: WebhookType::default(),
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 0.0.0.0:5000)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Optional API key for authentication
    #[serde(default)]
    pub api_key: Option<String>,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,

    /// Serve the browser console at / (default: true)
    #[serde(default = "default_true")]
    pub web_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            api_key: None,
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
            web_ui: true,
        }
    }
}

/// External tool configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ToolsConfig {
    /// Path to the subliminal executable (auto-detected if None)
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub subliminal_path: Option<PathBuf>,

    /// Whether to search PATH for subliminal if no explicit path is set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            subliminal_path: None,
            search_path: true,
        }
    }
}

/// Main configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Directories scanned for videos
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub search_paths: Vec<PathBuf>,

    /// Subtitle language codes to fetch (e.g. "en", "es")
    #[serde(default)]
    pub languages: Vec<String>,

    /// Run the scan periodically
    #[serde(default)]
    pub schedule_enabled: bool,

    /// Minutes between scheduled runs (default: 60)
    #[serde(default = "default_schedule_interval")]
    pub schedule_interval_minutes: i64,

    /// Provider logins
    #[serde(default)]
    pub credentials: Credentials,

    /// Webhook notifications
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// REST API server
    #[serde(default)]
    pub api: ApiConfig,

    /// External tools
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Log entries kept in memory (default: 1000)
    #[serde(default = "default_history_limit")]
    pub log_history_limit: usize,

    /// Live messages buffered per stream viewer (default: 10)
    #[serde(default = "default_queue_capacity")]
    pub subscriber_queue_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_paths: Vec::new(),
            languages: Vec::new(),
            schedule_enabled: false,
            schedule_interval_minutes: default_schedule_interval(),
            credentials: Credentials::default(),
            notifications: NotificationConfig::default(),
            api: ApiConfig::default(),
            tools: ToolsConfig::default(),
            log_history_limit: default_history_limit(),
            subscriber_queue_capacity: default_queue_capacity(),
        }
    }
}

impl Config {
    /// Load from a JSON file, then merge environment overrides
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] for malformed JSON and [`Error::Io`]
    /// when the file exists but cannot be read.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "config file not found, using defaults");
                Self::default()
            }
            Err(e) => return Err(Error::Io(e)),
        };
        config.merge_env();
        Ok(config)
    }

    /// Write as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Fill credentials from environment variables
    ///
    /// Set variables override file values, except `OPENSUBTITLES_API_KEY`,
    /// which only fills an empty opensubtitles.com password.
    pub fn merge_env(&mut self) {
        let creds = &mut self.credentials;
        override_from_env(&mut creds.opensubtitles.username, "OPENSUBTITLES_USERNAME");
        override_from_env(&mut creds.opensubtitles.password, "OPENSUBTITLES_PASSWORD");
        override_from_env(
            &mut creds.opensubtitlescom.username,
            "OPENSUBTITLESCOM_USERNAME",
        );
        override_from_env(
            &mut creds.opensubtitlescom.password,
            "OPENSUBTITLESCOM_PASSWORD",
        );
        if creds.opensubtitlescom.password.is_empty() {
            override_from_env(&mut creds.opensubtitlescom.password, "OPENSUBTITLES_API_KEY");
        }
        override_from_env(&mut creds.addic7ed.username, "ADDIC7ED_USERNAME");
        override_from_env(&mut creds.addic7ed.password, "ADDIC7ED_PASSWORD");
    }

    /// Reject values that cannot work at all
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the offending key.
    pub fn validate(&self) -> Result<()> {
        if self.schedule_enabled
            && !(1..=MAX_INTERVAL_MINUTES).contains(&self.schedule_interval_minutes)
        {
            return Err(Error::Config {
                message: format!(
                    "schedule interval must be between 1 and {MAX_INTERVAL_MINUTES} minutes"
                ),
                key: Some("schedule_interval_minutes".to_string()),
            });
        }
        if self.languages.iter().any(|l| l.trim().is_empty()) {
            return Err(Error::Config {
                message: "language codes must not be empty".to_string(),
                key: Some("languages".to_string()),
            });
        }
        Ok(())
    }

    /// Copy with every secret replaced by [`REDACTED`]
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        for provider in [
            &mut config.credentials.opensubtitles,
            &mut config.credentials.opensubtitlescom,
            &mut config.credentials.addic7ed,
        ] {
            redact(&mut provider.password);
            if let Some(key) = provider.api_key.as_mut() {
                redact(key);
            }
        }
        if let Some(key) = config.api.api_key.as_mut() {
            redact(key);
        }
        config.notifications.webhook_url = redact_url(&config.notifications.webhook_url);
        config
    }

    /// Put back secrets a client echoed as [`REDACTED`] from `current`
    ///
    /// Lets a client post back what `GET /config` returned without wiping
    /// stored passwords.
    pub fn restore_redacted(&mut self, current: &Config) {
        for (provider, stored) in [
            (
                &mut self.credentials.opensubtitles,
                &current.credentials.opensubtitles,
            ),
            (
                &mut self.credentials.opensubtitlescom,
                &current.credentials.opensubtitlescom,
            ),
            (&mut self.credentials.addic7ed, &current.credentials.addic7ed),
        ] {
            if provider.password == REDACTED {
                provider.password = stored.password.clone();
            }
            if provider.api_key.as_deref() == Some(REDACTED) {
                provider.api_key = stored.api_key.clone();
            }
        }
        if self.api.api_key.as_deref() == Some(REDACTED) {
            self.api.api_key = current.api.api_key.clone();
        }
        if self.notifications.webhook_url.ends_with(REDACTED) {
            self.notifications.webhook_url = current.notifications.webhook_url.clone();
        }
    }
}

fn override_from_env(field: &mut String, var: &str) {
    if let Ok(value) = std::env::var(var)
        && !value.is_empty()
    {
        *field = value;
    }
}

fn redact(value: &mut String) {
    if !value.is_empty() {
        *value = REDACTED.to_string();
    }
}

// Webhook URLs carry their secret in the path; keep scheme and host only
fn redact_url(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }
    match url.split_once("://") {
        Some((scheme, rest)) => {
            let host = rest.split('/').next().unwrap_or_default();
            format!("{scheme}://{host}/{REDACTED}")
        }
        None => REDACTED.to_string(),
    }
}

fn default_true() -> bool {
    true
}

fn default_schedule_interval() -> i64 {
    60
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 5000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
