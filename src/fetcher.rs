//! External subtitle tool invocation
//!
//! [`SubliminalFetcher`] runs the `subliminal` CLI once per video and streams
//! its output into the event log while it runs.

use crate::config::{Credentials, ProviderCredentials, ToolsConfig};
use crate::driver::EventSink;
use crate::error::FetchError;
use crate::types::EventMessage;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

/// Name of the binary looked up on `PATH`
pub const SUBLIMINAL_BINARY: &str = "subliminal";

/// One subtitle download request
#[derive(Clone, Copy, Debug)]
pub struct FetchRequest<'a> {
    /// Video to fetch subtitles for
    pub video: &'a Path,
    /// Languages still missing for this video
    pub languages: &'a [String],
    /// Provider logins passed to the tool
    pub credentials: &'a Credentials,
}

/// Downloads subtitles for a single video
#[async_trait]
pub trait SubtitleFetcher: Send + Sync {
    /// Fetch subtitles, forwarding tool output to `sink` as it arrives
    ///
    /// Returns only after the tool has exited and its output is drained.
    async fn fetch(
        &self,
        request: FetchRequest<'_>,
        sink: &dyn EventSink,
    ) -> Result<(), FetchError>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Fetcher backed by the `subliminal` command line tool
///
/// # Examples
///
/// ```no_run
/// use subtitlarr::fetcher::SubliminalFetcher;
/// use std::path::PathBuf;
///
/// // Explicit path
/// let fetcher = SubliminalFetcher::new(PathBuf::from("/usr/local/bin/subliminal"));
///
/// // Or auto-discover from PATH
/// let fetcher = SubliminalFetcher::from_path().expect("subliminal not found in PATH");
/// ```
#[derive(Clone, Debug)]
pub struct SubliminalFetcher {
    binary_path: PathBuf,
}

impl SubliminalFetcher {
    /// Create a fetcher with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find subliminal in PATH
    pub fn from_path() -> Option<Self> {
        which::which(SUBLIMINAL_BINARY).ok().map(Self::new)
    }

    /// Resolve the binary from tool settings
    ///
    /// Explicit path first, then a `PATH` lookup when allowed, then the bare
    /// name so the spawn error names the missing program.
    pub fn from_config(tools: &ToolsConfig) -> Self {
        if let Some(path) = &tools.subliminal_path {
            return Self::new(path.clone());
        }
        if tools.search_path
            && let Some(found) = Self::from_path()
        {
            tracing::debug!(path = %found.binary_path.display(), "found subliminal on PATH");
            return found;
        }
        tracing::warn!("subliminal not found on PATH, relying on the bare command name");
        Self::new(PathBuf::from(SUBLIMINAL_BINARY))
    }

    /// Path of the binary that will be executed
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// Command line arguments for one request
    ///
    /// Provider options precede the `download` subcommand. The
    /// opensubtitles.com API key is passed whenever it is set, with or
    /// without a login.
    pub fn build_args(request: &FetchRequest<'_>) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        let creds = request.credentials;

        push_provider(&mut args, "opensubtitles", &creds.opensubtitles);
        push_provider(&mut args, "opensubtitlescom", &creds.opensubtitlescom);
        if let Some(key) = creds.opensubtitlescom.api_key.as_deref()
            && !key.is_empty()
        {
            args.push("--provider.opensubtitlescom.apikey".into());
            args.push(key.into());
        }
        push_provider(&mut args, "addic7ed", &creds.addic7ed);

        args.push("download".into());
        for language in request.languages {
            args.push("-l".into());
            args.push(language.into());
        }
        args.push("--force-external-subtitles".into());
        args.push(request.video.as_os_str().to_owned());
        args
    }
}

fn push_provider(args: &mut Vec<OsString>, provider: &str, creds: &ProviderCredentials) {
    if creds.username.is_empty() {
        return;
    }
    args.push(format!("--provider.{provider}.username").into());
    args.push(creds.username.as_str().into());
    args.push(format!("--provider.{provider}.password").into());
    args.push(creds.password.as_str().into());
}

async fn forward_lines<R>(
    reader: Option<R>,
    stream: &'static str,
    sink: &dyn EventSink,
) -> Result<(), FetchError>
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return Ok(());
    };

    // Tool output may echo filenames in any encoding; decode lossily
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(|source| FetchError::Output { stream, source })?;
        if read == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim();
        if !line.is_empty() {
            sink.emit(EventMessage::log(line));
        }
    }
}

#[async_trait]
impl SubtitleFetcher for SubliminalFetcher {
    async fn fetch(
        &self,
        request: FetchRequest<'_>,
        sink: &dyn EventSink,
    ) -> Result<(), FetchError> {
        let args = Self::build_args(&request);
        tracing::debug!(
            video = %request.video.display(),
            languages = ?request.languages,
            "running subliminal"
        );

        let mut child = Command::new(&self.binary_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| FetchError::Spawn {
                program: self.binary_path.display().to_string(),
                source,
            })?;

        let (out, err) = tokio::join!(
            forward_lines(child.stdout.take(), "stdout", sink),
            forward_lines(child.stderr.take(), "stderr", sink),
        );

        // A reader gave up: make sure the child cannot block on a full pipe
        if (out.is_err() || err.is_err())
            && let Err(e) = child.start_kill()
        {
            tracing::debug!(error = %e, "failed to kill subliminal after read error");
        }

        let status = child.wait().await.map_err(FetchError::Wait)?;
        out?;
        err?;

        if !status.success() {
            return Err(FetchError::Unsuccessful {
                code: status.code(),
            });
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "subliminal"
    }
}
