//! Video discovery and subtitle coverage checks

use crate::error::{Error, Result};
use crate::types::PathStatus;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Video file extensions we recognize (compared case-insensitively)
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "m4v", "ts"];

/// Enumerates video files under a set of search roots
#[async_trait]
pub trait VideoScanner: Send + Sync {
    /// Return every video under `roots`, in walk order
    ///
    /// # Errors
    ///
    /// Returns [`Error::Scan`] if a root is missing or not a directory.
    async fn scan(&self, roots: &[PathBuf]) -> Result<Vec<PathBuf>>;
}

/// Recursive scanner backed by `walkdir`
#[derive(Debug, Clone, Default)]
pub struct WalkdirScanner {
    follow_links: bool,
}

impl WalkdirScanner {
    /// Create a scanner that does not follow symlinks
    pub fn new() -> Self {
        Self::default()
    }

    /// Follow symlinked directories while walking
    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    fn walk_root(&self, root: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
        match std::fs::metadata(root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(Error::Scan {
                    path: root.to_path_buf(),
                    reason: "not a directory".to_string(),
                });
            }
            Err(e) => {
                return Err(Error::Scan {
                    path: root.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        }

        for entry in WalkDir::new(root)
            .follow_links(self.follow_links)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(root = %root.display(), error = %e, "Error accessing path, skipping");
                    continue;
                }
            };

            // Symlinked videos count; dangling links do not
            let is_file = if entry.path_is_symlink() {
                entry.path().is_file()
            } else {
                entry.file_type().is_file()
            };
            if is_file && is_video(entry.path()) {
                found.push(entry.into_path());
            }
        }

        Ok(())
    }
}

#[async_trait]
impl VideoScanner for WalkdirScanner {
    async fn scan(&self, roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let scanner = self.clone();
        let roots = roots.to_vec();

        tokio::task::spawn_blocking(move || {
            let mut found = Vec::new();
            for root in &roots {
                scanner.walk_root(root, &mut found)?;
            }
            tracing::debug!(roots = roots.len(), videos = found.len(), "video scan complete");
            Ok(found)
        })
        .await
        .map_err(|e| Error::Other(format!("video scan task failed: {e}")))?
    }
}

/// Whether `path` has one of the [`VIDEO_EXTENSIONS`]
pub fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            VIDEO_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Path of the external subtitle for `video` in `language`: `movie.mkv` → `movie.en.srt`
pub fn expected_subtitle(video: &Path, language: &str) -> PathBuf {
    video.with_extension(format!("{language}.srt"))
}

/// Languages from `languages` that have no subtitle next to `video`
pub async fn missing_languages(video: &Path, languages: &[String]) -> Vec<String> {
    let mut missing = Vec::new();
    for language in languages {
        let subtitle = expected_subtitle(video, language);
        // An unreadable location counts as missing
        if !tokio::fs::try_exists(&subtitle).await.unwrap_or(false) {
            missing.push(language.clone());
        }
    }
    missing
}

/// Per-path video and missing-subtitle counts
///
/// A path that cannot be scanned yields an entry with `error` set instead of
/// failing the whole report.
pub async fn scan_media_status(
    scanner: &dyn VideoScanner,
    paths: &[PathBuf],
    languages: &[String],
) -> Vec<PathStatus> {
    let mut results = Vec::with_capacity(paths.len());

    for path in paths {
        let mut status = PathStatus {
            path: path.display().to_string(),
            ..Default::default()
        };

        match scanner.scan(std::slice::from_ref(path)).await {
            Ok(videos) => {
                status.videos = videos.len();
                for video in &videos {
                    status.missing += missing_languages(video, languages).await.len();
                }
            }
            Err(Error::Scan { .. }) => {
                status.error = Some("Path not found or is not a directory.".to_string());
            }
            Err(e) => {
                status.error = Some(format!("Error scanning videos: {e}"));
            }
        }

        results.push(status);
    }

    results
}
