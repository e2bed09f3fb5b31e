use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DownloaderError {
    #[error("download failed: {0}")]
    Failed(String),
}

/// Fetches remote media (http(s) URL or a yt-dlp-style source) into
/// `out_dir`, per spec.md §4.3 `_ensure_original`.
#[async_trait]
pub trait DownloaderPort: Send + Sync {
    async fn download(
        &self,
        url: &str,
        out_dir: &Path,
        cookies_from_browser: Option<&str>,
    ) -> Result<PathBuf, DownloaderError>;
}
