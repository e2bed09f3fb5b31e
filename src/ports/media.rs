use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediaToolsError {
    #[error("media tool failed: {0}")]
    Failed(String),
}

/// Wraps the ffmpeg/ffprobe invocations used by the splitter, grounded on
/// the original `_normalize_audio`/`_export_chunk`/`ffprobe_duration_seconds`/
/// `parse_silencedetect_output` call sites. Kept as one port (rather than
/// one trait per binary) because every operation shells out to the same
/// pair of tools and a fake test double needs to stand in for all of them
/// at once.
#[async_trait]
pub trait MediaToolsPort: Send + Sync {
    /// Converts arbitrary input media into the mono/16kHz/pcm_s16le wav the
    /// rest of the pipeline assumes.
    async fn normalize_to_wav(&self, input_path: &Path, out_path: &Path) -> Result<(), MediaToolsError>;

    /// Exports `[start, end)` of `audio_path` into `chunk_path`, same wav format.
    async fn export_chunk(
        &self,
        audio_path: &Path,
        chunk_path: &Path,
        start: f64,
        end: f64,
    ) -> Result<(), MediaToolsError>;

    async fn probe_duration_seconds(&self, media_path: &Path) -> Result<f64, MediaToolsError>;

    /// Raw `ffmpeg -af silencedetect` stderr text; callers parse it with
    /// `processing::segmenter::parse_silencedetect_output`.
    async fn detect_silence(
        &self,
        audio_path: &Path,
        silence_db: &str,
        silence_min_duration: f64,
    ) -> Result<String, MediaToolsError>;

    /// Transcodes non-mp4 input to mp4 for the final package, grounded on
    /// `MediaConverterPort.ensure_mp4`. Returns the input path unchanged if
    /// it is already an mp4.
    async fn ensure_mp4(&self, input_path: &Path, out_dir: &Path) -> Result<PathBuf, MediaToolsError>;
}
