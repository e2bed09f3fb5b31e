use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::ports::media::{MediaToolsError, MediaToolsPort};

/// Shells out to `ffmpeg`/`ffprobe`, grounded on the original
/// `_normalize_audio`/`_export_chunk`/`ffprobe_duration_seconds`/
/// `parse_silencedetect_output` call sites and `FfmpegMediaConverter`.
pub struct FfmpegMediaTools {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl FfmpegMediaTools {
    pub fn new(ffmpeg: PathBuf, ffprobe: PathBuf) -> Self {
        FfmpegMediaTools { ffmpeg, ffprobe }
    }

    /// Resolves `ffmpeg`/`ffprobe` from `PATH`, per original `ensure_ffmpeg`
    /// (minus the Windows auto-download fallback, which is out of scope for
    /// a server deployment).
    pub fn from_path() -> Result<Self, MediaToolsError> {
        let ffmpeg = which::which("ffmpeg").map_err(|_| {
            MediaToolsError::Failed("ffmpeg not found in PATH".to_string())
        })?;
        let ffprobe = which::which("ffprobe").map_err(|_| {
            MediaToolsError::Failed("ffprobe not found in PATH".to_string())
        })?;
        Ok(FfmpegMediaTools { ffmpeg, ffprobe })
    }

    async fn run(&self, program: &Path, args: &[&str]) -> Result<std::process::Output, MediaToolsError> {
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| MediaToolsError::Failed(e.to_string()))
    }
}

#[async_trait]
impl MediaToolsPort for FfmpegMediaTools {
    async fn normalize_to_wav(&self, input_path: &Path, out_path: &Path) -> Result<(), MediaToolsError> {
        let output = self
            .run(
                &self.ffmpeg,
                &[
                    "-hide_banner",
                    "-loglevel",
                    "error",
                    "-y",
                    "-i",
                    input_path.to_str().unwrap_or_default(),
                    "-ac",
                    "1",
                    "-ar",
                    "16000",
                    "-vn",
                    "-c:a",
                    "pcm_s16le",
                    out_path.to_str().unwrap_or_default(),
                ],
            )
            .await?;
        if !output.status.success() {
            return Err(MediaToolsError::Failed(String::from_utf8_lossy(&output.stderr).to_string()));
        }
        Ok(())
    }

    async fn export_chunk(
        &self,
        audio_path: &Path,
        chunk_path: &Path,
        start: f64,
        end: f64,
    ) -> Result<(), MediaToolsError> {
        let duration = (end - start).max(0.01);
        let output = self
            .run(
                &self.ffmpeg,
                &[
                    "-hide_banner",
                    "-loglevel",
                    "error",
                    "-y",
                    "-i",
                    audio_path.to_str().unwrap_or_default(),
                    "-ss",
                    &format!("{start:.3}"),
                    "-t",
                    &format!("{duration:.3}"),
                    "-ac",
                    "1",
                    "-ar",
                    "16000",
                    "-c:a",
                    "pcm_s16le",
                    chunk_path.to_str().unwrap_or_default(),
                ],
            )
            .await?;
        if !output.status.success() {
            return Err(MediaToolsError::Failed(String::from_utf8_lossy(&output.stderr).to_string()));
        }
        Ok(())
    }

    async fn probe_duration_seconds(&self, media_path: &Path) -> Result<f64, MediaToolsError> {
        let output = self
            .run(
                &self.ffprobe,
                &[
                    "-v",
                    "error",
                    "-show_entries",
                    "format=duration",
                    "-of",
                    "default=noprint_wrappers=1:nokey=1",
                    media_path.to_str().unwrap_or_default(),
                ],
            )
            .await?;
        let raw = String::from_utf8_lossy(&output.stdout);
        Ok(raw.trim().parse::<f64>().unwrap_or(0.0))
    }

    async fn detect_silence(
        &self,
        audio_path: &Path,
        silence_db: &str,
        silence_min_duration: f64,
    ) -> Result<String, MediaToolsError> {
        let filter = format!("silencedetect=noise={silence_db}:d={silence_min_duration}");
        let output = self
            .run(
                &self.ffmpeg,
                &[
                    "-hide_banner",
                    "-i",
                    audio_path.to_str().unwrap_or_default(),
                    "-af",
                    &filter,
                    "-f",
                    "null",
                    "-",
                ],
            )
            .await?;
        Ok(String::from_utf8_lossy(&output.stderr).to_string())
    }

    async fn ensure_mp4(&self, input_path: &Path, out_dir: &Path) -> Result<PathBuf, MediaToolsError> {
        if input_path.extension().map(|e| e.eq_ignore_ascii_case("mp4")).unwrap_or(false) {
            return Ok(input_path.to_path_buf());
        }
        let stem = input_path.file_stem().and_then(|s| s.to_str()).unwrap_or("media");
        let mp4_path = out_dir.join(format!("{stem}.mp4"));
        let output = self
            .run(
                &self.ffmpeg,
                &[
                    "-hide_banner",
                    "-loglevel",
                    "error",
                    "-y",
                    "-i",
                    input_path.to_str().unwrap_or_default(),
                    "-vn",
                    "-c:a",
                    "aac",
                    "-b:a",
                    "192k",
                    mp4_path.to_str().unwrap_or_default(),
                ],
            )
            .await?;
        if !output.status.success() {
            return Err(MediaToolsError::Failed(String::from_utf8_lossy(&output.stderr).to_string()));
        }
        Ok(mp4_path)
    }
}
