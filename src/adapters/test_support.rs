//! Fake port implementations for worker/integration tests. Not compiled into
//! the production binary's default wiring, but kept unconditional (not
//! `#[cfg(test)]`) so integration tests under `tests/` can use them too.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::ports::downloader::{DownloaderError, DownloaderPort};
use crate::ports::errors::{ErrorLog, ErrorMonitorPort};
use crate::ports::media::{MediaToolsError, MediaToolsPort};
use crate::ports::pdf::{PdfWriterError, PdfWriterPort};
use crate::ports::transcriber::{TranscriberError, TranscriberPort, TranscriptionResult};
use crate::processing::vtt::TimedText;
use crate::shared::ensure_directory;

/// Copies a local file into `out_dir`; fails for anything that doesn't look
/// like a `file://` or bare filesystem path, since fake test runs never hit
/// the network.
pub struct FakeDownloader;

#[async_trait]
impl DownloaderPort for FakeDownloader {
    async fn download(
        &self,
        url: &str,
        out_dir: &Path,
        _cookies_from_browser: Option<&str>,
    ) -> Result<PathBuf, DownloaderError> {
        let source = url.strip_prefix("file://").unwrap_or(url);
        let source = PathBuf::from(source);
        ensure_directory(out_dir).map_err(|e| DownloaderError::Failed(e.to_string()))?;
        let file_name = source.file_name().ok_or_else(|| DownloaderError::Failed("no file name in url".to_string()))?;
        let dest = out_dir.join(file_name);
        std::fs::copy(&source, &dest).map_err(|e| DownloaderError::Failed(e.to_string()))?;
        Ok(dest)
    }
}

/// Writes silent/empty placeholder media instead of shelling out to ffmpeg,
/// so pipeline tests can run without the real tool installed. `export_chunk`
/// and `normalize_to_wav` just copy the source bytes through.
pub struct FakeMediaTools {
    pub duration_seconds: f64,
    pub silence_report: String,
}

impl FakeMediaTools {
    pub fn new(duration_seconds: f64, silence_report: impl Into<String>) -> Self {
        FakeMediaTools { duration_seconds, silence_report: silence_report.into() }
    }
}

#[async_trait]
impl MediaToolsPort for FakeMediaTools {
    async fn normalize_to_wav(&self, input_path: &Path, out_path: &Path) -> Result<(), MediaToolsError> {
        if let Some(parent) = out_path.parent() {
            ensure_directory(parent).map_err(|e| MediaToolsError::Failed(e.to_string()))?;
        }
        std::fs::copy(input_path, out_path).map_err(|e| MediaToolsError::Failed(e.to_string()))?;
        Ok(())
    }

    async fn export_chunk(
        &self,
        audio_path: &Path,
        chunk_path: &Path,
        _start: f64,
        _end: f64,
    ) -> Result<(), MediaToolsError> {
        if let Some(parent) = chunk_path.parent() {
            ensure_directory(parent).map_err(|e| MediaToolsError::Failed(e.to_string()))?;
        }
        std::fs::copy(audio_path, chunk_path).map_err(|e| MediaToolsError::Failed(e.to_string()))?;
        Ok(())
    }

    async fn probe_duration_seconds(&self, _media_path: &Path) -> Result<f64, MediaToolsError> {
        Ok(self.duration_seconds)
    }

    async fn detect_silence(
        &self,
        _audio_path: &Path,
        _silence_db: &str,
        _silence_min_duration: f64,
    ) -> Result<String, MediaToolsError> {
        Ok(self.silence_report.clone())
    }

    async fn ensure_mp4(&self, input_path: &Path, _out_dir: &Path) -> Result<PathBuf, MediaToolsError> {
        Ok(input_path.to_path_buf())
    }
}

/// Returns a fixed transcript per chunk path, keyed by file name so tests
/// can assign different text to different chunks.
pub struct FakeTranscriber {
    by_chunk_name: Mutex<HashMap<String, Vec<TimedText>>>,
    default_segments: Vec<TimedText>,
}

impl FakeTranscriber {
    pub fn new(default_segments: Vec<TimedText>) -> Self {
        FakeTranscriber { by_chunk_name: Mutex::new(HashMap::new()), default_segments }
    }

    pub fn with_chunk(self, chunk_name: impl Into<String>, segments: Vec<TimedText>) -> Self {
        self.by_chunk_name.lock().unwrap().insert(chunk_name.into(), segments);
        self
    }
}

#[async_trait]
impl TranscriberPort for FakeTranscriber {
    async fn transcribe_chunk(&self, chunk_path: &Path, _language: &str) -> Result<TranscriptionResult, TranscriberError> {
        let name = chunk_path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let table = self.by_chunk_name.lock().unwrap();
        let segments = table.get(name).cloned().unwrap_or_else(|| self.default_segments.clone());
        Ok(TranscriptionResult { segments })
    }
}

/// Writes a plain-text stand-in instead of a real PDF so tests can assert on
/// its contents without a PDF parser.
pub struct FakePdfWriter;

#[async_trait]
impl PdfWriterPort for FakePdfWriter {
    async fn write_pdf(
        &self,
        pdf_path: &Path,
        title: Option<&str>,
        source_url: Option<&str>,
        transcript_lines: &[String],
        sponsor_text: &str,
    ) -> Result<PathBuf, PdfWriterError> {
        if let Some(parent) = pdf_path.parent() {
            ensure_directory(parent).map_err(|e| PdfWriterError::Failed(e.to_string()))?;
        }
        let mut body = String::new();
        if let Some(title) = title {
            body.push_str(title);
            body.push('\n');
        }
        if let Some(url) = source_url {
            body.push_str(url);
            body.push('\n');
        }
        for line in transcript_lines {
            body.push_str(line);
            body.push('\n');
        }
        body.push_str(sponsor_text);
        std::fs::write(pdf_path, body).map_err(|e| PdfWriterError::Failed(e.to_string()))?;
        Ok(pdf_path.to_path_buf())
    }
}

/// Collects error reports in memory for assertions.
#[derive(Default)]
pub struct RecordingErrorMonitor {
    pub errors: Mutex<Vec<ErrorLog>>,
}

#[async_trait]
impl ErrorMonitorPort for RecordingErrorMonitor {
    async fn log_error(&self, error: ErrorLog) {
        self.errors.lock().unwrap().push(error);
    }
}
