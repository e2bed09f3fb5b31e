use thiserror::Error;

use crate::jobs::store::JobStoreError;
use crate::ports::downloader::DownloaderError;
use crate::ports::media::MediaToolsError;
use crate::ports::pdf::PdfWriterError;
use crate::ports::transcriber::TranscriberError;

/// The pipeline-wide error taxonomy, per spec.md §7. `Canceled` is not an
/// error in the usual sense — stage workers treat it as a signal to return
/// silently rather than fail the job — but it needs a variant here so a
/// worker's top-level `?` plumbing has one error type to converge on.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("input not found: {0}")]
    InputNotFound(String),
    #[error("missing upload")]
    MissingUpload,
    #[error("downloader failed: {0}")]
    DownloaderFailed(#[from] DownloaderError),
    #[error("media tool failed: {0}")]
    MediaToolFailed(#[from] MediaToolsError),
    #[error("segmentation failed: {0}")]
    SegmentationFailed(String),
    #[error("asr failed: {0}")]
    AsrFailed(#[from] TranscriberError),
    #[error("partial write failed: {0}")]
    PartialWriteFailed(String),
    #[error("merge failed: {0}")]
    MergeFailed(String),
    #[error("packaging failed: {0}")]
    PackagingFailed(String),
    #[error("pdf generation failed: {0}")]
    PdfFailed(#[from] PdfWriterError),
    #[error("job state is corrupted: {0}")]
    StateCorrupted(String),
    #[error("job was canceled")]
    Canceled,
    #[error("job store error: {0}")]
    Store(#[from] JobStoreError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn is_canceled(&self) -> bool {
        matches!(self, PipelineError::Canceled)
    }
}
