use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfWriterError {
    #[error("pdf generation failed: {0}")]
    Failed(String),
}

/// Writes the final transcript as a PDF, per spec.md §4.6 / original
/// `PdfWriterPort.write_pdf`.
#[async_trait]
pub trait PdfWriterPort: Send + Sync {
    async fn write_pdf(
        &self,
        pdf_path: &Path,
        title: Option<&str>,
        source_url: Option<&str>,
        transcript_lines: &[String],
        sponsor_text: &str,
    ) -> Result<PathBuf, PdfWriterError>;
}
