use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::processing::vtt::TimedText;

#[derive(Error, Debug)]
pub enum TranscriberError {
    #[error("engine error: {0}")]
    Engine(String),
}

/// Raw segments an ASR engine produces for one audio chunk, in chunk-local
/// time (i.e. not yet shifted by the chunk's offset into the full clip).
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionResult {
    pub segments: Vec<TimedText>,
}

/// The chunk-level ASR engine, grounded on the original
/// `FasterWhisperChunkTranscriber.transcribe_chunk` — a narrow seam so a
/// real faster-whisper binding (or any other engine) can be swapped in
/// behind a test double.
#[async_trait]
pub trait TranscriberPort: Send + Sync {
    async fn transcribe_chunk(
        &self,
        chunk_path: &Path,
        language: &str,
    ) -> Result<TranscriptionResult, TranscriberError>;
}
