use std::path::Path;

use crate::ports::transcriber::{TranscriberError, TranscriberPort};
use crate::shared::remove_diacritics_to_ascii;

use super::vtt::TimedText;

pub struct ChunkResult {
    pub segments: Vec<TimedText>,
    pub text: String,
}

/// Transcribes one audio chunk and shifts its segment timestamps into the
/// full clip's timeline, per spec.md §4.4 / original
/// `FasterWhisperChunkTranscriber.transcribe_chunk`: diacritics are
/// stripped, and any segment left empty or with `end <= start` after
/// shifting is dropped.
pub async fn transcribe_chunk(
    engine: &dyn TranscriberPort,
    chunk_path: &Path,
    chunk_start: f64,
    language: &str,
) -> Result<ChunkResult, TranscriberError> {
    let raw = engine.transcribe_chunk(chunk_path, language).await?;

    let mut segments = Vec::new();
    let mut texts = Vec::new();

    for seg in raw.segments {
        let text = remove_diacritics_to_ascii(&seg.text);
        if text.is_empty() {
            continue;
        }
        let start = seg.start + chunk_start;
        let end = seg.end + chunk_start;
        if end <= start {
            continue;
        }
        texts.push(text.clone());
        segments.push(TimedText { start, end, text });
    }

    Ok(ChunkResult { segments, text: texts.join(" ").trim().to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::ports::transcriber::TranscriptionResult;

    struct FakeEngine {
        segments: Vec<TimedText>,
    }

    #[async_trait]
    impl TranscriberPort for FakeEngine {
        async fn transcribe_chunk(
            &self,
            _chunk_path: &Path,
            _language: &str,
        ) -> Result<TranscriptionResult, TranscriberError> {
            Ok(TranscriptionResult { segments: self.segments.clone() })
        }
    }

    #[tokio::test]
    async fn shifts_timestamps_by_chunk_start_and_strips_diacritics() {
        let engine = FakeEngine {
            segments: vec![
                TimedText { start: 0.0, end: 1.0, text: "holá".to_string() },
                TimedText { start: 1.0, end: 1.0, text: "empty span".to_string() },
                TimedText { start: 2.0, end: 2.5, text: "   ".to_string() },
            ],
        };

        let result = transcribe_chunk(&engine, Path::new("chunk.wav"), 10.0, "es").await.unwrap();
        assert_eq!(result.segments, vec![TimedText { start: 10.0, end: 11.0, text: "hola".to_string() }]);
        assert_eq!(result.text, "hola");
    }
}
