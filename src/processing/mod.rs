pub mod chunk_transcriber;
pub mod merge;
pub mod segmenter;
pub mod vtt;

pub use chunk_transcriber::{transcribe_chunk, ChunkResult};
pub use merge::{normalize_segments, write_merge_outputs};
pub use segmenter::{
    parse_silencedetect_output, segments_from_silence, segments_from_vad_frames, to_plan, Segment,
    SegmenterResult,
};
pub use vtt::{format_timestamp, segments_to_vtt, TimedText};
