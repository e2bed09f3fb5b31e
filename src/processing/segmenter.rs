use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub index: u32,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone)]
pub struct SegmenterResult {
    pub duration: f64,
    pub segments: Vec<Segment>,
}

fn silence_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"silence_start:\s*(\d+(?:\.\d+)?)").unwrap())
}

fn silence_end_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"silence_end:\s*(\d+(?:\.\d+)?)").unwrap())
}

/// Parses `ffmpeg -af silencedetect` stderr output into `(start, end)` pairs.
pub fn parse_silencedetect_output(output: &str) -> Vec<(f64, f64)> {
    let mut silences = Vec::new();
    let mut cur_start: Option<f64> = None;

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(caps) = silence_start_re().captures(line) {
            cur_start = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok());
            continue;
        }
        if let Some(caps) = silence_end_re().captures(line) {
            if let (Some(start), Some(end)) = (
                cur_start,
                caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok()),
            ) {
                if end > start {
                    silences.push((start, end));
                }
            }
            cur_start = None;
        }
    }

    silences
}

/// Splits every `(start,end)` interval longer than `max_seconds` into
/// consecutive windows of exactly `max_seconds`, except the last which may
/// be shorter. Tie-break: always split from the left edge (spec.md §4.3).
fn split_long_segments(segments: Vec<(f64, f64)>, max_seconds: f64) -> Vec<(f64, f64)> {
    if max_seconds <= 0.0 {
        return segments;
    }
    let mut result = Vec::new();
    for (start, end) in segments {
        let mut cur = start;
        while cur < end {
            let next = (cur + max_seconds).min(end);
            result.push((cur, next));
            cur = next;
        }
    }
    result
}

/// Builds speech segments from silence intervals per spec.md §4.3 "silence
/// mode": walk silences in order, emitting the speech span before each one;
/// emit the trailing span after the last silence; fall back to the whole
/// clip if nothing was emitted.
pub fn segments_from_silence(
    silences: &[(f64, f64)],
    duration: f64,
    max_chunk_seconds: f64,
) -> Vec<(f64, f64)> {
    let mut segments = Vec::new();
    let mut cur = 0.0f64;

    for &(s, e) in silences {
        if s > cur {
            segments.push((cur, s));
        }
        cur = cur.max(e);
    }

    if duration > cur {
        segments.push((cur, duration));
    }

    if segments.is_empty() && duration > 0.0 {
        segments = vec![(0.0, duration)];
    }

    let segments: Vec<(f64, f64)> = segments.into_iter().filter(|(s, e)| e > s).collect();
    split_long_segments(segments, max_chunk_seconds)
}

/// Converts VAD speech timestamps (in 16kHz sample frames) to seconds, drops
/// empties, and falls back to one span covering the whole clip if none
/// remain — spec.md §4.3 "vad mode".
pub fn segments_from_vad_frames(
    speech_frames: &[(u64, u64)],
    total_samples: u64,
    max_chunk_seconds: f64,
) -> Vec<(f64, f64)> {
    const SAMPLE_RATE: f64 = 16_000.0;
    let mut segments: Vec<(f64, f64)> = speech_frames
        .iter()
        .map(|&(s, e)| (s as f64 / SAMPLE_RATE, e as f64 / SAMPLE_RATE))
        .filter(|(s, e)| e > s)
        .collect();

    if segments.is_empty() {
        segments = vec![(0.0, total_samples as f64 / SAMPLE_RATE)];
    }

    split_long_segments(segments, max_chunk_seconds)
}

/// Assigns 1-based indices in plan order.
pub fn to_plan(raw_segments: Vec<(f64, f64)>) -> Vec<Segment> {
    raw_segments
        .into_iter()
        .enumerate()
        .map(|(i, (start, end))| Segment { index: (i + 1) as u32, start, end })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // S1: two silences, duration=6.0, cap=2 -> [(0,1),(2,4),(4.5,6)]
    #[test]
    fn s1_silence_segmenter_scenario() {
        let output = "silence_start: 1.0\nsilence_end: 2.0 | silence_duration: 1.0\nsilence_start: 4.0\nsilence_end: 4.5 | silence_duration: 0.5\n";
        let silences = parse_silencedetect_output(output);
        assert_eq!(silences, vec![(1.0, 2.0), (4.0, 4.5)]);

        let segments = segments_from_silence(&silences, 6.0, 2.0);
        assert_eq!(segments, vec![(0.0, 1.0), (2.0, 4.0), (4.5, 6.0)]);
    }

    // S2: no silences, duration=5.0, cap=2 -> [(0,2),(2,4),(4,5)]
    #[test]
    fn s2_no_silences_long_segment_split() {
        let segments = segments_from_silence(&[], 5.0, 2.0);
        assert_eq!(segments, vec![(0.0, 2.0), (2.0, 4.0), (4.0, 5.0)]);
    }

    #[test]
    fn empty_silence_on_five_second_clip_cap_two() {
        let segments = segments_from_silence(&[], 5.0, 2.0);
        assert_eq!(segments, vec![(0.0, 2.0), (2.0, 4.0), (4.0, 5.0)]);
    }

    #[test]
    fn zero_duration_yields_no_segments() {
        let segments = segments_from_silence(&[], 0.0, 2.0);
        assert!(segments.is_empty());
    }

    #[test]
    fn vad_frames_convert_to_seconds_and_drop_empties() {
        let frames = vec![(0, 16_000), (16_000, 16_000), (32_000, 48_000)];
        let segments = segments_from_vad_frames(&frames, 64_000, 120.0);
        assert_eq!(segments, vec![(0.0, 1.0), (2.0, 3.0)]);
    }

    #[test]
    fn vad_falls_back_to_whole_clip_when_no_speech() {
        let segments = segments_from_vad_frames(&[], 32_000, 120.0);
        assert_eq!(segments, vec![(0.0, 2.0)]);
    }

    #[test]
    fn plan_assigns_one_based_indices_in_order() {
        let plan = to_plan(vec![(0.0, 1.0), (1.0, 2.5)]);
        assert_eq!(plan[0].index, 1);
        assert_eq!(plan[1].index, 2);
        assert_eq!(plan[1].start, 1.0);
    }
}
