use std::path::Path;

use super::vtt::{segments_to_vtt, TimedText};

/// De-duplicates and trims overlapping segments, in chunk-merge order.
///
/// Candidates are sorted by `(start, end)`. For each candidate that overlaps
/// the previously accepted segment, the previous segment's end is trimmed
/// back to the candidate's start (dropping the previous segment entirely if
/// that leaves it empty); if the candidate's text then matches the previous
/// segment's text case-insensitively it is treated as a duplicate and
/// dropped. This exact trim-then-duplicate-check order is load-bearing —
/// see spec.md §4.4 / original `_normalize_segments`.
pub fn normalize_segments(raw_segments: Vec<TimedText>) -> Vec<TimedText> {
    let mut candidates = raw_segments;
    candidates.sort_by(|a, b| {
        a.start
            .partial_cmp(&b.start)
            .unwrap()
            .then(a.end.partial_cmp(&b.end).unwrap())
    });

    let mut merged: Vec<TimedText> = Vec::new();

    for seg in candidates {
        let text = seg.text.trim().to_string();
        let start = seg.start;
        let end = seg.end;
        if text.is_empty() || end <= start {
            continue;
        }

        let mut dup = false;
        if let Some(prev) = merged.last_mut() {
            if start < prev.end {
                if start > prev.start {
                    prev.end = start;
                    if prev.end <= prev.start {
                        merged.pop();
                    }
                }
                if let Some(prev) = merged.last() {
                    if text.to_lowercase() == prev.text.to_lowercase() {
                        dup = true;
                    }
                }
            }
        }
        if dup {
            continue;
        }

        merged.push(TimedText { start, end, text });
    }

    merged
}

pub struct MergeOutputs {
    pub segments: Vec<TimedText>,
}

/// Writes `final.txt` (always), `final.json` (if `produce_json`) and
/// `final.vtt` (if `produce_vtt`) from the normalized segment list, per
/// spec.md §4.4 / original `merge_partials`.
pub fn write_merge_outputs(
    dir: &Path,
    segments: &[TimedText],
    produce_json: bool,
    produce_vtt: bool,
) -> std::io::Result<()> {
    let text = segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    std::fs::write(dir.join("final.txt"), format!("{}\n", text))?;

    if produce_json {
        let json_segments: Vec<_> = segments
            .iter()
            .map(|s| serde_json::json!({"start": s.start, "end": s.end, "text": s.text}))
            .collect();
        let payload = serde_json::to_vec_pretty(
            &serde_json::json!({ "segments": json_segments, "text": text }),
        )?;
        std::fs::write(dir.join("final.json"), payload)?;
    }

    if produce_vtt {
        std::fs::write(dir.join("final.vtt"), segments_to_vtt(segments))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: f64, end: f64, text: &str) -> TimedText {
        TimedText { start, end, text: text.to_string() }
    }

    // S3: overlapping segment trimmed back, then an exact-duplicate (after
    // trim, same text case-insensitively) dropped entirely.
    #[test]
    fn s3_merge_overlap_and_duplicate_scenario() {
        let raw = vec![
            seg(0.0, 2.0, "hola mundo"),
            seg(1.5, 3.0, "Hola Mundo"),
            seg(3.0, 4.0, "adios"),
        ];
        let merged = normalize_segments(raw);
        assert_eq!(
            merged,
            vec![seg(0.0, 1.5, "hola mundo"), seg(3.0, 4.0, "adios")]
        );
    }

    // S3 as given by the partials directly (two partial files, A then B).
    #[test]
    fn s3_merge_partials_scenario() {
        let raw = vec![
            seg(0.0, 2.0, "hello"),
            seg(2.0, 4.0, "world"),
            seg(3.5, 4.5, "world"),
            seg(4.5, 6.0, "again"),
        ];
        let merged = normalize_segments(raw);
        assert_eq!(
            merged,
            vec![seg(0.0, 2.0, "hello"), seg(2.0, 3.5, "world"), seg(4.5, 6.0, "again")]
        );
    }

    #[test]
    fn empty_and_zero_length_segments_are_dropped() {
        let raw = vec![seg(0.0, 1.0, "   "), seg(1.0, 1.0, "nonempty"), seg(2.0, 3.0, "kept")];
        let merged = normalize_segments(raw);
        assert_eq!(merged, vec![seg(2.0, 3.0, "kept")]);
    }

    #[test]
    fn non_overlapping_segments_pass_through_unchanged() {
        let raw = vec![seg(0.0, 1.0, "one"), seg(1.0, 2.0, "two")];
        let merged = normalize_segments(raw.clone());
        assert_eq!(merged, raw);
    }

    #[test]
    fn overlap_with_different_text_keeps_both_trimmed() {
        let raw = vec![seg(0.0, 2.0, "one"), seg(1.0, 3.0, "two")];
        let merged = normalize_segments(raw);
        assert_eq!(merged, vec![seg(0.0, 1.0, "one"), seg(1.0, 3.0, "two")]);
    }

    #[test]
    fn write_merge_outputs_respects_flags() {
        let dir = tempfile::tempdir().unwrap();
        let segments = vec![seg(0.0, 1.0, "hola"), seg(1.0, 2.0, "mundo")];
        write_merge_outputs(dir.path(), &segments, true, false).unwrap();

        assert_eq!(std::fs::read_to_string(dir.path().join("final.txt")).unwrap(), "hola mundo\n");
        let json_raw = std::fs::read_to_string(dir.path().join("final.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&json_raw).unwrap();
        assert_eq!(json["text"], "hola mundo");
        assert_eq!(json["segments"].as_array().unwrap().len(), 2);
        assert!(!dir.path().join("final.vtt").exists());
    }
}
