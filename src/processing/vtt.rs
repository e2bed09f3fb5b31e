/// A single transcribed span of text with timing, in the unit used
/// throughout the merger and the output formats.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedText {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Formats seconds as a WebVTT timestamp `HH:MM:SS.mmm`. Negative input
/// clamps to zero; milliseconds round to the nearest whole millisecond
/// (spec.md §4.4 / original `format_timestamp`).
pub fn format_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as i64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let secs = total_secs % 60;
    let total_mins = total_secs / 60;
    let mins = total_mins % 60;
    let hours = total_mins / 60;
    format!("{:02}:{:02}:{:02}.{:03}", hours, mins, secs, ms)
}

/// Renders segments as a WebVTT document: `<index>\n<start> --> <end>\n<text>\n\n`
/// per cue (spec.md §6 / original `segments_to_vtt`). Cue indices are
/// 1-based over the full input list, including blank-text segments, which
/// are skipped from the output but still consume an index.
pub fn segments_to_vtt(segments: &[TimedText]) -> String {
    let mut out = String::from("WEBVTT\n\n");
    for (idx, seg) in segments.iter().enumerate() {
        let text = seg.text.trim();
        if text.is_empty() {
            continue;
        }
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            idx + 1,
            format_timestamp(seg.start),
            format_timestamp(seg.end),
            text
        ));
    }
    out.trim_end().to_string() + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_timestamp_with_millisecond_rounding() {
        assert_eq!(format_timestamp(0.0), "00:00:00.000");
        assert_eq!(format_timestamp(1.2345), "00:00:01.235");
        assert_eq!(format_timestamp(-3.0), "00:00:00.000");
        assert_eq!(format_timestamp(3661.5), "01:01:01.500");
    }

    // S4: two cues, one with blank text that should be skipped.
    #[test]
    fn s4_segments_to_vtt_scenario() {
        let segments = vec![
            TimedText { start: 0.0, end: 1.5, text: "hola".to_string() },
            TimedText { start: 1.5, end: 2.0, text: "   ".to_string() },
            TimedText { start: 2.0, end: 3.25, text: "mundo".to_string() },
        ];
        let vtt = segments_to_vtt(&segments);
        assert_eq!(
            vtt,
            "WEBVTT\n\n1\n00:00:00.000 --> 00:00:01.500\nhola\n\n3\n00:00:02.000 --> 00:00:03.250\nmundo\n"
        );
    }

    #[test]
    fn empty_input_yields_bare_header() {
        assert_eq!(segments_to_vtt(&[]), "WEBVTT\n");
    }
}
