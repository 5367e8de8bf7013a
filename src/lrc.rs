//! Enhanced LRC rendering of timed segments, and stripping of LRC markup
//! from pasted text.

use crate::model::Segment;
use once_cell::sync::Lazy;
use regex::Regex;

static LINE_STAMPS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\s*\[\d{1,3}:\d{2}(?:[.:]\d{1,3})?\])+").unwrap());
static WORD_STAMP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<\d{1,3}:\d{2}(?:[.:]\d{1,3})?>").unwrap());
static METADATA_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\[[A-Za-z#]+:[^\]]*\]\s*$").unwrap());

/// `mm:ss.cc`, rounding to centiseconds. Negative or non-finite input is 0.
pub fn format_timestamp(secs: f64) -> String {
    let secs = if secs.is_finite() && secs > 0.0 { secs } else { 0.0 };
    let centis = (secs * 100.0).round() as u64;
    let minutes = centis / 6000;
    let seconds = (centis % 6000) / 100;
    let centi = centis % 100;
    format!("{:02}:{:02}.{:02}", minutes, seconds, centi)
}

/// Remove line stamps, inline word stamps and whole-line metadata tags.
pub fn strip_lrc_markup(line: &str) -> String {
    if METADATA_LINE_RE.is_match(line) {
        return String::new();
    }
    let without_line = LINE_STAMPS_RE.replace(line, "");
    WORD_STAMP_RE.replace_all(&without_line, " ").trim().to_string()
}

/// One line per segment: `[mm:ss.cc]` from the segment start, then each word
/// preceded by its `<mm:ss.cc>` start. Untimed segments and words are emitted
/// without stamps; a trailing stamp marks the last word's end.
pub fn export_enhanced_lrc(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        if let Some(start) = segment.start_time {
            out.push_str(&format!("[{}]", format_timestamp(start)));
        }
        let mut parts = Vec::with_capacity(segment.words.len());
        for word in &segment.words {
            match word.start_time {
                Some(start) => parts.push(format!("<{}>{}", format_timestamp(start), word.text)),
                None => parts.push(word.text.clone()),
            }
        }
        out.push_str(&parts.join(" "));
        if let Some(end) = segment.words.last().and_then(|w| w.end_time) {
            out.push_str(&format!(" <{}>", format_timestamp(end)));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Word;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, "00:00.00")]
    #[case(5.5, "00:05.50")]
    #[case(61.234, "01:01.23")]
    #[case(-3.0, "00:00.00")]
    #[case(f64::NAN, "00:00.00")]
    fn test_format_timestamp(#[case] secs: f64, #[case] expected: &str) {
        assert_eq!(format_timestamp(secs), expected);
    }

    #[rstest]
    #[case("[00:12.34]Hello world", "Hello world")]
    #[case("[00:12.34][01:02.00] twice stamped", "twice stamped")]
    #[case("[00:01.00]<00:01.00>Hi <00:01.50>there", "Hi  there")]
    #[case("[ar:Some Artist]", "")]
    #[case("plain words", "plain words")]
    #[case("[chorus] keep bracketed text", "[chorus] keep bracketed text")]
    fn test_strip_lrc_markup(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(strip_lrc_markup(input), expected);
    }

    #[test]
    fn test_export_enhanced_lrc() {
        let timed = |text: &str, s: f64, e: f64| Word {
            start_time: Some(s),
            end_time: Some(e),
            ..Word::untimed(text, text)
        };
        let segments = vec![
            Segment::from_words("s1", vec![timed("hello", 1.0, 1.5), timed("there", 1.6, 2.0)]),
            Segment::from_words("s2", vec![Word::untimed("b", "untimed")]),
        ];
        let lrc = export_enhanced_lrc(&segments);
        assert_eq!(
            lrc,
            "[00:01.00]<00:01.00>hello <00:01.60>there <00:02.00>\nuntimed\n"
        );
    }
}
