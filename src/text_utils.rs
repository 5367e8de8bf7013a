// src/text_utils.rs
// Utility functions for text formatting

use unicode_segmentation::UnicodeSegmentation;

/// Wrap text to a given width, breaking at word boundaries
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    textwrap::wrap(text, width.max(1))
        .into_iter()
        .map(|line| line.into_owned())
        .collect()
}

/// Cut `text` to at most `max` graphemes, marking the cut with `…`.
pub fn truncate_graphemes(text: &str, max: usize) -> String {
    let graphemes: Vec<&str> = text.graphemes(true).collect();
    if graphemes.len() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out: String = graphemes[..max - 1].concat();
    out.push('…');
    out
}

/// `m:ss.t` playhead readout.
pub fn format_clock(secs: f64) -> String {
    let secs = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
    let tenths = (secs * 10.0).floor() as u64;
    format!("{}:{:02}.{}", tenths / 600, (tenths / 10) % 60, tenths % 10)
}

/// Seconds with millisecond precision, or `-` when missing.
pub fn format_optional_secs(secs: Option<f64>) -> String {
    match secs {
        Some(s) if s.is_finite() => format!("{s:.3}"),
        _ => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_wrap_text_breaks_on_words() {
        assert_eq!(wrap_text("one two three", 7), vec!["one two", "three"]);
        assert!(wrap_text("   ", 10).is_empty());
    }

    #[rstest]
    #[case("hello", 10, "hello")]
    #[case("hello", 3, "he…")]
    #[case("héllo wörld", 5, "héll…")]
    #[case("abc", 0, "")]
    fn test_truncate_graphemes(#[case] input: &str, #[case] max: usize, #[case] expected: &str) {
        assert_eq!(truncate_graphemes(input, max), expected);
    }

    #[rstest]
    #[case(0.0, "0:00.0")]
    #[case(61.27, "1:01.2")]
    #[case(-4.0, "0:00.0")]
    fn test_format_clock(#[case] secs: f64, #[case] expected: &str) {
        assert_eq!(format_clock(secs), expected);
    }

    #[test]
    fn test_format_optional_secs() {
        assert_eq!(format_optional_secs(Some(1.5)), "1.500");
        assert_eq!(format_optional_secs(None), "-");
    }
}
