//! Gap and overlap resolution between neighbouring words.
//!
//! All functions here are pure over their inputs and never produce a
//! negative timestamp.

use crate::model::Word;
use crate::sync::timing::SyncTiming;
use std::time::Duration;

/// Close `prev` when the next word starts at `start`.
///
/// An open or overlapping previous word ends either shortly after its own
/// start (long silence) or just before `start`. A previous word that already
/// ends at or before `start` is left alone. Returns whether `prev` changed.
pub fn close_previous_word(prev: &mut Word, start: f64, timing: &SyncTiming) -> bool {
    let Some(prev_start) = prev.start_time else {
        return false;
    };
    let overlaps = match prev.end_time {
        None => true,
        Some(end) => end > start,
    };
    if !overlaps {
        return false;
    }
    let gap = start - prev_start;
    let end = if gap > timing.long_gap_threshold {
        prev_start + timing.long_gap_word_duration
    } else {
        start - timing.previous_word_guard
    };
    prev.end_time = Some(end.max(0.0));
    true
}

/// Pull `finished` back before `next` when `next` already carries a start
/// that the new end runs past. Returns whether `finished` changed.
///
/// A stale `next` start at or before `finished`'s own start is ignored; the
/// next key-down replaces it and closes `finished` then.
pub fn clip_before_next(finished: &mut Word, next: &Word, timing: &SyncTiming) -> bool {
    let (Some(start), Some(end), Some(next_start)) = (finished.start_time, finished.end_time, next.start_time)
    else {
        return false;
    };
    if end <= next_start {
        return false;
    }
    let clipped = (next_start - timing.next_word_guard).max(0.0);
    if clipped <= start {
        return false;
    }
    finished.end_time = Some(clipped);
    true
}

/// End time for a press that started at `press_start` and was released
/// after `held_for` with the playhead at `release_playhead`.
///
/// Taps get a fixed duration. Holds end at the release playhead, unless the
/// playhead did not move past the press (paused or seeked back), in which
/// case the tap duration is used so the word keeps a positive length.
pub fn release_end(
    press_start: f64,
    release_playhead: f64,
    held_for: Duration,
    timing: &SyncTiming,
) -> f64 {
    let tap_end = press_start + timing.tap_duration;
    if timing.is_tap(held_for) {
        return tap_end;
    }
    if release_playhead.is_finite() && release_playhead > press_start {
        release_playhead
    } else {
        tap_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn word(start: Option<f64>, end: Option<f64>) -> Word {
        Word {
            start_time: start,
            end_time: end,
            ..Word::untimed("w", "word")
        }
    }

    #[test]
    fn test_long_gap_keeps_previous_word_short() {
        let timing = SyncTiming::default();
        let mut prev = word(Some(10.0), None);
        assert!(close_previous_word(&mut prev, 11.4, &timing));
        assert_relative_eq!(prev.end_time.unwrap(), 10.5, epsilon = 1e-9);
    }

    #[test]
    fn test_short_gap_ends_just_before_new_start() {
        let timing = SyncTiming::default();
        let mut prev = word(Some(10.0), None);
        assert!(close_previous_word(&mut prev, 10.3, &timing));
        assert_relative_eq!(prev.end_time.unwrap(), 10.295, epsilon = 1e-9);
    }

    #[test]
    fn test_gap_of_exactly_threshold_is_short() {
        let timing = SyncTiming::default();
        let mut prev = word(Some(10.0), None);
        close_previous_word(&mut prev, 11.0, &timing);
        assert_relative_eq!(prev.end_time.unwrap(), 10.995, epsilon = 1e-9);
    }

    #[test]
    fn test_overlapping_end_is_clipped() {
        let timing = SyncTiming::default();
        let mut prev = word(Some(5.0), Some(5.5));
        assert!(close_previous_word(&mut prev, 5.3, &timing));
        assert_relative_eq!(prev.end_time.unwrap(), 5.295, epsilon = 1e-9);
    }

    #[test]
    fn test_non_overlapping_end_is_respected() {
        let timing = SyncTiming::default();
        let mut prev = word(Some(5.0), Some(5.5));
        assert!(!close_previous_word(&mut prev, 6.0, &timing));
        assert_eq!(prev.end_time, Some(5.5));
    }

    #[test]
    fn test_previous_without_start_is_untouched() {
        let timing = SyncTiming::default();
        let mut prev = word(None, None);
        assert!(!close_previous_word(&mut prev, 2.0, &timing));
        assert!(prev.end_time.is_none());
    }

    #[test]
    fn test_close_never_goes_negative() {
        let timing = SyncTiming::default();
        let mut prev = word(Some(0.0), None);
        close_previous_word(&mut prev, 0.001, &timing);
        assert_eq!(prev.end_time, Some(0.0));
    }

    #[test]
    fn test_clip_before_stale_next_start() {
        let timing = SyncTiming::default();
        let mut finished = word(Some(3.0), Some(4.2));
        let next = word(Some(4.0), Some(4.5));
        assert!(clip_before_next(&mut finished, &next, &timing));
        assert_relative_eq!(finished.end_time.unwrap(), 3.99, epsilon = 1e-9);
    }

    #[test]
    fn test_clip_skips_next_start_behind_finished_word() {
        let timing = SyncTiming::default();
        let mut finished = word(Some(3.0), Some(3.6));
        let next = word(Some(2.0), Some(2.5));
        assert!(!clip_before_next(&mut finished, &next, &timing));
        assert_eq!(finished.end_time, Some(3.6));

        let just_after = word(Some(3.005), Some(3.5));
        assert!(!clip_before_next(&mut finished, &just_after, &timing));
        assert_eq!(finished.end_time, Some(3.6));
    }

    #[test]
    fn test_clip_ignores_untimed_next() {
        let timing = SyncTiming::default();
        let mut finished = word(Some(3.0), Some(4.2));
        assert!(!clip_before_next(&mut finished, &word(None, None), &timing));
        assert_eq!(finished.end_time, Some(4.2));
    }

    #[test]
    fn test_release_end_tap_and_hold() {
        let timing = SyncTiming::default();
        let tap = release_end(5.0, 5.05, Duration::from_millis(50), &timing);
        assert_relative_eq!(tap, 5.5);
        let hold = release_end(6.0, 6.8, Duration::from_millis(400), &timing);
        assert_relative_eq!(hold, 6.8);
    }

    #[test]
    fn test_release_end_hold_without_progress_falls_back_to_tap() {
        let timing = SyncTiming::default();
        let end = release_end(6.0, 6.0, Duration::from_millis(900), &timing);
        assert_relative_eq!(end, 6.5);
    }
}
