use std::time::Duration;

/// Press shorter than this is a tap.
pub const TAP_THRESHOLD: Duration = Duration::from_millis(200);
/// Word length assigned to a tap.
pub const DEFAULT_TAP_DURATION: f64 = 0.5;
/// Gap left before a new start when the previous word is clipped on key-down.
pub const PREVIOUS_WORD_GUARD: f64 = 0.005;
/// Gap left before an already-known next start when a word is clipped on key-up.
pub const NEXT_WORD_GUARD: f64 = 0.01;
/// Silence longer than this keeps the previous word short instead of stretching it.
pub const LONG_GAP_THRESHOLD: f64 = 1.0;
/// Length given to a word followed by a long silence.
pub const LONG_GAP_WORD_DURATION: f64 = 0.5;
/// Playback starts this far ahead of the target word.
pub const PRE_ROLL: f64 = 3.0;
/// Auto-stop / auto-scroll sampling period.
pub const SUPERVISION_PERIOD: Duration = Duration::from_millis(100);

/// Tunables for the tap/hold and overlap policies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncTiming {
    pub tap_threshold: Duration,
    pub tap_duration: f64,
    pub previous_word_guard: f64,
    pub next_word_guard: f64,
    pub long_gap_threshold: f64,
    pub long_gap_word_duration: f64,
    pub pre_roll: f64,
    pub supervision_period: Duration,
}

impl Default for SyncTiming {
    fn default() -> Self {
        Self {
            tap_threshold: TAP_THRESHOLD,
            tap_duration: DEFAULT_TAP_DURATION,
            previous_word_guard: PREVIOUS_WORD_GUARD,
            next_word_guard: NEXT_WORD_GUARD,
            long_gap_threshold: LONG_GAP_THRESHOLD,
            long_gap_word_duration: LONG_GAP_WORD_DURATION,
            pre_roll: PRE_ROLL,
            supervision_period: SUPERVISION_PERIOD,
        }
    }
}

impl SyncTiming {
    /// Override the tap duration, ignoring non-positive or non-finite values.
    pub fn with_tap_duration(mut self, secs: f64) -> Self {
        if secs.is_finite() && secs > 0.0 {
            self.tap_duration = secs;
        }
        self
    }

    pub fn is_tap(&self, held_for: Duration) -> bool {
        held_for < self.tap_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, true)]
    #[case(199, true)]
    #[case(200, false)]
    #[case(201, false)]
    #[case(1500, false)]
    fn test_tap_classification_boundary(#[case] ms: u64, #[case] tap: bool) {
        let timing = SyncTiming::default();
        assert_eq!(timing.is_tap(Duration::from_millis(ms)), tap);
    }

    #[test]
    fn test_tap_duration_override_rejects_nonsense() {
        let timing = SyncTiming::default().with_tap_duration(-1.0);
        assert_eq!(timing.tap_duration, DEFAULT_TAP_DURATION);
        let timing = SyncTiming::default().with_tap_duration(1.0);
        assert_eq!(timing.tap_duration, 1.0);
    }
}
