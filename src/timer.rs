use std::time::Instant;

/// Monotonic playhead estimate: an anchor position plus the wall-clock time
/// elapsed since the anchor while playing. Shared by the virtual clock and
/// the MPRIS surface, which re-anchors it from D-Bus polls.
#[derive(Debug, PartialEq, Default, Clone)]
pub struct PlaybackTimer {
    /// Anchor position in seconds (finite, >= 0).
    anchor_position: f64,
    /// Monotonic instant corresponding to `anchor_position`.
    anchor_instant: Option<Instant>,
}

impl PlaybackTimer {
    pub fn new(position: f64) -> Self {
        Self {
            anchor_position: sanitize_position(position),
            anchor_instant: None,
        }
    }

    /// Re-anchor at `position`, stopped.
    pub fn reset(&mut self, position: f64) {
        self.anchor_position = sanitize_position(position);
        self.anchor_instant = None;
    }

    /// Re-anchor at `position`, measuring elapsed time from now.
    pub fn set_position(&mut self, position: f64) {
        self.set_position_at(position, Instant::now());
    }

    pub fn set_position_at(&mut self, position: f64, now: Instant) {
        self.anchor_position = sanitize_position(position);
        self.anchor_instant = Some(now);
    }

    pub fn mark_playing(&mut self) {
        self.mark_playing_at(Instant::now());
    }

    /// Start measuring from `now`. The current estimate is folded into the
    /// anchor first so a resume never loses the already elapsed time.
    pub fn mark_playing_at(&mut self, now: Instant) {
        self.anchor_position = self.estimate_at(true, now);
        self.anchor_instant = Some(now);
    }

    pub fn mark_paused(&mut self) {
        self.mark_paused_at(Instant::now());
    }

    /// Freeze the estimate at `now`; paused wall time is never counted.
    pub fn mark_paused_at(&mut self, now: Instant) {
        self.anchor_position = self.estimate_at(true, now);
        self.anchor_instant = None;
    }

    pub fn estimate(&self, playing: bool) -> f64 {
        self.estimate_at(playing, Instant::now())
    }

    pub fn estimate_at(&self, playing: bool, now: Instant) -> f64 {
        let base = self.anchor_position;
        if !playing {
            return base;
        }
        match self.anchor_instant {
            Some(inst) => {
                let elapsed = now.saturating_duration_since(inst).as_secs_f64();
                let val = base + elapsed;
                if val.is_finite() { val } else { base }
            }
            None => base,
        }
    }
}

pub fn sanitize_position(p: f64) -> f64 {
    if p.is_nan() || !p.is_finite() || p < 0.0 {
        0.0
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::time::Duration;

    #[test]
    fn test_paused_timer_reports_anchor() {
        let timer = PlaybackTimer::new(12.5);
        assert_relative_eq!(timer.estimate(false), 12.5);
        assert_relative_eq!(timer.estimate(true), 12.5);
    }

    #[test]
    fn test_playing_timer_advances_with_elapsed_time() {
        let start = Instant::now();
        let mut timer = PlaybackTimer::default();
        timer.set_position_at(4.0, start);
        let later = start + Duration::from_millis(1500);
        assert_relative_eq!(timer.estimate_at(true, later), 5.5, epsilon = 1e-9);
        assert_relative_eq!(timer.estimate_at(false, later), 4.0);
    }

    #[test]
    fn test_pause_then_resume_excludes_paused_time() {
        let t0 = Instant::now();
        let mut timer = PlaybackTimer::new(0.0);
        timer.mark_playing_at(t0);
        timer.mark_paused_at(t0 + Duration::from_secs(2));
        timer.mark_playing_at(t0 + Duration::from_secs(10));
        let est = timer.estimate_at(true, t0 + Duration::from_secs(11));
        assert_relative_eq!(est, 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_sanitize_clamps_negative_and_nan() {
        assert_eq!(sanitize_position(-3.0), 0.0);
        assert_eq!(sanitize_position(f64::NAN), 0.0);
        assert_eq!(sanitize_position(f64::INFINITY), 0.0);
        assert_eq!(sanitize_position(7.25), 7.25);
    }
}
