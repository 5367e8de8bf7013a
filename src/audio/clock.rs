//! Virtual playhead used when no media player is attached.

use crate::audio::AudioControl;
use crate::timer::{PlaybackTimer, sanitize_position};

/// A silent transport: the playhead advances with wall-clock time while
/// "playing" and stops at `duration` when one is set.
#[derive(Debug, Default)]
pub struct ClockAudio {
    timer: PlaybackTimer,
    playing: bool,
    duration: Option<f64>,
}

impl ClockAudio {
    pub fn new(duration: Option<f64>) -> Self {
        Self {
            timer: PlaybackTimer::default(),
            playing: false,
            duration: duration.filter(|d| d.is_finite() && *d > 0.0),
        }
    }

    fn clamp(&self, time: f64) -> f64 {
        let time = sanitize_position(time);
        match self.duration {
            Some(d) => time.min(d),
            None => time,
        }
    }

    fn raw_estimate(&self) -> f64 {
        self.timer.estimate(self.playing)
    }
}

impl AudioControl for ClockAudio {
    fn current_time(&self) -> f64 {
        self.clamp(self.raw_estimate())
    }

    fn is_playing(&self) -> bool {
        // Reaching the end reads as stopped even before anyone calls pause.
        match self.duration {
            Some(d) => self.playing && self.raw_estimate() < d,
            None => self.playing,
        }
    }

    fn play(&mut self) {
        if self.playing {
            return;
        }
        if let Some(d) = self.duration
            && self.timer.estimate(false) >= d
        {
            self.timer.reset(0.0);
        }
        self.timer.mark_playing();
        self.playing = true;
    }

    fn pause(&mut self) {
        if !self.playing {
            return;
        }
        let pos = self.current_time();
        self.timer.reset(pos);
        self.playing = false;
    }

    fn seek_to(&mut self, time: f64) {
        let pos = self.clamp(time);
        if self.playing {
            self.timer.set_position(pos);
        } else {
            self.timer.reset(pos);
        }
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_seek_while_paused_moves_playhead() {
        let mut clock = ClockAudio::new(Some(60.0));
        clock.seek_to(12.0);
        assert!(!clock.is_playing());
        assert_relative_eq!(clock.current_time(), 12.0);
    }

    #[test]
    fn test_seek_is_clamped_to_track() {
        let mut clock = ClockAudio::new(Some(30.0));
        clock.seek_to(-4.0);
        assert_relative_eq!(clock.current_time(), 0.0);
        clock.seek_to(45.0);
        assert_relative_eq!(clock.current_time(), 30.0);
    }

    #[test]
    fn test_toggle_flips_play_state() {
        let mut clock = ClockAudio::new(None);
        clock.toggle();
        assert!(clock.is_playing());
        clock.toggle();
        assert!(!clock.is_playing());
    }

    #[test]
    fn test_play_at_end_restarts_from_zero() {
        let mut clock = ClockAudio::new(Some(10.0));
        clock.seek_to(10.0);
        clock.play();
        assert!(clock.is_playing());
        assert!(clock.current_time() < 1.0);
    }

    #[test]
    fn test_invalid_duration_is_ignored() {
        let clock = ClockAudio::new(Some(f64::NAN));
        assert!(clock.duration().is_none());
    }
}
