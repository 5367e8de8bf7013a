//! Visible time window of the timeline strip and its auto-follow behaviour.
//!
//! While a sync pass advances, the window page-turns: once the playhead
//! gets within 5% of the trailing edge the window jumps so the playhead sits
//! 5% in from the leading edge. Manual scrolling turns follow off until it is
//! explicitly re-enabled (starting or resuming a session does that).

/// Fraction of the window width used as the page-turn margin.
pub const FOLLOW_MARGIN: f64 = 0.05;
/// Fixed zoom for the whole-song replace-all pass.
pub const REPLACE_ALL_WINDOW: f64 = 30.0;
pub const MIN_WINDOW: f64 = 2.0;
pub const MAX_WINDOW: f64 = 300.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineWindow {
    start: f64,
    width: f64,
    /// Track length, when known; the window never scrolls past it.
    track_length: Option<f64>,
    follow: bool,
    fixed_zoom: bool,
}

impl TimelineWindow {
    pub fn new(start: f64, width: f64, track_length: Option<f64>) -> Self {
        let mut window = Self {
            start: 0.0,
            width: width.clamp(MIN_WINDOW, MAX_WINDOW),
            track_length: track_length.filter(|l| l.is_finite() && *l > 0.0),
            follow: true,
            fixed_zoom: false,
        };
        window.set_start(start);
        window
    }

    /// Window sized to a segment with a little context either side.
    pub fn around(seg_start: Option<f64>, seg_end: Option<f64>, track_length: Option<f64>) -> Self {
        match (seg_start, seg_end) {
            (Some(start), Some(end)) if end > start => {
                let pad = ((end - start) * 0.25).max(1.0);
                Self::new(start - pad, end - start + 2.0 * pad, track_length)
            }
            (Some(start), _) => Self::new(start - 1.0, 10.0, track_length),
            _ => Self::new(0.0, 10.0, track_length),
        }
    }

    /// Non-adjustable window for a full-song pass, independent of word
    /// durations.
    pub fn for_replace_all(track_length: Option<f64>) -> Self {
        Self {
            fixed_zoom: true,
            ..Self::new(0.0, REPLACE_ALL_WINDOW, track_length)
        }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.start + self.width
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn is_following(&self) -> bool {
        self.follow
    }

    pub fn is_fixed_zoom(&self) -> bool {
        self.fixed_zoom
    }

    pub fn enable_follow(&mut self) {
        self.follow = true;
    }

    fn set_start(&mut self, start: f64) {
        let mut start = if start.is_finite() { start.max(0.0) } else { 0.0 };
        if let Some(len) = self.track_length {
            start = start.min((len - self.width).max(0.0));
        }
        self.start = start;
    }

    /// User scroll by `delta` seconds; disables follow.
    pub fn scroll_by(&mut self, delta: f64) {
        self.follow = false;
        self.set_start(self.start + delta);
    }

    /// Change the width around the window centre. Ignored at fixed zoom.
    pub fn zoom(&mut self, factor: f64) {
        if self.fixed_zoom || !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let centre = self.start + self.width / 2.0;
        self.width = (self.width * factor).clamp(MIN_WINDOW, MAX_WINDOW);
        self.set_start(centre - self.width / 2.0);
    }

    /// Page-turn toward `playhead` while a pass is advancing. Returns true
    /// when the window moved.
    pub fn follow_playhead(&mut self, playhead: f64, advancing: bool) -> bool {
        if !self.follow || !advancing || !playhead.is_finite() {
            return false;
        }
        let margin = self.width * FOLLOW_MARGIN;
        let trailing = self.end() - margin;
        if playhead < trailing && playhead >= self.start {
            return false;
        }
        let before = self.start;
        self.set_start(playhead - margin);
        (self.start - before).abs() > f64::EPSILON
    }

    /// Column of `time` in a strip `columns` wide, if visible.
    pub fn column_for(&self, time: f64, columns: u16) -> Option<u16> {
        if columns == 0 || !time.is_finite() || time < self.start || time > self.end() {
            return None;
        }
        let frac = (time - self.start) / self.width;
        let col = (frac * columns as f64).floor() as u16;
        Some(col.min(columns - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_page_turn_near_trailing_edge() {
        let mut window = TimelineWindow::new(0.0, 20.0, None);
        assert!(!window.follow_playhead(10.0, true));
        assert!(window.follow_playhead(19.5, true));
        assert_relative_eq!(window.start(), 18.5, epsilon = 1e-9);
        assert_relative_eq!(window.width(), 20.0);
    }

    #[test]
    fn test_no_page_turn_when_not_advancing() {
        let mut window = TimelineWindow::new(0.0, 20.0, None);
        assert!(!window.follow_playhead(19.5, false));
        assert_relative_eq!(window.start(), 0.0);
    }

    #[test]
    fn test_manual_scroll_disables_follow_until_reenabled() {
        let mut window = TimelineWindow::new(0.0, 20.0, None);
        window.scroll_by(5.0);
        assert!(!window.is_following());
        assert!(!window.follow_playhead(30.0, true));
        assert_relative_eq!(window.start(), 5.0);
        window.enable_follow();
        assert!(window.follow_playhead(30.0, true));
        assert_relative_eq!(window.start(), 29.0, epsilon = 1e-9);
    }

    #[test]
    fn test_jumps_back_when_playhead_before_window() {
        let mut window = TimelineWindow::new(40.0, 20.0, None);
        assert!(window.follow_playhead(12.0, true));
        assert_relative_eq!(window.start(), 11.0, epsilon = 1e-9);
    }

    #[test]
    fn test_replace_all_zoom_is_fixed() {
        let mut window = TimelineWindow::for_replace_all(Some(200.0));
        window.zoom(0.1);
        assert_relative_eq!(window.width(), REPLACE_ALL_WINDOW);
        window.follow_playhead(29.0, true);
        assert_relative_eq!(window.width(), REPLACE_ALL_WINDOW);
    }

    #[test]
    fn test_window_stays_inside_track() {
        let mut window = TimelineWindow::new(0.0, 30.0, Some(100.0));
        window.scroll_by(500.0);
        assert_relative_eq!(window.start(), 70.0);
        window.scroll_by(-500.0);
        assert_relative_eq!(window.start(), 0.0);
    }

    #[test]
    fn test_zoom_keeps_centre() {
        let mut window = TimelineWindow::new(10.0, 20.0, None);
        window.zoom(0.5);
        assert_relative_eq!(window.width(), 10.0);
        assert_relative_eq!(window.start(), 15.0);
    }

    #[test]
    fn test_column_mapping() {
        let window = TimelineWindow::new(10.0, 10.0, None);
        assert_eq!(window.column_for(10.0, 100), Some(0));
        assert_eq!(window.column_for(15.0, 100), Some(50));
        assert_eq!(window.column_for(20.0, 100), Some(99));
        assert_eq!(window.column_for(9.0, 100), None);
        assert_eq!(window.column_for(15.0, 0), None);
    }

    #[test]
    fn test_around_segment_adds_context() {
        let window = TimelineWindow::around(Some(10.0), Some(14.0), None);
        assert_relative_eq!(window.start(), 9.0);
        assert_relative_eq!(window.width(), 6.0);
    }
}
