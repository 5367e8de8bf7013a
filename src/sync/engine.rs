//! Manual word-timing engine.
//!
//! Spacebar press/release pairs are turned into word timestamps sampled from
//! the audio playhead. One engine drives one editing surface: a single
//! segment, or the whole song in replace-all mode.
//!
//! ```text
//!            start            key-down            key-up (more words)
//!   Idle ───────────▶ Armed ───────────▶ Holding ───────────▶ Armed(n+1)
//!    ▲                  │  ▲               │
//!    │       pause      ▼  │ resume        │ key-up (last word)
//!    │                Paused               ▼
//!    └──────────────── cancel / auto-stop ─┴──────────────────▶ Idle
//! ```

use crate::audio::AudioControl;
use crate::model::{Segment, Word, first_incomplete};
use crate::sync::input::{KeyInput, KeyKind};
use crate::sync::overlap::{clip_before_next, close_previous_word, release_end};
use crate::sync::timing::SyncTiming;
use crate::timer::sanitize_position;
use std::time::Instant;

/// Receives the full word list after every state-changing key event.
pub trait WordSink {
    fn update_words(&mut self, words: Vec<Word>);
}

impl<F: FnMut(Vec<Word>)> WordSink for F {
    fn update_words(&mut self, words: Vec<Word>) {
        self(words)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// One line; playback past its end stops the session.
    #[default]
    Segment,
    /// Replace-all: the surface spans the whole track and never auto-stops.
    WholeSong,
}

/// Where `start` places the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPoint {
    Beginning,
    /// First word missing either timestamp (index 0 when all are timed).
    FirstIncomplete,
    At(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Armed,
    Holding,
    Paused,
}

/// An in-flight spacebar press.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Press {
    /// Playhead when the key went down.
    pub playhead: f64,
    /// Wall clock when the key went down, for tap/hold classification only.
    pub at: Instant,
}

/// Ephemeral session state; never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncSession {
    pub active: bool,
    pub paused: bool,
    /// `Some` exactly while `active`.
    pub current_word_index: Option<usize>,
    pub press: Option<Press>,
    /// Segment end captured at start, used by auto-stop.
    pub stop_at: Option<f64>,
}

impl SyncSession {
    pub fn spacebar_held(&self) -> bool {
        self.press.is_some()
    }
}

pub struct SyncEngine<A: AudioControl, S: WordSink> {
    audio: A,
    sink: S,
    timing: SyncTiming,
    mode: SyncMode,
    /// Working copy of the surface's segment.
    segment: Option<Segment>,
    session: SyncSession,
}

impl<A: AudioControl, S: WordSink> SyncEngine<A, S> {
    pub fn new(audio: A, sink: S, timing: SyncTiming, mode: SyncMode) -> Self {
        Self {
            audio,
            sink,
            timing,
            mode,
            segment: None,
            session: SyncSession::default(),
        }
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    #[cfg(test)]
    pub(crate) fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }

    pub fn session(&self) -> &SyncSession {
        &self.session
    }

    pub fn segment(&self) -> Option<&Segment> {
        self.segment.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.session.active
    }

    pub fn is_paused(&self) -> bool {
        self.session.active && self.session.paused
    }

    pub fn current_word_index(&self) -> Option<usize> {
        self.session.current_word_index
    }

    pub fn phase(&self) -> SyncPhase {
        let s = &self.session;
        match (s.active, s.paused, s.spacebar_held()) {
            (false, _, _) => SyncPhase::Idle,
            (true, true, _) => SyncPhase::Paused,
            (true, false, true) => SyncPhase::Holding,
            (true, false, false) => SyncPhase::Armed,
        }
    }

    /// Point the surface at `segment` without arming a session. Used so the
    /// spacebar can preview the line before syncing starts.
    pub fn open(&mut self, segment: &Segment) {
        if !self.session.active {
            self.segment = Some(segment.clone());
        }
    }

    /// Arm a session over `segment`, or cancel the running one.
    ///
    /// Playback is started `pre_roll` seconds before the target word's best
    /// known start. Returns whether a session was armed. Missing segment,
    /// empty segment, or no playback capability are silent no-ops.
    pub fn start(&mut self, segment: Option<&Segment>, from: StartPoint) -> bool {
        if self.session.active {
            self.cancel();
            return false;
        }
        let Some(segment) = segment else {
            return false;
        };
        if segment.words.is_empty() || !self.audio.is_available() {
            return false;
        }
        let index = match from {
            StartPoint::Beginning => 0,
            StartPoint::FirstIncomplete => first_incomplete(&segment.words).unwrap_or(0),
            StartPoint::At(i) if i < segment.words.len() => i,
            StartPoint::At(_) => return false,
        };

        let target = best_known_start(&segment.words, index, segment.start_time);
        let seek = (target - self.timing.pre_roll).max(0.0);
        self.audio.seek_and_play(seek);

        self.segment = Some(segment.clone());
        self.session = SyncSession {
            active: true,
            paused: false,
            current_word_index: Some(index),
            press: None,
            stop_at: segment.end_time,
        };
        tracing::info!(
            segment = %segment.id,
            index,
            words = segment.words.len(),
            seek,
            mode = ?self.mode,
            "manual sync started"
        );
        true
    }

    /// Deactivate unconditionally and stop playback if it is running.
    ///
    /// A word whose key-down was seen but whose key-up was not keeps its start
    /// and a missing end.
    pub fn cancel(&mut self) {
        if self.audio.is_playing() {
            self.audio.pause();
        }
        if self.session.active {
            tracing::info!(index = ?self.session.current_word_index, "manual sync cancelled");
        }
        self.session = SyncSession::default();
    }

    pub fn pause(&mut self) {
        if !self.session.active || self.session.paused {
            return;
        }
        self.audio.pause();
        self.session.paused = true;
        tracing::debug!(index = ?self.session.current_word_index, "manual sync paused");
    }

    /// Resume from the first word still missing a timestamp, continuing
    /// playback from wherever the playhead is now.
    pub fn resume(&mut self) {
        if !self.session.active || !self.session.paused {
            return;
        }
        let words = self.words();
        match first_incomplete(words) {
            Some(index) => {
                self.session.current_word_index = Some(index);
                self.session.paused = false;
                self.audio.play();
                tracing::debug!(index, "manual sync resumed");
            }
            None => {
                tracing::debug!("nothing left to sync on resume");
                self.finish();
            }
        }
    }

    pub fn handle_key(&mut self, input: KeyInput) {
        match input.kind {
            KeyKind::Down => self.on_key_down(input),
            KeyKind::Up => self.on_key_up(input),
        }
    }

    pub fn on_key_down(&mut self, input: KeyInput) {
        if !input.is_space() {
            return;
        }
        if !self.session.active {
            self.preview_toggle();
            return;
        }
        // Key repeat re-fires key-down while held.
        if self.session.paused || self.session.press.is_some() {
            return;
        }
        let Some(index) = self.session.current_word_index else {
            self.finish();
            return;
        };
        if index >= self.words().len() {
            self.finish();
            return;
        }

        let playhead = sanitize_position(self.audio.current_time());
        let mut words = self.words().to_vec();
        words[index].start_time = Some(playhead);
        words[index].end_time = None;
        if index > 0 {
            close_previous_word(&mut words[index - 1], playhead, &self.timing);
        }
        self.session.press = Some(Press {
            playhead,
            at: input.at,
        });
        tracing::debug!(index, start = playhead, "word started");
        self.publish(words);
    }

    pub fn on_key_up(&mut self, input: KeyInput) {
        if !input.is_space() || !self.session.active {
            return;
        }
        let Some(press) = self.session.press.take() else {
            return;
        };
        let Some(index) = self.session.current_word_index else {
            self.finish();
            return;
        };
        let len = self.words().len();
        if index >= len {
            self.finish();
            return;
        }

        let held_for = input.at.saturating_duration_since(press.at);
        let release_playhead = sanitize_position(self.audio.current_time());
        let end = release_end(press.playhead, release_playhead, held_for, &self.timing);

        let mut words = self.words().to_vec();
        words[index].end_time = Some(end);
        tracing::debug!(
            index,
            start = press.playhead,
            end,
            held_ms = held_for.as_millis() as u64,
            tap = self.timing.is_tap(held_for),
            "word timed"
        );

        if index + 1 >= len {
            self.publish(words);
            self.finish();
            return;
        }

        let next = index + 1;
        let (done, rest) = words.split_at_mut(next);
        clip_before_next(&mut done[index], &rest[0], &self.timing);
        self.session.current_word_index = Some(next);
        self.publish(words);
    }

    /// Periodic supervision: stop when playback runs past the segment end.
    ///
    /// Returns true on the tick that stopped the session; later ticks are
    /// no-ops because the session is no longer active.
    pub fn check_auto_stop(&mut self) -> bool {
        if !self.session.active || self.mode == SyncMode::WholeSong {
            return false;
        }
        let Some(stop_at) = self.session.stop_at else {
            return false;
        };
        if !self.audio.is_playing() {
            return false;
        }
        let playhead = self.audio.current_time();
        if playhead <= stop_at {
            return false;
        }
        tracing::info!(playhead, stop_at, "playback passed segment end, stopping sync");
        self.audio.pause();
        self.cancel();
        true
    }

    /// Adopt externally edited words and re-derive the cursor as the first
    /// incomplete word. Ends the session when nothing is left to time.
    pub fn reconcile(&mut self, words: Vec<Word>) {
        let Some(segment) = self.segment.as_mut() else {
            return;
        };
        segment.set_words(words);
        if !self.session.active {
            return;
        }
        match first_incomplete(&segment.words) {
            Some(index) => {
                if self.session.current_word_index != Some(index) {
                    self.session.press = None;
                }
                self.session.current_word_index = Some(index);
            }
            None => self.finish(),
        }
    }

    fn words(&self) -> &[Word] {
        self.segment.as_ref().map(|s| s.words.as_slice()).unwrap_or(&[])
    }

    fn publish(&mut self, words: Vec<Word>) {
        if let Some(segment) = self.segment.as_mut() {
            segment.set_words(words.clone());
        }
        self.sink.update_words(words);
    }

    /// End the session normally; playback is left running.
    fn finish(&mut self) {
        if self.session.active {
            tracing::info!("manual sync finished");
        }
        self.session = SyncSession::default();
    }

    /// Spacebar outside a session: play/pause inside the line, otherwise
    /// jump to the line start.
    fn preview_toggle(&mut self) {
        if !self.audio.is_available() {
            return;
        }
        let playhead = self.audio.current_time();
        match self.segment.as_ref() {
            Some(segment) if segment.contains(playhead) => self.audio.toggle(),
            Some(Segment {
                start_time: Some(start),
                ..
            }) => {
                let start = *start;
                self.audio.seek_and_play(start);
            }
            _ => self.audio.toggle(),
        }
    }
}

/// Best known start for `words[index]`: its own start, else the nearest
/// earlier timestamp, else the segment start, else zero.
pub fn best_known_start(words: &[Word], index: usize, segment_start: Option<f64>) -> f64 {
    if let Some(start) = words.get(index).and_then(|w| w.start_time) {
        return sanitize_position(start);
    }
    let earlier = words[..index.min(words.len())]
        .iter()
        .rev()
        .find_map(|w| w.end_time.or(w.start_time));
    sanitize_position(earlier.or(segment_start).unwrap_or(0.0))
}
