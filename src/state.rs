// state.rs: Snapshot types published by the session actor

use crate::model::{Segment, Word};
use crate::sync::SyncPhase;
use crate::timeline::TimelineWindow;
use std::sync::Arc;

/// Which part of the document the engine is timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// One line, by index into `Update::segments`.
    Segment(usize),
    /// Every line flattened into one surface (replace-all).
    WholeSong,
}

/// Represents a UI update for the editing session.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub segments: Arc<Vec<Segment>>,
    /// Words of the surface being timed, in surface order.
    pub surface_words: Arc<Vec<Word>>,
    pub surface: Surface,
    pub phase: SyncPhase,
    /// Word the next key-down will time.
    pub current_word: Option<usize>,
    /// Document line holding `current_word`.
    pub current_line: Option<usize>,
    pub playhead: f64,
    pub playing: bool,
    pub window: TimelineWindow,
    pub message: Option<String>,
    pub version: u64, // Incremented on any state change
}

impl Default for Update {
    fn default() -> Self {
        Self {
            segments: Arc::default(),
            surface_words: Arc::default(),
            surface: Surface::Segment(0),
            phase: SyncPhase::Idle,
            current_word: None,
            current_line: None,
            playhead: 0.0,
            playing: false,
            window: TimelineWindow::new(0.0, 10.0, None),
            message: None,
            version: 0,
        }
    }
}

impl Update {
    pub fn is_syncing(&self) -> bool {
        self.phase != SyncPhase::Idle
    }

    /// Label of the surface for the header line.
    pub fn surface_label(&self) -> String {
        match self.surface {
            Surface::WholeSong => match self.current_line {
                Some(line) => format!("whole song, line {}/{}", line + 1, self.segments.len()),
                None => format!("whole song ({} lines)", self.segments.len()),
            },
            Surface::Segment(i) => format!("line {}/{}", i + 1, self.segments.len()),
        }
    }

    /// Timed and total word counts for the surface.
    pub fn progress(&self) -> (usize, usize) {
        let timed = self.surface_words.iter().filter(|w| w.is_timed()).count();
        (timed, self.surface_words.len())
    }
}

/// Mutable session state owned by the actor, plus versioning.
#[derive(Debug)]
pub struct StateBundle {
    pub segments: Arc<Vec<Segment>>,
    pub surface_words: Arc<Vec<Word>>,
    pub surface: Surface,
    pub window: TimelineWindow,
    pub message: Option<String>,
    pub version: u64,
}

impl StateBundle {
    pub fn new(segments: Vec<Segment>, surface: Surface, window: TimelineWindow) -> Self {
        Self {
            segments: Arc::new(segments),
            surface_words: Arc::default(),
            surface,
            window,
            message: None,
            version: 0,
        }
    }

    pub fn set_segments(&mut self, segments: Vec<Segment>) {
        self.segments = Arc::new(segments);
        self.version += 1;
    }

    pub fn set_surface_words(&mut self, words: Vec<Word>) {
        self.surface_words = Arc::new(words);
        self.version += 1;
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
        self.version += 1;
    }

    pub fn bump(&mut self) {
        self.version += 1;
    }

    pub fn snapshot(&self, phase: SyncPhase, current_word: Option<usize>, playhead: f64, playing: bool) -> Update {
        Update {
            segments: self.segments.clone(),
            surface_words: self.surface_words.clone(),
            surface: self.surface,
            phase,
            current_word,
            current_line: match self.surface {
                Surface::Segment(i) => Some(i),
                Surface::WholeSong => None,
            },
            playhead,
            playing,
            window: self.window,
            message: self.message.clone(),
            version: self.version,
        }
    }
}
