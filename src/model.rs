//! Word and segment data model shared by the sync engine, the replace-all
//! workflow and the correction document store.
//!
//! Field names follow the correction document JSON (`corrected_segments`),
//! so these types serialize straight into the submission payload.

use serde::{Deserialize, Serialize};

/// Confidence assigned to words that were timed by hand.
pub const MANUAL_CONFIDENCE: f64 = 1.0;

fn default_confidence() -> f64 {
    MANUAL_CONFIDENCE
}

/// One word of a lyrics line with optional timestamps (seconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub start_time: Option<f64>,
    #[serde(default)]
    pub end_time: Option<f64>,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub created_during_correction: bool,
}

impl Word {
    /// A fresh, untimed word as produced by pasted replacement text.
    pub fn untimed(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            start_time: None,
            end_time: None,
            confidence: MANUAL_CONFIDENCE,
            created_during_correction: true,
        }
    }

    /// True when both timestamps are present.
    pub fn is_timed(&self) -> bool {
        self.start_time.is_some() && self.end_time.is_some()
    }

    pub fn duration(&self) -> Option<f64> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// Whether `time` lies inside this word's closed interval.
    pub fn contains(&self, time: f64) -> bool {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => time >= start && time <= end,
            _ => false,
        }
    }
}

/// One lyrics line: an ordered list of words plus derived time bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: String,
    pub text: String,
    pub words: Vec<Word>,
    #[serde(default)]
    pub start_time: Option<f64>,
    #[serde(default)]
    pub end_time: Option<f64>,
}

impl Segment {
    /// Build a segment and derive text and bounds from `words`.
    pub fn from_words(id: impl Into<String>, words: Vec<Word>) -> Self {
        let mut segment = Self {
            id: id.into(),
            text: String::new(),
            words,
            start_time: None,
            end_time: None,
        };
        segment.text = segment.joined_text();
        segment.recompute_bounds();
        segment
    }

    /// Replace the word list wholesale and re-derive the bounds.
    pub fn set_words(&mut self, words: Vec<Word>) {
        self.words = words;
        self.recompute_bounds();
    }

    /// Recompute `start_time`/`end_time` as min/max over the words' valid
    /// timestamps. Non-finite values are ignored.
    pub fn recompute_bounds(&mut self) {
        let (start, end) = word_bounds(&self.words);
        self.start_time = start;
        self.end_time = end;
    }

    pub fn joined_text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Index of the first word that is missing either timestamp.
    pub fn first_incomplete(&self) -> Option<usize> {
        first_incomplete(&self.words)
    }

    pub fn is_fully_timed(&self) -> bool {
        !self.words.is_empty() && self.words.iter().all(Word::is_timed)
    }

    pub fn contains(&self, time: f64) -> bool {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => time >= start && time <= end,
            _ => false,
        }
    }
}

/// Min start / max end over the words' finite timestamps.
pub fn word_bounds(words: &[Word]) -> (Option<f64>, Option<f64>) {
    let start = words
        .iter()
        .filter_map(|w| w.start_time)
        .filter(|t| t.is_finite())
        .fold(None, |acc: Option<f64>, t| Some(acc.map_or(t, |a| a.min(t))));
    let end = words
        .iter()
        .filter_map(|w| w.end_time)
        .filter(|t| t.is_finite())
        .fold(None, |acc: Option<f64>, t| Some(acc.map_or(t, |a| a.max(t))));
    (start, end)
}

pub fn first_incomplete(words: &[Word]) -> Option<usize> {
    words.iter().position(|w| !w.is_timed())
}
