//! Replace-all lyrics: rebuild the song from pasted text and sync it in one
//! continuous whole-song pass.
//!
//! The engine times a single segment, so the song is flattened into one
//! surface segment for the pass and split back into lines on every publish.

use crate::lrc::strip_lrc_markup;
use crate::model::{Segment, Word};

/// Identifier of the flattened whole-song surface.
pub const WHOLE_SONG_ID: &str = "whole-song";

/// Build an untimed segment skeleton from pasted text: one segment per
/// non-empty line, one word per whitespace token. LRC stamps are stripped
/// first; lines left empty are dropped.
pub fn parse_replacement_text(text: &str) -> Vec<Segment> {
    text.lines()
        .map(strip_lrc_markup)
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(line_idx, line)| {
            let words = line
                .split_whitespace()
                .enumerate()
                .map(|(word_idx, token)| {
                    Word::untimed(format!("word-{}-{}", line_idx, word_idx), token)
                })
                .collect();
            Segment::from_words(format!("segment-{}", line_idx), words)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
struct LineSlot {
    id: String,
    words: usize,
}

/// Remembers how a flattened word list maps back onto lines.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SongLayout {
    lines: Vec<LineSlot>,
}

impl SongLayout {
    /// Flatten `segments` into the whole-song surface segment.
    pub fn flatten(segments: &[Segment]) -> (Self, Segment) {
        let lines = segments
            .iter()
            .map(|s| LineSlot {
                id: s.id.clone(),
                words: s.words.len(),
            })
            .collect();
        let words = segments.iter().flat_map(|s| s.words.iter().cloned()).collect();
        (Self { lines }, Segment::from_words(WHOLE_SONG_ID, words))
    }

    /// Line index and word offset within that line for a flat word index.
    pub fn locate(&self, flat_index: usize) -> Option<(usize, usize)> {
        let mut remaining = flat_index;
        for (line, slot) in self.lines.iter().enumerate() {
            if remaining < slot.words {
                return Some((line, remaining));
            }
            remaining -= slot.words;
        }
        None
    }

    /// Split a flat word list back into lines with recomputed bounds.
    ///
    /// A shorter list leaves trailing lines short or empty; surplus words
    /// are appended to the last line.
    pub fn split(&self, words: Vec<Word>) -> Vec<Segment> {
        let mut iter = words.into_iter();
        let mut out: Vec<Segment> = self
            .lines
            .iter()
            .map(|slot| Segment::from_words(slot.id.clone(), iter.by_ref().take(slot.words).collect()))
            .collect();
        let surplus: Vec<Word> = iter.collect();
        if !surplus.is_empty() {
            match out.last_mut() {
                Some(last) => {
                    let mut words = std::mem::take(&mut last.words);
                    words.extend(surplus);
                    last.set_words(words);
                    last.text = last.joined_text();
                }
                None => out.push(Segment::from_words("segment-0", surplus)),
            }
        }
        out
    }
}
