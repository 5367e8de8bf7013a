//! Correction document persistence.
//!
//! The document is the JSON payload submitted upstream. Only
//! `corrected_segments` is interpreted here; every other top-level field is
//! carried through untouched so a load/save round trip loses nothing.

use crate::model::Segment;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tempfile::NamedTempFile;
use tokio::fs;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrectionData {
    #[serde(default)]
    pub corrected_segments: Vec<Segment>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CorrectionData {
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Pretty JSON with segment bounds re-derived from their words.
    pub fn to_json(&self) -> Result<String, StoreError> {
        let mut doc = self.clone();
        doc.normalize();
        Ok(serde_json::to_string_pretty(&doc)?)
    }

    /// Recompute text and bounds for every segment.
    pub fn normalize(&mut self) {
        for segment in &mut self.corrected_segments {
            segment.recompute_bounds();
            segment.text = segment.joined_text();
        }
    }

    /// Latest word end across the document; used to size the virtual clock.
    pub fn last_timestamp(&self) -> Option<f64> {
        self.corrected_segments
            .iter()
            .filter_map(|s| s.end_time)
            .fold(None, |acc: Option<f64>, t| Some(acc.map_or(t, |a| a.max(t))))
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Write `contents` to a uniquely named temp file beside `path`, sync it and
/// rename it over `path`. The temp file is removed if any step fails.
async fn atomic_write(path: &Path, contents: &str) -> Result<(), StoreError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).await.map_err(io_err(parent))?;

    let temp = NamedTempFile::new_in(parent).map_err(io_err(parent))?;
    fs::write(temp.path(), contents).await.map_err(io_err(temp.path()))?;
    temp.as_file().sync_all().map_err(io_err(temp.path()))?;
    temp.persist(path).map_err(|e| StoreError::Io {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

pub async fn load(path: &Path) -> Result<CorrectionData, StoreError> {
    let contents = fs::read_to_string(path).await.map_err(io_err(path))?;
    let doc = CorrectionData::from_json(&contents)?;
    tracing::info!(
        path = %path.display(),
        segments = doc.corrected_segments.len(),
        "Loaded correction document"
    );
    Ok(doc)
}

pub async fn save(path: &Path, doc: &CorrectionData) -> Result<(), StoreError> {
    let json = doc.to_json()?;
    atomic_write(path, &json).await?;
    tracing::info!(path = %path.display(), "Saved correction document");
    Ok(())
}

pub async fn read_text(path: &Path) -> Result<String, StoreError> {
    fs::read_to_string(path).await.map_err(io_err(path))
}

pub async fn write_text(path: &Path, text: &str) -> Result<(), StoreError> {
    atomic_write(path, text).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Word;

    const DOC: &str = r#"{
        "corrected_segments": [
            {"id": "s1", "text": "hi there", "start_time": 1.0, "end_time": 2.0,
             "words": [
                {"id": "w1", "text": "hi", "start_time": 1.0, "end_time": 1.4, "confidence": 0.9},
                {"id": "w2", "text": "there", "start_time": null, "end_time": null, "confidence": 0.8}
             ]}
        ],
        "anchor_sequences": [{"id": "a1"}],
        "metadata": {"audio_filepath": "song.flac"}
    }"#;

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let doc = CorrectionData::from_json(DOC).unwrap();
        assert_eq!(doc.corrected_segments.len(), 1);
        assert!(doc.extra.contains_key("anchor_sequences"));
        let json = doc.to_json().unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back["metadata"]["audio_filepath"], "song.flac");
        assert_eq!(back["corrected_segments"][0]["words"][1]["start_time"], Value::Null);
    }

    #[test]
    fn test_save_recomputes_stale_bounds() {
        let doc = CorrectionData::from_json(DOC).unwrap();
        let json = doc.to_json().unwrap();
        let back = CorrectionData::from_json(&json).unwrap();
        assert_eq!(back.corrected_segments[0].end_time, Some(1.4));
    }

    #[test]
    fn test_last_timestamp() {
        let mut doc = CorrectionData::default();
        assert_eq!(doc.last_timestamp(), None);
        let word = Word {
            start_time: Some(3.0),
            end_time: Some(42.0),
            ..Word::untimed("w", "w")
        };
        doc.corrected_segments.push(Segment::from_words("s", vec![word]));
        assert_eq!(doc.last_timestamp(), Some(42.0));
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("correction.json");
        let doc = CorrectionData::from_json(DOC).unwrap();
        save(&path, &doc).await.unwrap();
        let loaded = load(&path).await.unwrap();
        assert_eq!(loaded.corrected_segments[0].words[0].text, "hi");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_save_overwrites_existing_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("correction.json");
        std::fs::write(&path, "stale").unwrap();
        save(&path, &CorrectionData::from_json(DOC).unwrap()).await.unwrap();
        assert!(load(&path).await.is_ok());
    }

    #[tokio::test]
    async fn test_failed_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in the way makes the final rename fail.
        let path = dir.path().join("taken");
        std::fs::create_dir(&path).unwrap();
        let err = save(&path, &CorrectionData::default()).await.unwrap_err();
        assert!(err.to_string().contains("taken"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_write_text_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("song.lrc");
        write_text(&path, "[00:01.00]hi").await.unwrap();
        assert_eq!(read_text(&path).await.unwrap(), "[00:01.00]hi");
    }

    #[tokio::test]
    async fn test_load_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let err = load(&path).await.unwrap_err();
        assert!(err.to_string().contains("missing.json"));
    }
}
