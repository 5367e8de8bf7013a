//! Manual word-timing for karaoke lyrics.
//!
//! A spacebar-driven engine ([`sync`]) stamps words against the playhead of
//! an [`audio`] surface, a session actor ([`pool`]) owns the correction
//! document while it is edited, and [`ui`] provides the terminal front-ends.

pub mod audio;
pub mod event;
pub mod lrc;
pub mod model;
pub mod mpris;
pub mod pool;
pub mod replace_all;
pub mod state;
pub mod store;
pub mod sync;
pub mod text_utils;
pub mod timeline;
pub mod timer;
pub mod ui;
