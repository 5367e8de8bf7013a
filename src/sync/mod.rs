//! Manual spacebar word-timing: engine, timing policy and input events.

pub mod engine;
pub mod input;
pub mod overlap;
pub mod timing;

pub use engine::{StartPoint, SyncEngine, SyncMode, SyncPhase, SyncSession, WordSink};
pub use input::{Key, KeyInput, KeyKind};
pub use timing::SyncTiming;
