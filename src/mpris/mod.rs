//! MPRIS module: re-exports and module declarations for submodules.

pub mod connection;
pub mod metadata;
pub mod playback;

pub use connection::{MprisError, discover_player, is_blocked};
pub use metadata::{TrackMetadata, get_metadata};
