use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Space,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Down,
    Up,
}

/// One keyboard transition with the wall-clock instant it was observed.
///
/// The instant only feeds tap/hold classification; word times always come
/// from the audio playhead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub kind: KeyKind,
    pub key: Key,
    pub at: Instant,
}

impl KeyInput {
    pub fn space_down(at: Instant) -> Self {
        Self { kind: KeyKind::Down, key: Key::Space, at }
    }

    pub fn space_up(at: Instant) -> Self {
        Self { kind: KeyKind::Up, key: Key::Space, at }
    }

    pub fn is_space(&self) -> bool {
        self.key == Key::Space
    }
}
