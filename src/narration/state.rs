//! Narration cursor and the snapshots published to subscribers.

use crate::config::Voice;

/// Playback position plus play state, rate and voice.
///
/// `index` ranges over `0..=len`; `len` is the end-of-narration sentinel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    pub index: usize,
    pub is_playing: bool,
    pub rate: f32,
    pub voice: Option<&'static Voice>,
}

impl Cursor {
    pub fn new(rate: f32, voice: Option<&'static Voice>) -> Self {
        Self { index: 0, is_playing: false, rate, voice }
    }
}

/// Immutable view of the narration state after a transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NarrationSnapshot {
    pub cursor: Cursor,
    /// Number of sentences in the loaded sequence
    pub len: usize,
    /// Bumped whenever a new sentence sequence is loaded
    pub generation: u64,
}
