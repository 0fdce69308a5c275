//! Audio output for narration.
//!
//! Plays synthesized sentences through the default output device using cpal,
//! with high-quality resampling support via rubato.

mod playback;
mod resampler;
mod util;

pub use playback::{PlaybackOutcome, Player};
