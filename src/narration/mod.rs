//! Sentence-driven narration state machine.
//!
//! The [`Narrator`] owns the sentence sequence and the narration cursor, drives
//! a [`SpeechDriver`](crate::tts::SpeechDriver) one sentence at a time and
//! publishes a [`NarrationSnapshot`] after every state change for the display.

mod narrator;
mod state;

pub use narrator::Narrator;
pub use state::{Cursor, NarrationSnapshot};
