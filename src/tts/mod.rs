//! Text-to-speech module using sherpa-rs.
//!
//! Provides the speech driver the narrator talks to and the Kokoro synthesizer behind it.

mod driver;
mod synthesizer;

#[cfg(test)]
pub(crate) use driver::testing;
pub use driver::{KokoroSpeech, SpeechDriver, SpeechEvent, Utterance, UtteranceId};
pub use synthesizer::Synthesizer;
