//! Model setup: fetches the Kokoro TTS bundle.

mod download;

pub use download::fetch_tts_models;
