//! Configuration module for the paper narrator.
//!
//! Provides CLI argument parsing, configuration management and the voice catalog.

#[allow(clippy::module_inception)]
mod config;
mod voices;

pub use config::{AppConfig, Command, DEFAULT_MODEL, KOKORO_BUNDLE, SPEECH_RATES};
pub use voices::{Voice, get_voice, ordered_voices, select_default};
