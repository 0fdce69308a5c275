//! LLM cleanup service.
//!
//! Sends raw PDF text to Gemini, which strips references, captions, headers
//! and other non-body text and returns a title plus the readable content.

mod client;
mod models;
mod response;

pub use client::{CleanupService, GeminiClient};
pub use models::{ModelInfo, sort_models};
pub use response::CleanedPaper;
