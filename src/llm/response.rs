//! Parsing of the cleanup model's reply.

use serde::Deserialize;
use tracing::warn;

use crate::error::{NarratorError, Result};

/// Title used when the model does not answer with JSON.
pub const FALLBACK_TITLE: &str = "Extracted Paper";

/// Cleaned paper returned by the cleanup service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CleanedPaper {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl CleanedPaper {
    /// Interpret the model's text reply.
    ///
    /// Markdown code fences are stripped before parsing. A reply that is not
    /// JSON becomes the content verbatim under [`FALLBACK_TITLE`]. JSON of the
    /// wrong shape is an error.
    pub fn from_reply(reply: &str) -> Result<Self> {
        let json = reply.replace("```json", "").replace("```", "");
        let value = match serde_json::from_str::<serde_json::Value>(json.trim()) {
            Ok(value) => value,
            Err(e) => {
                warn!("Cleanup reply is not JSON ({}), using the raw text", e);
                return Ok(Self { title: FALLBACK_TITLE.to_string(), content: reply.to_string() });
            }
        };

        serde_json::from_value(value).map_err(|e| {
            warn!("Cleanup reply has an unexpected shape: {}", e);
            NarratorError::external("AI cleanup", "Failed to get valid response from AI.")
        })
    }
}
