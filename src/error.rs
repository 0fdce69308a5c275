//! Error taxonomy shared by the ingest pipeline, narration and the library.

use thiserror::Error;

/// Problems with what the user handed us. Reported immediately, nothing is mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Please upload a valid PDF file ('{file_name}' is {content_type})")]
    NotPdf { file_name: String, content_type: String },

    #[error("Please provide a Gemini API key (--api-key or GEMINI_API_KEY) to use the AI extraction feature")]
    MissingApiKey,

    #[error("No readable text found in this PDF ({chars} characters extracted)")]
    NoReadableText { chars: usize },
}

/// Errors surfaced by narrator operations.
#[derive(Debug, Error)]
pub enum NarratorError {
    #[error(transparent)]
    Input(#[from] InputError),

    /// Extraction or cleanup call failed. `message` is the underlying reason.
    #[error("{service} failed: {message}")]
    ExternalService { service: &'static str, message: String },

    #[error("speech synthesis failed: {0}")]
    Speech(String),
}

impl NarratorError {
    pub fn external(service: &'static str, message: impl Into<String>) -> Self {
        Self::ExternalService { service, message: message.into() }
    }
}

pub type Result<T, E = NarratorError> = std::result::Result<T, E>;
