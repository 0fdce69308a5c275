//! Gemini REST client for text cleanup and model listing.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::models::ModelList;
use super::{CleanedPaper, ModelInfo, sort_models};
use crate::error::{NarratorError, Result};

/// Upper bound of raw characters sent to the model.
const MAX_INPUT_CHARS: usize = 800_000;

const SERVICE: &str = "AI cleanup";

const CLEANUP_PROMPT: &str = r#"You are an expert academic editor. Your task is to extract the MAIN TEXT content from the following academic paper raw text.

Rules:
1. Remove all references, bibliographies, and citations.
2. Remove all headers, footers, page numbers, and running titles.
3. Remove all figure captions, table captions, and data tables.
4. Remove author names, affiliations, emails, and acknowledgments.
5. Keep the Abstract, Introduction, Methods, Results, Discussion, and Conclusion.
6. Return a JSON object with the following structure:
   {
     "title": "The Title of the Paper",
     "content": "The clean, readable text..."
   }
7. Do not include any markdown formatting like **bold** or # headers unless necessary for structure, but prefer plain text paragraphs.
8. Do not add any conversational filler.

Raw Text:
"#;

/// Turns raw extracted text into a title and narratable content.
pub trait CleanupService {
    async fn clean(&self, raw_text: &str, model: &str) -> Result<CleanedPaper>;
}

/// Client for the Gemini `generateContent` and `models` endpoints.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl GeminiClient {
    /// Create a client for the given API root (e.g. `https://generativelanguage.googleapis.com/v1beta`).
    pub fn new(api_key: &str, base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| NarratorError::external(SERVICE, e.to_string()))?;

        Ok(Self { http, api_key: api_key.to_string(), base_url: base_url.trim_end_matches('/').to_string() })
    }

    /// Models available to this key that support content generation.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = format!("{}/models?pageSize=1000&key={}", self.base_url, urlencoding::encode(&self.api_key));
        let response = self.http.get(&url).send().await.map_err(|e| NarratorError::external("Model listing", e.to_string()))?;
        let body = read_success_body(response, "Model listing").await?;

        let list: ModelList = serde_json::from_str(&body).map_err(|e| NarratorError::external("Model listing", e.to_string()))?;
        Ok(sort_models(list.models))
    }
}

impl CleanupService for GeminiClient {
    async fn clean(&self, raw_text: &str, model: &str) -> Result<CleanedPaper> {
        let input = truncate_chars(raw_text, MAX_INPUT_CHARS);
        info!("🧹 Cleaning {} characters with {}", input.chars().count(), model);

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url,
            urlencoding::encode(model),
            urlencoding::encode(&self.api_key)
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": format!("{CLEANUP_PROMPT}{input}") }] }]
        });

        let response = self.http.post(&url).json(&body).send().await.map_err(|e| NarratorError::external(SERVICE, e.to_string()))?;
        let body = read_success_body(response, SERVICE).await?;

        let reply = reply_text(&body).ok_or_else(|| NarratorError::external(SERVICE, "Failed to get valid response from AI."))?;
        debug!("Cleanup reply: {} characters", reply.len());
        CleanedPaper::from_reply(&reply)
    }
}

/// Return the body of a successful response, or the service's error message.
async fn read_success_body(response: reqwest::Response, service: &'static str) -> Result<String> {
    let status = response.status();
    let body = response.text().await.map_err(|e| NarratorError::external(service, e.to_string()))?;
    if status.is_success() {
        return Ok(body);
    }

    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| status.canonical_reason().unwrap_or("request failed").to_string());
    Err(NarratorError::external(service, format!("{message} (HTTP {})", status.as_u16())))
}

/// Text of the first part of the first candidate.
fn reply_text(body: &str) -> Option<String> {
    let response: GenerateResponse = serde_json::from_str(body).ok()?;
    response.candidates.into_iter().next()?.content?.parts.into_iter().next()?.text
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_text_takes_first_candidate_part() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"first"},{"text":"second"}]}},{"content":{"parts":[{"text":"other"}]}}]}"#;
        assert_eq!(reply_text(body).as_deref(), Some("first"));
    }

    #[test]
    fn test_reply_text_missing_pieces() {
        assert_eq!(reply_text(r#"{"candidates":[]}"#), None);
        assert_eq!(reply_text(r#"{}"#), None);
        assert_eq!(reply_text(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#), None);
        assert_eq!(reply_text("not json"), None);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 100), "short");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_prompt_asks_for_body_only_json() {
        for rule in ["emails, and acknowledgments", "data tables", "markdown formatting", "conversational filler", r#""title""#, r#""content""#] {
            assert!(CLEANUP_PROMPT.contains(rule), "missing {rule:?}");
        }
        assert!(CLEANUP_PROMPT.ends_with("Raw Text:\n"));
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = GeminiClient::new("key", "http://localhost:1/v1beta/").unwrap();
        assert_eq!(client.base_url, "http://localhost:1/v1beta");
    }
}
