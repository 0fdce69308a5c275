//! Validate, extract, clean up and save an uploaded document.

use std::path::Path;

use anyhow::Context;
use tracing::{debug, info};

use crate::error::{InputError, NarratorError, Result};
use crate::library::{PaperLibrary, Storage};
use crate::llm::CleanupService;
use crate::pdf::PdfExtractor;

/// Extracted text shorter than this is treated as an image-only PDF.
const MIN_TEXT_CHARS: usize = 50;

const PDF_CONTENT_TYPE: &str = "application/pdf";

/// A document handed to the importer.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Read a file from disk and detect its content type.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let file_name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_else(|| path.display().to_string());
        let content_type = detect_content_type(&file_name, &bytes).to_string();
        Ok(Self { file_name, content_type, bytes })
    }

    /// File name without a trailing `.pdf`.
    fn stem(&self) -> &str {
        let len = self.file_name.len();
        if len >= 4 && self.file_name.is_char_boundary(len - 4) && self.file_name[len - 4..].eq_ignore_ascii_case(".pdf") {
            &self.file_name[..len - 4]
        } else {
            &self.file_name
        }
    }
}

fn detect_content_type(file_name: &str, bytes: &[u8]) -> &'static str {
    let extension = Path::new(file_name).extension().map(|e| e.to_string_lossy().to_ascii_lowercase());
    if bytes.starts_with(b"%PDF-") || extension.as_deref() == Some("pdf") {
        PDF_CONTENT_TYPE
    } else if extension.as_deref() == Some("txt") {
        "text/plain"
    } else {
        "application/octet-stream"
    }
}

/// Turn an uploaded PDF into a saved paper and return the new paper's id.
///
/// Input problems are reported before any extraction or network call. The
/// library is only touched once cleanup has produced content.
pub async fn import<S: Storage>(
    file: &UploadedFile,
    api_key: &str,
    model: &str,
    extractor: &impl PdfExtractor,
    cleaner: &impl CleanupService,
    library: &mut PaperLibrary<S>,
) -> Result<String> {
    if file.content_type != PDF_CONTENT_TYPE {
        return Err(InputError::NotPdf { file_name: file.file_name.clone(), content_type: file.content_type.clone() }.into());
    }
    if api_key.trim().is_empty() {
        return Err(InputError::MissingApiKey.into());
    }

    info!("📄 Extracting text from {}", file.file_name);
    let document = extractor.extract(&file.bytes)?;
    let raw_text = document.raw_text();
    let chars = raw_text.trim().chars().count();
    debug!("Extracted {} characters from {} pages", chars, document.page_count());
    if chars < MIN_TEXT_CHARS {
        return Err(InputError::NoReadableText { chars }.into());
    }

    let cleaned = cleaner.clean(&raw_text, model).await?;
    if cleaned.content.trim().is_empty() {
        return Err(NarratorError::external("AI cleanup", "Failed to get valid response from AI."));
    }

    let title = match cleaned.title.trim() {
        "" => file.stem(),
        title => title,
    };
    Ok(library.create(title, &cleaned.content))
}
