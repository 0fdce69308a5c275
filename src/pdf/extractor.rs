//! Per-page text extraction backed by `pdf-extract`.
//!
//! Layout is not preserved; the cleanup service deals with headers, columns
//! and stray line breaks.

use crate::error::{NarratorError, Result};

/// Text fragments of a PDF, grouped by page (page 1 first).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub pages: Vec<Vec<String>>,
}

impl ExtractedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Fragments joined by single spaces within a page, each page followed by a blank line.
    pub fn raw_text(&self) -> String {
        self.pages.iter().map(|fragments| fragments.join(" ") + "\n\n").collect()
    }
}

/// Source of raw text for the ingest pipeline.
pub trait PdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedDocument>;
}

/// Extractor using the pure-Rust `pdf-extract` crate.
pub struct PdfTextExtractor;

impl PdfExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedDocument> {
        // pdf-extract panics on some malformed documents instead of returning an error
        let pages = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
            .map_err(|_| NarratorError::external("PDF extraction", "the document could not be parsed"))?
            .map_err(|e| NarratorError::external("PDF extraction", e.to_string()))?;

        let pages = pages
            .iter()
            .map(|page| page.lines().map(str::trim).filter(|line| !line.is_empty()).map(str::to_string).collect())
            .collect();

        Ok(ExtractedDocument { pages })
    }
}
