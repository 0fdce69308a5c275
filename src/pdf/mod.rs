//! PDF text extraction.

mod extractor;

pub use extractor::{ExtractedDocument, PdfExtractor, PdfTextExtractor};
