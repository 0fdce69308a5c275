//! Sentence segmentation for narration.
//!
//! Turns a paper's cleaned content into the ordered sentence sequence that the
//! narrator walks through.

mod segmenter;

pub use segmenter::segment;
