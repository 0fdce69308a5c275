//! Upload-to-library pipeline.

mod pipeline;

pub use pipeline::{UploadedFile, import};
