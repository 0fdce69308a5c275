//! Saved-paper library.
//!
//! Papers live in memory as an ordered list and are written back in full to a
//! string-keyed storage collaborator after every mutation.

mod paper;
mod storage;

pub use paper::{Paper, PaperLibrary};
#[cfg(test)]
pub use storage::MemoryStorage;
pub use storage::{FileStorage, Storage, StorageError};
