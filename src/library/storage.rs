//! String-keyed storage backends for the library record.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Failure reading or writing a stored record.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read '{key}': {source}")]
    Read { key: String, source: io::Error },

    #[error("failed to write '{key}': {source}")]
    Write { key: String, source: io::Error },

    #[error("record '{key}' is corrupt: {source}")]
    Corrupt { key: String, source: serde_json::Error },

    #[error("failed to serialize '{key}': {source}")]
    Serialize { key: String, source: serde_json::Error },
}

/// Key-value storage holding whole serialized records.
pub trait Storage {
    /// Read a record; `Ok(None)` when nothing has been stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the record stored under `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Stores each key as `<dir>/<key>.json`.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read { key: key.to_string(), source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        write_atomically(&self.dir, &path, value).map_err(|source| StorageError::Write { key: key.to_string(), source })?;
        debug!("Stored {} bytes in {}", value.len(), path.display());
        Ok(())
    }
}

/// Write to a sibling temporary file, then rename over the target.
fn write_atomically(dir: &Path, path: &Path, value: &str) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let tmp = path.with_extension("json.tmp");
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)
}

/// In-memory storage with switchable failures.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStorage {
    pub records: std::collections::HashMap<String, String>,
    pub fail_reads: bool,
    pub fail_writes: bool,
}

#[cfg(test)]
impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.fail_reads {
            return Err(StorageError::Read { key: key.to_string(), source: io::Error::other("read disabled") });
        }
        Ok(self.records.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Write { key: key.to_string(), source: io::Error::other("write disabled") });
        }
        self.records.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
