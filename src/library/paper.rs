//! Paper records and the library that owns them.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, error, info, warn};

use super::storage::{Storage, StorageError};

/// Storage key of the serialized paper list.
const RECORD_KEY: &str = "savedPapers";

/// One processed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    /// Creation time in milliseconds since the Unix epoch
    pub id: String,
    pub title: String,
    /// Cleaned full text
    pub content: String,
    /// ISO-8601 creation timestamp
    pub date: String,
}

/// Ordered list of saved papers, persisted after every change.
///
/// Persistence is best effort: a failed write is logged and the in-memory list
/// stays authoritative for the rest of the session.
pub struct PaperLibrary<S: Storage> {
    storage: S,
    papers: Vec<Paper>,
}

impl<S: Storage> PaperLibrary<S> {
    /// Open the library, treating an unreadable or corrupt record as empty.
    pub fn open(storage: S) -> Self {
        let papers = match read_papers(&storage) {
            Ok(papers) => papers,
            Err(e) => {
                error!("Failed to load saved papers: {}", e);
                Vec::new()
            }
        };
        debug!("Opened library with {} papers", papers.len());
        Self { storage, papers }
    }

    /// Saved papers in creation order.
    pub fn list(&self) -> &[Paper] {
        &self.papers
    }

    pub fn load(&self, id: &str) -> Option<&Paper> {
        self.papers.iter().find(|p| p.id == id)
    }

    /// Save a new paper and return its id.
    pub fn create(&mut self, title: &str, content: &str) -> String {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or_default();
        let id = self.unique_id(now);
        let date = OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();

        self.papers.push(Paper { id: id.clone(), title: title.to_string(), content: content.to_string(), date });
        info!("💾 Saved \"{}\" as {}", title, id);
        self.persist();
        id
    }

    /// Rename a paper. Returns `false` when the id is unknown or the title is blank.
    pub fn rename(&mut self, id: &str, new_title: &str) -> bool {
        let new_title = new_title.trim();
        if new_title.is_empty() {
            return false;
        }
        let Some(paper) = self.papers.iter_mut().find(|p| p.id == id) else {
            return false;
        };

        paper.title = new_title.to_string();
        self.persist();
        true
    }

    /// Delete a paper. Returns `false` when the id is unknown.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.papers.len();
        self.papers.retain(|p| p.id != id);
        if self.papers.len() == before {
            return false;
        }

        self.persist();
        true
    }

    /// Millisecond timestamp id, bumped past any id already taken.
    fn unique_id(&self, now_millis: u128) -> String {
        let mut candidate = now_millis;
        while self.papers.iter().any(|p| p.id == candidate.to_string()) {
            candidate += 1;
        }
        candidate.to_string()
    }

    fn persist(&mut self) {
        let result = serde_json::to_string(&self.papers)
            .map_err(|source| StorageError::Serialize { key: RECORD_KEY.to_string(), source })
            .and_then(|json| self.storage.set(RECORD_KEY, &json));

        if let Err(e) = result {
            warn!("Failed to persist saved papers, keeping changes in memory: {}", e);
        }
    }

    #[cfg(test)]
    pub fn storage(&self) -> &S {
        &self.storage
    }
}

fn read_papers(storage: &impl Storage) -> Result<Vec<Paper>, StorageError> {
    match storage.get(RECORD_KEY)? {
        Some(json) => serde_json::from_str(&json).map_err(|source| StorageError::Corrupt { key: RECORD_KEY.to_string(), source }),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::{FileStorage, MemoryStorage};

    fn library_with(titles: &[&str]) -> PaperLibrary<MemoryStorage> {
        let mut library = PaperLibrary::open(MemoryStorage::default());
        for title in titles {
            library.create(title, "Some content.");
        }
        library
    }

    #[test]
    fn test_create_appends_and_persists() {
        let library = library_with(&["A", "B"]);
        let titles: Vec<_> = library.list().iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["A", "B"]);

        let stored = library.storage().records.get(RECORD_KEY).unwrap();
        let papers: Vec<Paper> = serde_json::from_str(stored).unwrap();
        assert_eq!(papers, library.list());
    }

    #[test]
    fn test_ids_are_unique_and_dates_iso8601() {
        let library = library_with(&["A", "B", "C"]);
        let papers = library.list();
        assert_ne!(papers[0].id, papers[1].id);
        assert_ne!(papers[1].id, papers[2].id);
        assert!(papers.iter().all(|p| p.id.parse::<u128>().is_ok()));
        assert!(papers.iter().all(|p| OffsetDateTime::parse(&p.date, &Rfc3339).is_ok()));
    }

    #[test]
    fn test_rename_ignores_blank_titles() {
        let mut library = library_with(&["Original"]);
        let id = library.list()[0].id.clone();

        assert!(!library.rename(&id, "   "));
        assert_eq!(library.load(&id).unwrap().title, "Original");

        assert!(library.rename(&id, "  Better title "));
        assert_eq!(library.list()[0].title, "Better title");

        let reopened = PaperLibrary::open(MemoryStorage { records: library.storage().records.clone(), ..Default::default() });
        assert_eq!(reopened.list()[0].title, "Better title");
    }

    #[test]
    fn test_rename_unknown_id_is_noop() {
        let mut library = library_with(&["Only"]);
        assert!(!library.rename("missing", "New"));
        assert_eq!(library.list()[0].title, "Only");
    }

    #[test]
    fn test_delete_removes_exactly_one() {
        let mut library = library_with(&["A", "B", "C"]);
        let snapshot = library.list().to_vec();

        assert!(!library.delete("missing"));
        assert_eq!(library.list(), snapshot.as_slice());

        assert!(library.delete(&snapshot[1].id));
        assert_eq!(library.list(), &[snapshot[0].clone(), snapshot[2].clone()]);
    }

    #[test]
    fn test_corrupt_record_opens_empty() {
        let mut storage = MemoryStorage::default();
        storage.records.insert(RECORD_KEY.to_string(), "{not json".to_string());
        assert!(PaperLibrary::open(storage).list().is_empty());

        let storage = MemoryStorage { fail_reads: true, ..Default::default() };
        assert!(PaperLibrary::open(storage).list().is_empty());
    }

    #[test]
    fn test_write_failure_keeps_memory_state() {
        let mut library = PaperLibrary::open(MemoryStorage { fail_writes: true, ..Default::default() });
        let id = library.create("Kept", "Body.");
        assert_eq!(library.load(&id).map(|p| p.title.as_str()), Some("Kept"));
        assert!(library.storage().records.is_empty());
    }

    #[test]
    fn test_record_format_round_trips_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let id = {
            let mut library = PaperLibrary::open(FileStorage::new(dir.path()));
            library.create("On disk", "Persisted body.")
        };

        let raw = std::fs::read_to_string(dir.path().join("savedPapers.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let record = &value[0];
        for field in ["id", "title", "content", "date"] {
            assert!(record.get(field).is_some(), "missing {}", field);
        }

        let library = PaperLibrary::open(FileStorage::new(dir.path()));
        assert_eq!(library.load(&id).unwrap().content, "Persisted body.");
    }
}
