use tracing::{info, warn};

use crate::backend::MemoryBackendRef;
use crate::errors::MemoryError;
use crate::record::MemoryRecord;

/// Ordered collection of uploaded-document references plus its
/// persistence behavior.
///
/// Insertion order is significant: it determines the order of the file
/// parts in every generation request. Records are never updated in
/// place; they only ever join via [`append`](Self::append) or leave via
/// [`reset`](Self::reset).
#[derive(Debug)]
pub struct MemoryStore {
    records: Vec<MemoryRecord>,
    backend: MemoryBackendRef,
}

impl MemoryStore {
    /// Load the store from its backend.
    ///
    /// Absent or unreadable persisted state starts the store empty; a
    /// corrupt memory file is discarded with a warning rather than
    /// aborting startup.
    pub async fn load(backend: MemoryBackendRef) -> Self {
        let records = match backend.read().await {
            Ok(Some(contents)) => match serde_json::from_str::<Vec<MemoryRecord>>(&contents) {
                Ok(records) => {
                    info!(documents = records.len(), "Loaded remembered documents");
                    records
                }
                Err(e) => {
                    warn!(error = %e, "Failed to parse memory file, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read memory file, starting empty");
                Vec::new()
            }
        };

        Self { records, backend }
    }

    /// Add a record to the in-memory sequence.
    ///
    /// Persistence is a separate step: callers batch appends and then
    /// call [`persist`](Self::persist) once.
    pub fn append(&mut self, record: MemoryRecord) {
        self.records.push(record);
    }

    /// Rewrite the whole backing file with the current sequence,
    /// pretty-printed
    pub async fn persist(&self) -> Result<(), MemoryError> {
        let serialized = serde_json::to_string_pretty(&self.records)?;
        self.backend.write(&serialized).await
    }

    /// Clear the in-memory sequence and delete the backing file
    pub async fn reset(&mut self) -> Result<(), MemoryError> {
        self.records.clear();
        self.backend.clear().await?;
        info!("Cleared all remembered documents");
        Ok(())
    }

    /// The remembered records, in insertion order
    pub fn records(&self) -> &[MemoryRecord] {
        &self.records
    }

    /// Ordered filenames of the remembered documents
    pub fn file_names(&self) -> Vec<String> {
        self.records.iter().map(|r| r.file_name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{FileBackend, InMemoryBackend, MemoryBackend};
    use std::sync::Arc;

    fn record(n: u32) -> MemoryRecord {
        MemoryRecord::new(
            "application/pdf",
            format!("https://generativelanguage.googleapis.com/v1beta/files/doc-{n}"),
            format!("dokumen-{n}.pdf"),
        )
    }

    #[tokio::test]
    async fn load_then_persist_round_trips() {
        let backend = Arc::new(InMemoryBackend::new());
        let original = serde_json::to_string_pretty(&vec![record(1), record(2)]).unwrap();
        backend.write(&original).await.unwrap();

        let store = MemoryStore::load(backend.clone()).await;
        assert_eq!(store.len(), 2);

        store.persist().await.unwrap();
        assert_eq!(backend.read().await.unwrap().as_deref(), Some(original.as_str()));
    }

    #[tokio::test]
    async fn corrupt_file_starts_empty_without_panicking() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.write("{ not json [").await.unwrap();

        let store = MemoryStore::load(backend).await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn append_preserves_order_across_reload() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FileBackend::new(dir.path().join("maira_memory.json")));

        let mut store = MemoryStore::load(backend.clone()).await;
        store.append(record(1));
        store.append(record(2));
        store.persist().await.unwrap();

        store.append(record(3));
        store.persist().await.unwrap();

        let reloaded = MemoryStore::load(backend).await;
        assert_eq!(reloaded.records(), &[record(1), record(2), record(3)]);
        assert_eq!(
            reloaded.file_names(),
            vec!["dokumen-1.pdf", "dokumen-2.pdf", "dokumen-3.pdf"]
        );
    }

    #[tokio::test]
    async fn reset_empties_store_and_removes_backing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("maira_memory.json");
        let backend = Arc::new(FileBackend::new(&path));

        let mut store = MemoryStore::load(backend.clone()).await;
        store.append(record(1));
        store.persist().await.unwrap();
        assert!(path.exists());

        store.reset().await.unwrap();
        assert!(store.is_empty());
        assert!(!path.exists());

        let reloaded = MemoryStore::load(backend).await;
        assert!(reloaded.is_empty());
    }

    #[tokio::test]
    async fn append_alone_does_not_persist() {
        let backend = Arc::new(InMemoryBackend::new());
        let mut store = MemoryStore::load(backend.clone()).await;

        store.append(record(1));
        assert_eq!(backend.read().await.unwrap(), None);
    }
}
