//! Riddle history persistence
//!
//! The full history of every theme is one JSON document, keyed by theme id
//! (as a string). It is read and rewritten as a unit on every change:
//! - No partial updates
//! - No versioning or migration
//!
//! Changes go through `RiddleStore::update`, which holds a lock across the
//! read-modify-write so concurrent actions never drop each other's writes.
//!
//! The raw document sits behind `DocumentStore`, so the SQLite backing used
//! by the daemon can be swapped for `MemoryDocumentStore` in tests.

mod sqlite;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

use crate::riddle::Riddle;

pub use sqlite::SqliteDocumentStore;

/// Key of the riddle document
pub const RIDDLE_DOCUMENT_KEY: &str = "artisticRiddleData";

/// Theme id (as string) -> history
pub type StoredData = BTreeMap<String, Vec<Riddle>>;

/// Persistence errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The stored document is not a valid riddle store
    #[error("Corrupt riddle document: {0}")]
    Corrupt(#[source] serde_json::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),
}

/// Raw key-value document storage
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a document, `None` if it was never written
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrite a document
    async fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-memory document storage
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: Mutex<HashMap<String, String>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.documents.lock().get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.documents
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Typed access to the riddle document
#[derive(Clone)]
pub struct RiddleStore {
    documents: Arc<dyn DocumentStore>,
    /// Held for every read-modify-write of the document
    write_lock: Arc<AsyncMutex<()>>,
}

impl RiddleStore {
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self {
            documents,
            write_lock: Arc::new(AsyncMutex::new(())),
        }
    }

    /// Load every history; empty when nothing was saved yet
    pub async fn load(&self) -> Result<StoredData, StoreError> {
        match self.documents.read(RIDDLE_DOCUMENT_KEY).await? {
            Some(raw) => serde_json::from_str(&raw).map_err(StoreError::Corrupt),
            None => Ok(StoredData::new()),
        }
    }

    /// Overwrite the whole document
    pub async fn save(&self, data: &StoredData) -> Result<(), StoreError> {
        let _lock = self.write_lock.lock().await;
        self.write_document(data).await
    }

    async fn write_document(&self, data: &StoredData) -> Result<(), StoreError> {
        let raw = serde_json::to_string(data).map_err(StoreError::Serialization)?;
        self.documents.write(RIDDLE_DOCUMENT_KEY, &raw).await?;
        debug!("Saved riddle document ({} themes, {} bytes)", data.len(), raw.len());
        Ok(())
    }

    /// History of one theme
    pub async fn history(&self, key: &str) -> Result<Vec<Riddle>, StoreError> {
        Ok(self.load().await?.remove(key).unwrap_or_default())
    }

    /// Apply `change` to the freshly loaded history of one theme and save it
    ///
    /// Other updates wait until this one is written.
    pub async fn update<T, F>(&self, key: &str, change: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Vec<Riddle>) -> T,
    {
        let _lock = self.write_lock.lock().await;

        let mut data = self.load().await?;
        let history = data.entry(key.to_string()).or_default();
        let result = change(history);
        self.write_document(&data).await?;
        Ok(result)
    }

    /// Replace one theme's history, rewriting the whole document
    pub async fn put_history(&self, key: &str, riddles: Vec<Riddle>) -> Result<(), StoreError> {
        self.update(key, |history| *history = riddles).await
    }
}
