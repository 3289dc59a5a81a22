//! Content-addressed image storage
//!
//! Images are stored by their SHA-256 hash, enabling:
//! - Deduplication (same image content = same hash)
//! - Immutable caching (hash never changes)
//! - Download by hash after the generation request has returned

use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tracing::debug;

use crate::store::StoreError;

/// Image data from storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub hash: String,
    pub data: Vec<u8>,
    pub mime_type: String,
    /// File name offered on download
    pub filename: String,
}

/// Content-addressed image store
#[derive(Clone)]
pub struct ImageStore {
    pool: SqlitePool,
}

impl ImageStore {
    /// Create a new image store
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Compute SHA-256 hash of data
    pub(crate) fn compute_hash(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }

    /// Store image by hash; storing the same bytes again keeps the first file name
    pub async fn store(
        &self,
        data: &[u8],
        mime_type: &str,
        filename: &str,
    ) -> Result<String, StoreError> {
        let hash = Self::compute_hash(data);
        let created_at = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO image_store (hash, data, mime_type, filename, size_bytes, created_at) \
             VALUES (?, ?, ?, ?, ?, ?) ON CONFLICT(hash) DO NOTHING",
        )
        .bind(&hash)
        .bind(data)
        .bind(mime_type)
        .bind(filename)
        .bind(data.len() as i64)
        .bind(&created_at)
        .execute(&self.pool)
        .await?;

        debug!("Stored image with hash {} ({} bytes)", hash, data.len());
        Ok(hash)
    }

    /// Get image by hash
    pub async fn get(&self, hash: &str) -> Result<Option<StoredImage>, StoreError> {
        let row: Option<(String, Vec<u8>, String, String)> = sqlx::query_as(
            "SELECT hash, data, mime_type, filename FROM image_store WHERE hash = ?",
        )
        .bind(hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(hash, data, mime_type, filename)| StoredImage {
            hash,
            data,
            mime_type,
            filename,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn test_hash_computation() {
        let hash = ImageStore::compute_hash(b"test");
        // Known SHA-256 of "test"
        assert_eq!(
            hash,
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[tokio::test]
    async fn test_store_and_get() {
        let db = Database::new(None).await.unwrap();
        let store = ImageStore::new(db.pool().clone());

        let hash = store
            .store(b"jpeg bytes", "image/jpeg", "Title_R1_img1.jpeg")
            .await
            .unwrap();

        let image = store.get(&hash).await.unwrap().unwrap();
        assert_eq!(image.data, b"jpeg bytes");
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(image.filename, "Title_R1_img1.jpeg");
    }

    #[tokio::test]
    async fn test_store_deduplicates() {
        let db = Database::new(None).await.unwrap();
        let store = ImageStore::new(db.pool().clone());

        let first = store.store(b"same", "image/jpeg", "a.jpeg").await.unwrap();
        let second = store.store(b"same", "image/jpeg", "b.jpeg").await.unwrap();
        assert_eq!(first, second);

        let image = store.get(&first).await.unwrap().unwrap();
        assert_eq!(image.filename, "a.jpeg");
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = Database::new(None).await.unwrap();
        let store = ImageStore::new(db.pool().clone());
        assert!(store.get("deadbeef").await.unwrap().is_none());
    }
}
