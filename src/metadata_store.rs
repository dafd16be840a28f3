//! Recording metadata persisted as one JSON document
//!
//! Every mutation is read-full-list, modify, write-full-list. The list stays
//! in the hundreds, so the O(n) rewrite per call is fine; what is not fine is
//! two writers interleaving, so all mutations go through `write_lock`.

use sqlx::sqlite::SqlitePool;
use std::collections::HashSet;
use tokio::sync::Mutex;

use crate::constants::RECORDINGS_KEY;
use crate::db;
use crate::error::DynError;
use crate::recording::RecordingRecord;

pub struct MetadataStore {
    pool: SqlitePool,
    write_lock: Mutex<()>,
}

impl MetadataStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_lock: Mutex::new(()),
        }
    }

    /// Load the stored list
    /// Database errors propagate, a corrupt document reads as empty
    async fn load(&self) -> Result<Vec<RecordingRecord>, DynError> {
        let raw = match db::query_metadata(&self.pool, RECORDINGS_KEY).await? {
            Some(raw) => raw,
            None => return Ok(Vec::new()),
        };
        match serde_json::from_str(&raw) {
            Ok(records) => Ok(records),
            Err(e) => {
                log::warn!("Stored recordings list is corrupt, treating as empty: {}", e);
                Ok(Vec::new())
            }
        }
    }

    async fn write(&self, records: &[RecordingRecord]) -> Result<(), DynError> {
        let json = serde_json::to_string(records)?;
        db::upsert_metadata(&self.pool, RECORDINGS_KEY, &json).await
    }

    /// All stored records in storage order; an unreadable store yields an empty list
    pub async fn list(&self) -> Vec<RecordingRecord> {
        match self.load().await {
            Ok(records) => records,
            Err(e) => {
                log::warn!("Failed to read recordings list: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn get(&self, id: &str) -> Option<RecordingRecord> {
        self.list().await.into_iter().find(|r| r.id == id)
    }

    pub async fn append(&self, record: RecordingRecord) -> Result<(), DynError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;
        if records.iter().any(|r| r.id == record.id) {
            return Err(format!("Recording id '{}' already exists", record.id).into());
        }
        records.push(record);
        self.write(&records).await
    }

    /// Remove one record; `false` when nothing matched (no write happens)
    pub async fn remove_by_id(&self, id: &str) -> Result<bool, DynError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Ok(false);
        }
        self.write(&records).await?;
        Ok(true)
    }

    /// Remove every record whose id is in `ids` with a single write
    pub async fn remove_many(&self, ids: &HashSet<String>) -> Result<usize, DynError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;
        let before = records.len();
        records.retain(|r| !ids.contains(&r.id));
        let removed = before - records.len();
        if removed > 0 {
            self.write(&records).await?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::Quality;
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    async fn store() -> MetadataStore {
        let pool = db::open_in_memory().await.unwrap();
        db::init_database_schema(&pool).await.unwrap();
        MetadataStore::new(pool)
    }

    fn record(id: &str, timestamp: i64) -> RecordingRecord {
        RecordingRecord {
            id: id.to_string(),
            scripture_id: "psalm_23_1".to_string(),
            scripture_ref: "Psalm 23:1".to_string(),
            file_uri: PathBuf::from(format!("/archive/{}.m4a", id)),
            timestamp,
            accuracy: 92.0,
            duration: 3.0,
            file_size: 100,
            quality: Quality::Standard,
            tags: BTreeSet::new(),
        }
    }

    #[tokio::test]
    async fn test_append_and_list() {
        let store = store().await;
        assert!(store.list().await.is_empty());

        store.append(record("a", 1)).await.unwrap();
        store.append(record("b", 2)).await.unwrap();

        let ids: Vec<_> = store.list().await.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(store.get("b").await.unwrap().timestamp, 2);
        assert!(store.get("zzz").await.is_none());
    }

    #[tokio::test]
    async fn test_append_rejects_duplicate_id() {
        let store = store().await;
        store.append(record("a", 1)).await.unwrap();
        assert!(store.append(record("a", 5)).await.is_err());
        assert_eq!(store.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_by_id() {
        let store = store().await;
        store.append(record("a", 1)).await.unwrap();
        store.append(record("b", 2)).await.unwrap();

        assert!(store.remove_by_id("a").await.unwrap());
        assert!(!store.remove_by_id("a").await.unwrap());
        let ids: Vec<_> = store.list().await.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[tokio::test]
    async fn test_remove_many_in_one_batch() {
        let store = store().await;
        for (i, id) in ["a", "b", "c", "d"].iter().enumerate() {
            store.append(record(id, i as i64)).await.unwrap();
        }
        let ids: HashSet<String> = ["a", "c", "missing"].iter().map(|s| s.to_string()).collect();
        assert_eq!(store.remove_many(&ids).await.unwrap(), 2);
        let left: Vec<_> = store.list().await.into_iter().map(|r| r.id).collect();
        assert_eq!(left, vec!["b", "d"]);
        assert_eq!(store.remove_many(&HashSet::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_document_lists_empty() {
        let store = store().await;
        db::upsert_metadata(&store.pool, RECORDINGS_KEY, "[{\"id\":")
            .await
            .unwrap();
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_not_lost() {
        let store = std::sync::Arc::new(store().await);
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.append(record(&format!("r{}", i), i)).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.list().await.len(), 16);
    }

    #[tokio::test]
    async fn test_closed_pool_fails_writes_and_lists_empty() {
        let store = store().await;
        store.append(record("a", 1)).await.unwrap();
        store.pool.close().await;
        assert!(store.list().await.is_empty());
        assert!(store.append(record("b", 2)).await.is_err());
    }
}
