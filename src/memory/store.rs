//! Record stores: append-only insert plus similarity search
//!
//! Two implementations behind one trait: `MemoryRecordStore` keeps records in
//! process memory only (tests, ephemeral runs); `FileRecordStore` wraps it
//! with a JSONL file so records survive restarts. Both guarantee that a
//! search running concurrently with an insert observes either the pre- or
//! post-state, never a partially written record.

use crate::error::{Error, Result};
use crate::memory::record::Record;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// A record paired with its similarity score for one search
#[derive(Debug, Clone)]
pub struct ScoredRecord {
    /// The matched record
    pub record: Record,
    /// Similarity of the record's embedding to the query vector
    pub score: f32,
}

/// Storage abstraction for indexed records
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a record. Append-only; a duplicate id is an integrity violation.
    async fn insert(&self, record: Record) -> Result<()>;

    /// Return up to `limit` records ordered by descending similarity to
    /// `query`. Ties are broken by insertion order. An empty store yields an
    /// empty result; `limit` larger than the store size yields fewer results.
    async fn search(&self, query: &[f32], limit: usize) -> Result<Vec<ScoredRecord>>;

    /// Number of stored records
    async fn count(&self) -> usize;
}

/// Cosine similarity between two vectors.
///
/// Mismatched dimensions or a zero-magnitude vector score 0.0 rather than
/// erroring, so one odd record cannot fail a whole search.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// In-memory record store
///
/// Records are kept in insertion order so that the stable sort in `search`
/// breaks similarity ties deterministically.
pub struct MemoryRecordStore {
    inner: Arc<RwLock<StoreInner>>,
}

struct StoreInner {
    records: Vec<Record>,
    ids: HashSet<Uuid>,
}

impl MemoryRecordStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(StoreInner {
                records: Vec::new(),
                ids: HashSet::new(),
            })),
        }
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, record: Record) -> Result<()> {
        let mut inner = self.inner.write().await;
        if !inner.ids.insert(record.id) {
            return Err(Error::Storage(format!("record id collision: {}", record.id)));
        }
        inner.records.push(record);
        Ok(())
    }

    async fn search(&self, query: &[f32], limit: usize) -> Result<Vec<ScoredRecord>> {
        let inner = self.inner.read().await;
        let mut scored: Vec<ScoredRecord> = inner
            .records
            .iter()
            .map(|record| ScoredRecord {
                score: cosine_similarity(query, &record.embedding),
                record: record.clone(),
            })
            .collect();

        // Stable sort over the insertion-ordered list: equal scores keep
        // insertion order.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);
        Ok(scored)
    }

    async fn count(&self) -> usize {
        self.inner.read().await.records.len()
    }
}

/// File-backed record store
///
/// Keeps all records in memory for search and appends each insert as one
/// JSON line to `records.jsonl` before the insert returns. On startup the
/// file is replayed; unparseable lines are skipped with a warning so one bad
/// line cannot take the store down.
pub struct FileRecordStore {
    memory: MemoryRecordStore,
    data_path: PathBuf,
    /// Serializes appends so concurrent inserts cannot interleave lines
    append_lock: Mutex<()>,
}

impl FileRecordStore {
    /// Open (or create) a store rooted at `base_dir`
    pub async fn new(base_dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(base_dir).await?;
        let data_path = base_dir.join("records.jsonl");

        let store = Self {
            memory: MemoryRecordStore::new(),
            data_path,
            append_lock: Mutex::new(()),
        };
        store.load_from_disk().await?;
        Ok(store)
    }

    /// Replay the JSONL file into memory
    async fn load_from_disk(&self) -> Result<()> {
        if !self.data_path.exists() {
            return Ok(());
        }

        let content = tokio::fs::read_to_string(&self.data_path).await?;
        let mut loaded = 0usize;
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Record>(line) {
                Ok(record) => {
                    if let Err(e) = self.memory.insert(record).await {
                        tracing::warn!("Skipping stored record: {}", e);
                    } else {
                        loaded += 1;
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        "Skipping unparseable line in {}: {}",
                        self.data_path.display(),
                        e
                    );
                }
            }
        }

        if loaded > 0 {
            tracing::info!(count = loaded, "Loaded records from {}", self.data_path.display());
        }
        Ok(())
    }

    /// Append one record as a JSON line
    async fn append(&self, record: &Record) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.data_path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn insert(&self, record: Record) -> Result<()> {
        let _guard = self.append_lock.lock().await;
        self.memory.insert(record.clone()).await?;
        self.append(&record).await
    }

    async fn search(&self, query: &[f32], limit: usize) -> Result<Vec<ScoredRecord>> {
        self.memory.search(query, limit).await
    }

    async fn count(&self) -> usize {
        self.memory.count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(text: &str, embedding: Vec<f32>, when: &str) -> Record {
        Record::new(text, embedding, when)
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[0.0, 1.0])).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_insert_and_search() {
        let store = MemoryRecordStore::new();
        store
            .insert(record("apples", vec![1.0, 0.0], "2023-06-01 10:00:00"))
            .await
            .unwrap();
        store
            .insert(record("oranges", vec![0.0, 1.0], "2023-06-01 10:01:00"))
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.1], 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].record.text, "apples");
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_search_empty_store() {
        let store = MemoryRecordStore::new();
        let results = store.search(&[1.0, 0.0], 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_search_limit_larger_than_store() {
        let store = MemoryRecordStore::new();
        store
            .insert(record("only", vec![1.0, 0.0], "2023-06-01 10:00:00"))
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0], 100).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_search_respects_limit() {
        let store = MemoryRecordStore::new();
        for i in 0..5 {
            store
                .insert(record(
                    &format!("msg-{i}"),
                    vec![1.0, i as f32 * 0.01],
                    "2023-06-01 10:00:00",
                ))
                .await
                .unwrap();
        }

        let results = store.search(&[1.0, 0.0], 3).await.unwrap();
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_ties_broken_by_insertion_order() {
        let store = MemoryRecordStore::new();
        store
            .insert(record("first", vec![1.0, 0.0], "2023-06-01 10:00:00"))
            .await
            .unwrap();
        store
            .insert(record("second", vec![1.0, 0.0], "2023-06-01 10:01:00"))
            .await
            .unwrap();
        store
            .insert(record("third", vec![1.0, 0.0], "2023-06-01 10:02:00"))
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0], 10).await.unwrap();
        let texts: Vec<&str> = results.iter().map(|r| r.record.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_duplicate_id_is_storage_fault() {
        let store = MemoryRecordStore::new();
        let rec = record("dup", vec![1.0], "2023-06-01 10:00:00");
        store.insert(rec.clone()).await.unwrap();

        let result = store.insert(rec).await;
        assert!(matches!(result, Err(Error::Storage(_))));
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_insert_and_search() {
        let store = Arc::new(MemoryRecordStore::new());

        let writer = {
            let store = store.clone();
            tokio::spawn(async move {
                for i in 0..50 {
                    store
                        .insert(Record::new(
                            format!("msg-{i}"),
                            vec![1.0, 0.0, 0.0],
                            "2023-06-01 10:00:00",
                        ))
                        .await
                        .unwrap();
                }
            })
        };

        let reader = {
            let store = store.clone();
            tokio::spawn(async move {
                for _ in 0..50 {
                    let results = store.search(&[1.0, 0.0, 0.0], 100).await.unwrap();
                    // Every observed record is complete: full embedding and
                    // a parseable timestamp.
                    for scored in &results {
                        assert_eq!(scored.record.embedding.len(), 3);
                        assert!(!scored.record.when.is_empty());
                    }
                }
            })
        };

        writer.await.unwrap();
        reader.await.unwrap();
        assert_eq!(store.count().await, 50);
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = TempDir::new().unwrap();

        {
            let store = FileRecordStore::new(dir.path()).await.unwrap();
            store
                .insert(record("persisted", vec![1.0, 0.0], "2023-06-01 10:00:00"))
                .await
                .unwrap();
            assert_eq!(store.count().await, 1);
        }

        // Reopen from the same directory
        let store = FileRecordStore::new(dir.path()).await.unwrap();
        assert_eq!(store.count().await, 1);
        let results = store.search(&[1.0, 0.0], 10).await.unwrap();
        assert_eq!(results[0].record.text, "persisted");
    }

    #[tokio::test]
    async fn test_file_store_skips_corrupt_lines() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("records.jsonl"), "not valid json\n").unwrap();

        let store = FileRecordStore::new(dir.path()).await.unwrap();
        assert_eq!(store.count().await, 0);

        // The store still accepts new inserts after the bad line
        store
            .insert(record("after", vec![1.0], "2023-06-01 10:00:00"))
            .await
            .unwrap();
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn test_file_store_read_your_writes() {
        let dir = TempDir::new().unwrap();
        let store = FileRecordStore::new(dir.path()).await.unwrap();

        store
            .insert(record("fresh", vec![1.0, 0.0], "2023-06-01 10:00:00"))
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0], 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record.text, "fresh");
    }
}
