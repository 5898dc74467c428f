//! The Corpus Store (spec §4.1): vector search, atomic confidence update,
//! usage increment.
//!
//! The in-memory implementation here mirrors `dashflow-pgvector`'s
//! `PgVectorStore` at the interface level (`search`/connection-guarded
//! mutation) but swaps its single `Arc<tokio::sync::Mutex<Client>>` for a
//! `DashMap` of per-row `parking_lot::Mutex` guards, since the spec
//! requires per-row (not whole-store) serializability for confidence
//! updates (§4.1, §5) — two concurrent closures touching different entries
//! must not block each other.

use crate::vector::cosine_similarity;
use async_trait::async_trait;
use chrono::Utc;
use corpus_core::error::{Error, Result};
use corpus_core::model::{CorpusEntry, EntryKey, Hit, SourceKind};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

/// Vector search, confidence update, and usage tracking over corpus entries.
#[async_trait]
pub trait CorpusStore: Send + Sync {
    /// Search for the `top_k` nearest entries to `query_vector`.
    ///
    /// `category`, if given, matches case-insensitively as a substring.
    /// `min_similarity`, if given, drops hits scoring below it.
    async fn search(
        &self,
        query_vector: &[f32],
        top_k: usize,
        source_kinds: Option<&[SourceKind]>,
        category: Option<&str>,
        min_similarity: Option<f32>,
    ) -> Result<Vec<Hit>>;

    /// Read-modify-write `delta` onto an entry's confidence under a per-row
    /// lock, clamping to `[0, 1]`. Returns `(new_confidence, new_usage_count)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryNotFound`] if the key is absent (spec P8).
    async fn adjust_confidence(
        &self,
        source_kind: SourceKind,
        source_id: &str,
        delta: f32,
        increment_usage: bool,
    ) -> Result<(f32, u64)>;

    /// Increment `usage_count` and bump `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryNotFound`] if the key is absent (spec P8).
    async fn bump_usage(&self, source_kind: SourceKind, source_id: &str) -> Result<u64>;

    /// Insert or replace an entry wholesale (used by the Review Gateway,
    /// spec §4.9, and by corpus bootstrap/seeding — not part of the three
    /// read/adjust/bump operations the spec enumerates for the store's
    /// steady-state contract, but required for the store to be usable at
    /// all without an external ingestion system).
    async fn upsert(&self, entry: CorpusEntry) -> Result<()>;

    /// Fetch a single entry by key, for callers (review gateway, draft
    /// generator) that need the current row rather than a search result.
    async fn get(&self, source_kind: SourceKind, source_id: &str) -> Result<CorpusEntry>;
}

struct Row {
    entry: Mutex<CorpusEntry>,
}

/// In-memory [`CorpusStore`], keyed by [`EntryKey`] with one lock per row.
///
/// A `postgres` feature (pgvector-backed, grounded on `dashflow-pgvector`)
/// is the natural production successor; it is out of scope for this crate
/// version but the trait boundary above is deliberately storage-agnostic
/// so such a backend drops in without touching callers.
#[derive(Default)]
pub struct InMemoryCorpusStore {
    rows: DashMap<EntryKey, Arc<Row>>,
}

impl InMemoryCorpusStore {
    /// Construct an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
        }
    }

    fn row(&self, source_kind: SourceKind, source_id: &str) -> Result<Arc<Row>> {
        let key = EntryKey::new(source_kind, source_id.to_string());
        self.rows
            .get(&key)
            .map(|r| Arc::clone(r.value()))
            .ok_or_else(|| Error::entry_not_found(source_kind, source_id))
    }
}

#[async_trait]
impl CorpusStore for InMemoryCorpusStore {
    async fn search(
        &self,
        query_vector: &[f32],
        top_k: usize,
        source_kinds: Option<&[SourceKind]>,
        category: Option<&str>,
        min_similarity: Option<f32>,
    ) -> Result<Vec<Hit>> {
        let category_lower = category.map(str::to_lowercase);
        let mut hits: Vec<Hit> = self
            .rows
            .iter()
            .filter_map(|entry_ref| {
                let row = entry_ref.value();
                let entry = row.entry.lock().clone();
                if let Some(kinds) = source_kinds {
                    if !kinds.contains(&entry.key.source_kind) {
                        return None;
                    }
                }
                if let Some(ref needle) = category_lower {
                    let matches = entry
                        .category
                        .as_ref()
                        .is_some_and(|c| c.to_lowercase().contains(needle.as_str()));
                    if !matches {
                        return None;
                    }
                }
                let similarity = cosine_similarity(query_vector, &entry.embedding);
                if let Some(floor) = min_similarity {
                    if similarity < floor {
                        return None;
                    }
                }
                Some(Hit {
                    entry,
                    similarity,
                    rerank_score: None,
                    final_score: None,
                    detail: None,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.entry.key.source_id.cmp(&b.entry.key.source_id))
        });
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn adjust_confidence(
        &self,
        source_kind: SourceKind,
        source_id: &str,
        delta: f32,
        increment_usage: bool,
    ) -> Result<(f32, u64)> {
        let row = self.row(source_kind, source_id)?;
        let mut entry = row.entry.lock();
        entry.confidence = (entry.confidence + delta).clamp(0.0, 1.0);
        if increment_usage {
            entry.usage_count += 1;
        }
        entry.updated_at = Utc::now();
        Ok((entry.confidence, entry.usage_count))
    }

    async fn bump_usage(&self, source_kind: SourceKind, source_id: &str) -> Result<u64> {
        let row = self.row(source_kind, source_id)?;
        let mut entry = row.entry.lock();
        entry.usage_count += 1;
        entry.updated_at = Utc::now();
        Ok(entry.usage_count)
    }

    async fn upsert(&self, entry: CorpusEntry) -> Result<()> {
        let key = entry.key.clone();
        self.rows.insert(
            key,
            Arc::new(Row {
                entry: Mutex::new(entry),
            }),
        );
        Ok(())
    }

    async fn get(&self, source_kind: SourceKind, source_id: &str) -> Result<CorpusEntry> {
        let row = self.row(source_kind, source_id)?;
        Ok(row.entry.lock().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corpus_core::model::EntryKey;

    fn sample_entry(source_id: &str, confidence: f32, embedding: Vec<f32>) -> CorpusEntry {
        CorpusEntry {
            key: EntryKey::new(SourceKind::Article, source_id),
            title: "t".into(),
            content: "c".into(),
            category: Some("Networking".into()),
            module: None,
            tags: vec![],
            embedding,
            confidence,
            usage_count: 0,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn search_orders_by_descending_similarity() {
        let store = InMemoryCorpusStore::new();
        store.upsert(sample_entry("A", 0.5, vec![1.0, 0.0])).await.unwrap();
        store.upsert(sample_entry("B", 0.5, vec![0.0, 1.0])).await.unwrap();
        let hits = store
            .search(&[1.0, 0.0], 10, None, None, None)
            .await
            .unwrap();
        assert_eq!(hits[0].entry.key.source_id, "A");
        assert_eq!(hits[1].entry.key.source_id, "B");
    }

    #[tokio::test]
    async fn search_ties_break_on_source_id_ascending() {
        let store = InMemoryCorpusStore::new();
        store.upsert(sample_entry("Z", 0.5, vec![1.0, 0.0])).await.unwrap();
        store.upsert(sample_entry("A", 0.5, vec![1.0, 0.0])).await.unwrap();
        let hits = store
            .search(&[1.0, 0.0], 10, None, None, None)
            .await
            .unwrap();
        assert_eq!(hits[0].entry.key.source_id, "A");
        assert_eq!(hits[1].entry.key.source_id, "Z");
    }

    #[tokio::test]
    async fn search_filters_by_category_case_insensitive_substring() {
        let store = InMemoryCorpusStore::new();
        store.upsert(sample_entry("A", 0.5, vec![1.0, 0.0])).await.unwrap();
        let hits = store
            .search(&[1.0, 0.0], 10, None, Some("network"), None)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        let hits = store
            .search(&[1.0, 0.0], 10, None, Some("billing"), None)
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn search_respects_min_similarity_floor() {
        let store = InMemoryCorpusStore::new();
        store.upsert(sample_entry("A", 0.5, vec![0.0, 1.0])).await.unwrap();
        let hits = store
            .search(&[1.0, 0.0], 10, None, None, Some(0.9))
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn adjust_confidence_clamps_to_unit_interval() {
        let store = InMemoryCorpusStore::new();
        store.upsert(sample_entry("A", 0.95, vec![1.0])).await.unwrap();
        let (confidence, _) = store
            .adjust_confidence(SourceKind::Article, "A", 0.5, false)
            .await
            .unwrap();
        assert_eq!(confidence, 1.0);
        let (confidence, _) = store
            .adjust_confidence(SourceKind::Article, "A", -5.0, false)
            .await
            .unwrap();
        assert_eq!(confidence, 0.0);
    }

    #[tokio::test]
    async fn adjust_confidence_round_trip_restores_original() {
        let store = InMemoryCorpusStore::new();
        store.upsert(sample_entry("A", 0.5, vec![1.0])).await.unwrap();
        store
            .adjust_confidence(SourceKind::Article, "A", 0.1, false)
            .await
            .unwrap();
        let (confidence, _) = store
            .adjust_confidence(SourceKind::Article, "A", -0.1, false)
            .await
            .unwrap();
        assert!((confidence - 0.5).abs() < 1e-6);
    }

    #[tokio::test]
    async fn adjust_confidence_missing_key_errors_without_inserting() {
        let store = InMemoryCorpusStore::new();
        let result = store
            .adjust_confidence(SourceKind::Article, "GHOST", 0.1, false)
            .await;
        assert!(matches!(result, Err(Error::EntryNotFound { .. })));
        assert!(store.get(SourceKind::Article, "GHOST").await.is_err());
    }

    #[tokio::test]
    async fn bump_usage_missing_key_errors() {
        let store = InMemoryCorpusStore::new();
        let result = store.bump_usage(SourceKind::Article, "GHOST").await;
        assert!(matches!(result, Err(Error::EntryNotFound { .. })));
    }

    #[tokio::test]
    async fn bump_usage_increments_count() {
        let store = InMemoryCorpusStore::new();
        store.upsert(sample_entry("A", 0.5, vec![1.0])).await.unwrap();
        let count = store.bump_usage(SourceKind::Article, "A").await.unwrap();
        assert_eq!(count, 1);
        let count = store.bump_usage(SourceKind::Article, "A").await.unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn concurrent_confidence_updates_on_the_same_row_do_not_lose_deltas() {
        let store = Arc::new(InMemoryCorpusStore::new());
        store.upsert(sample_entry("A", 0.5, vec![1.0])).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .adjust_confidence(SourceKind::Article, "A", 0.01, false)
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        let entry = store.get(SourceKind::Article, "A").await.unwrap();
        assert!((entry.confidence - 0.7).abs() < 1e-4);
    }

    #[tokio::test]
    async fn search_restricts_by_source_kind() {
        let store = InMemoryCorpusStore::new();
        store.upsert(sample_entry("A", 0.5, vec![1.0])).await.unwrap();
        let mut script = sample_entry("B", 0.5, vec![1.0]);
        script.key = EntryKey::new(SourceKind::Script, "B");
        store.upsert(script).await.unwrap();

        let hits = store
            .search(&[1.0], 10, Some(&[SourceKind::Script]), None, None)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entry.key.source_kind, SourceKind::Script);
    }
}
