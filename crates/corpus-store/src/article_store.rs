//! Articles and their Provenance records (spec §3, §4.8, §4.9).

use async_trait::async_trait;
use chrono::Utc;
use corpus_core::error::{Error, Result};
use corpus_core::model::{Article, ArticleStatus, Provenance};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Article lifecycle storage: drafts, active articles, archival.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Insert a new article (draft or seed).
    async fn insert(&self, article: Article) -> Result<()>;

    /// Fetch an article by id.
    async fn get(&self, article_id: &str) -> Result<Article>;

    /// Transition an article's status. The Review Gateway is the only
    /// caller that mutates status after initial drafting (spec §2).
    async fn set_status(&self, article_id: &str, status: ArticleStatus) -> Result<()>;

    /// Replace an article's title/body in place (spec §4.9, `CONTRADICTS`
    /// approval replaces the flagged article's content with the draft's).
    async fn replace_body(&self, article_id: &str, title: String, body: String) -> Result<()>;

    /// Record provenance links for an article (spec §4.8, three per draft).
    async fn add_provenance(&self, records: Vec<Provenance>) -> Result<()>;

    /// Fetch every provenance record for an article, used both by the
    /// enrichment resolver (spec §4.4) and by provenance-completeness
    /// checks (spec P4).
    async fn provenance_for(&self, article_id: &str) -> Result<Vec<Provenance>>;

    /// Batched variant of [`Self::provenance_for`] over many articles at
    /// once, keyed by article id. The enrichment resolver (spec §4.4) calls
    /// this rather than looping `provenance_for` per hit; issuing one query
    /// per hit is non-conforming.
    async fn provenance_for_many(&self, article_ids: &[String]) -> Result<HashMap<String, Vec<Provenance>>>;
}

/// In-memory [`ArticleStore`].
#[derive(Default)]
pub struct InMemoryArticleStore {
    articles: DashMap<String, Mutex<Article>>,
    provenance: DashMap<String, Mutex<Vec<Provenance>>>,
}

impl InMemoryArticleStore {
    /// Construct an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            articles: DashMap::new(),
            provenance: DashMap::new(),
        }
    }
}

#[async_trait]
impl ArticleStore for InMemoryArticleStore {
    async fn insert(&self, article: Article) -> Result<()> {
        self.articles
            .insert(article.article_id.clone(), Mutex::new(article));
        Ok(())
    }

    async fn get(&self, article_id: &str) -> Result<Article> {
        self.articles
            .get(article_id)
            .map(|a| a.lock().clone())
            .ok_or_else(|| Error::other(format!("article not found: {article_id}")))
    }

    async fn set_status(&self, article_id: &str, status: ArticleStatus) -> Result<()> {
        let entry = self
            .articles
            .get(article_id)
            .ok_or_else(|| Error::other(format!("article not found: {article_id}")))?;
        let mut article = entry.value().lock();
        article.status = status;
        article.updated_at = Utc::now();
        Ok(())
    }

    async fn replace_body(&self, article_id: &str, title: String, body: String) -> Result<()> {
        let entry = self
            .articles
            .get(article_id)
            .ok_or_else(|| Error::other(format!("article not found: {article_id}")))?;
        let mut article = entry.value().lock();
        article.title = title;
        article.body = body;
        article.updated_at = Utc::now();
        Ok(())
    }

    async fn add_provenance(&self, records: Vec<Provenance>) -> Result<()> {
        for record in records {
            self.provenance
                .entry(record.article_id.clone())
                .or_default()
                .lock()
                .push(record);
        }
        Ok(())
    }

    async fn provenance_for(&self, article_id: &str) -> Result<Vec<Provenance>> {
        Ok(self
            .provenance
            .get(article_id)
            .map(|v| v.lock().clone())
            .unwrap_or_default())
    }

    async fn provenance_for_many(&self, article_ids: &[String]) -> Result<HashMap<String, Vec<Provenance>>> {
        Ok(article_ids
            .iter()
            .filter_map(|id| self.provenance.get(id).map(|v| (id.clone(), v.lock().clone())))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corpus_core::model::{ProvenanceSourceKind, Relationship};

    fn draft(article_id: &str) -> Article {
        Article {
            article_id: article_id.to_string(),
            title: "VPN handshake failures".into(),
            body: "...".into(),
            tags: vec![],
            module: None,
            category: None,
            status: ArticleStatus::Draft,
            origin: corpus_core::model::ArticleOrigin::Synthesized,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn provenance(article_id: &str, kind: ProvenanceSourceKind, relationship: Relationship) -> Provenance {
        Provenance {
            article_id: article_id.to_string(),
            source_kind: kind,
            source_id: "SRC-1".into(),
            relationship,
            evidence_snippet: "snippet".into(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn set_status_transitions_draft_to_active() {
        let store = InMemoryArticleStore::new();
        store.insert(draft("ART-SYN-1")).await.unwrap();
        store
            .set_status("ART-SYN-1", ArticleStatus::Active)
            .await
            .unwrap();
        let article = store.get("ART-SYN-1").await.unwrap();
        assert_eq!(article.status, ArticleStatus::Active);
    }

    #[tokio::test]
    async fn replace_body_updates_title_and_body() {
        let store = InMemoryArticleStore::new();
        store.insert(draft("ART-SYN-1")).await.unwrap();
        store
            .replace_body("ART-SYN-1", "new title".into(), "new body".into())
            .await
            .unwrap();
        let article = store.get("ART-SYN-1").await.unwrap();
        assert_eq!(article.title, "new title");
        assert_eq!(article.body, "new body");
    }

    #[tokio::test]
    async fn provenance_accumulates_three_records_spanning_relationship_targets() {
        let store = InMemoryArticleStore::new();
        store.insert(draft("ART-SYN-1")).await.unwrap();
        store
            .add_provenance(vec![
                provenance("ART-SYN-1", ProvenanceSourceKind::Case, Relationship::CreatedFrom),
                provenance(
                    "ART-SYN-1",
                    ProvenanceSourceKind::Conversation,
                    Relationship::CreatedFrom,
                ),
                provenance("ART-SYN-1", ProvenanceSourceKind::Script, Relationship::References),
            ])
            .await
            .unwrap();
        let records = store.provenance_for("ART-SYN-1").await.unwrap();
        assert_eq!(records.len(), 3);
    }

    #[tokio::test]
    async fn provenance_for_many_batches_across_articles_in_one_call() {
        let store = InMemoryArticleStore::new();
        store.insert(draft("ART-SYN-1")).await.unwrap();
        store.insert(draft("ART-SYN-2")).await.unwrap();
        store
            .add_provenance(vec![provenance(
                "ART-SYN-1",
                ProvenanceSourceKind::Case,
                Relationship::CreatedFrom,
            )])
            .await
            .unwrap();
        store
            .add_provenance(vec![provenance(
                "ART-SYN-2",
                ProvenanceSourceKind::Script,
                Relationship::References,
            )])
            .await
            .unwrap();

        let batched = store
            .provenance_for_many(&["ART-SYN-1".to_string(), "ART-SYN-2".to_string(), "ART-SYN-GHOST".to_string()])
            .await
            .unwrap();
        assert_eq!(batched.len(), 2);
        assert_eq!(batched["ART-SYN-1"].len(), 1);
        assert_eq!(batched["ART-SYN-2"].len(), 1);
    }

    #[tokio::test]
    async fn unknown_article_errors_on_mutation() {
        let store = InMemoryArticleStore::new();
        assert!(store.get("GHOST").await.is_err());
        assert!(store.set_status("GHOST", ArticleStatus::Active).await.is_err());
    }
}
