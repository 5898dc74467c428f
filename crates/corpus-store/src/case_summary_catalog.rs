//! Subject/resolution/root-cause lookup used by the enrichment resolver for
//! `CASE_RESOLUTION` hits (spec §4.4). Distinct from
//! [`crate::case_repository::InMemoryCaseRepository`], which backs
//! `learn(case_id)`'s single-case, fatal-on-miss load: a corpus entry of
//! kind `CASE_RESOLUTION` may reference a case that has long since been
//! folded into the corpus, so this is a many-row batched read, not a
//! closed-case-of-record lookup.

use async_trait::async_trait;
use corpus_core::error::Result;
use dashmap::DashMap;
use std::collections::HashMap;

/// The fields an enriched `CASE_RESOLUTION` hit attaches (spec §4.4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseSummary {
    /// Case subject line.
    pub subject: String,
    /// How the case was resolved.
    pub resolution: String,
    /// Root cause, if recorded.
    pub root_cause: Option<String>,
}

/// Batched case-summary lookup.
#[async_trait]
pub trait CaseSummaryCatalog: Send + Sync {
    /// Fetch a summary for every id in `case_ids` that exists, keyed by id.
    async fn summaries_for(&self, case_ids: &[String]) -> Result<HashMap<String, CaseSummary>>;
}

/// In-memory [`CaseSummaryCatalog`], seeded by ingestion/tests.
#[derive(Default)]
pub struct InMemoryCaseSummaryCatalog {
    rows: DashMap<String, CaseSummary>,
}

impl InMemoryCaseSummaryCatalog {
    /// Construct an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self { rows: DashMap::new() }
    }

    /// Seed a case's summary.
    pub fn insert(&self, case_id: impl Into<String>, summary: CaseSummary) {
        self.rows.insert(case_id.into(), summary);
    }
}

#[async_trait]
impl CaseSummaryCatalog for InMemoryCaseSummaryCatalog {
    async fn summaries_for(&self, case_ids: &[String]) -> Result<HashMap<String, CaseSummary>> {
        Ok(case_ids
            .iter()
            .filter_map(|id| self.rows.get(id).map(|v| (id.clone(), v.value().clone())))
            .collect())
    }
}
