//! The Retrieval Log (spec §4.3 node 8, §5): append-only, mutable only for
//! post-hoc `case_id`/`outcome` stamping, both monotonic `null -> value`
//! (spec P5).

use async_trait::async_trait;
use chrono::Utc;
use corpus_core::error::Result;
use corpus_core::model::{AttemptOutcome, RetrievalAttemptLog, SourceKind};
use dashmap::DashMap;
use parking_lot::Mutex;
use uuid::Uuid;

/// Append-only retrieval audit log with monotonic post-hoc stamping.
#[async_trait]
pub trait RetrievalLog: Send + Sync {
    /// Append one row per evidence hit surfaced during live retrieval.
    /// `case_id` starts `null`; it is filled in later by [`Self::link_to_case`].
    async fn append(&self, row: NewAttemptLogRow) -> Result<String>;

    /// Link every row with the given `conversation_id` and a still-null
    /// `case_id` to `case_id`. Returns the linked row ids.
    async fn link_to_case(&self, conversation_id: &str, case_id: &str) -> Result<Vec<String>>;

    /// Stamp `outcome` onto the given rows. A row whose `outcome` is already
    /// set keeps its existing value (P5: `null -> value` only, no regression).
    async fn stamp_outcomes(&self, log_ids: &[String], outcome: AttemptOutcome) -> Result<()>;

    /// Fetch every row belonging to `case_id`.
    async fn rows_for_case(&self, case_id: &str) -> Result<Vec<RetrievalAttemptLog>>;
}

/// Fields supplied when appending a new retrieval log row; `log_id` and
/// `created_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewAttemptLogRow {
    /// Owning conversation, set for live-retrieval rows.
    pub conversation_id: Option<String>,
    /// Which retry attempt produced this row.
    pub attempt_no: u32,
    /// Original query text.
    pub query_text: String,
    /// Source kind of the hit this row logs.
    pub source_kind: Option<SourceKind>,
    /// Source id of the hit this row logs.
    pub source_id: Option<String>,
    /// Similarity score of the hit.
    pub similarity_score: Option<f32>,
    /// Owning execution record.
    pub execution_id: String,
}

/// In-memory [`RetrievalLog`] backed by per-row locks, mirroring
/// [`crate::entry_store::InMemoryCorpusStore`]'s per-row locking so
/// concurrent closures stamping different rows never contend.
#[derive(Default)]
pub struct InMemoryRetrievalLog {
    rows: DashMap<String, Mutex<RetrievalAttemptLog>>,
}

impl InMemoryRetrievalLog {
    /// Construct an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
        }
    }
}

#[async_trait]
impl RetrievalLog for InMemoryRetrievalLog {
    async fn append(&self, row: NewAttemptLogRow) -> Result<String> {
        let log_id = Uuid::new_v4().to_string();
        let record = RetrievalAttemptLog {
            log_id: log_id.clone(),
            case_id: None,
            conversation_id: row.conversation_id,
            attempt_no: row.attempt_no,
            query_text: row.query_text,
            source_kind: row.source_kind,
            source_id: row.source_id,
            similarity_score: row.similarity_score,
            outcome: None,
            execution_id: row.execution_id,
            created_at: Utc::now(),
        };
        self.rows.insert(log_id.clone(), Mutex::new(record));
        Ok(log_id)
    }

    async fn link_to_case(&self, conversation_id: &str, case_id: &str) -> Result<Vec<String>> {
        let mut linked = Vec::new();
        for entry in self.rows.iter() {
            let mut row = entry.value().lock();
            if row.conversation_id.as_deref() == Some(conversation_id) && row.case_id.is_none() {
                row.case_id = Some(case_id.to_string());
                linked.push(row.log_id.clone());
            }
        }
        Ok(linked)
    }

    async fn stamp_outcomes(&self, log_ids: &[String], outcome: AttemptOutcome) -> Result<()> {
        for log_id in log_ids {
            if let Some(entry) = self.rows.get(log_id) {
                let mut row = entry.value().lock();
                if row.outcome.is_none() {
                    row.outcome = Some(outcome);
                }
            }
        }
        Ok(())
    }

    async fn rows_for_case(&self, case_id: &str) -> Result<Vec<RetrievalAttemptLog>> {
        Ok(self
            .rows
            .iter()
            .filter(|entry| entry.value().lock().case_id.as_deref() == Some(case_id))
            .map(|entry| entry.value().lock().clone())
            .collect())
    }
}
