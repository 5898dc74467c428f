//! Learning Events (spec §3, §4.9): strict `pending -> finalized` two-state
//! machine, no reopening (spec P6).

use async_trait::async_trait;
use corpus_core::error::{Error, Result};
use corpus_core::model::{FinalStatus, LearningEvent, ReviewerRole};
use dashmap::DashMap;
use parking_lot::Mutex;

/// Storage for self-learning decisions pending (or past) human review.
#[async_trait]
pub trait LearningEventStore: Send + Sync {
    /// Insert a new event. `CONFIRMED` events may already carry a final
    /// status (auto-approved by `SYSTEM`, spec §4.7); `GAP`/`CONTRADICTION`
    /// events must be inserted with `final_status = None`.
    async fn insert(&self, event: LearningEvent) -> Result<()>;

    /// Fetch an event by id.
    async fn get(&self, event_id: &str) -> Result<LearningEvent>;

    /// Finalize a pending event, always recording a reason alongside the
    /// decision (spec §4.9: "Always set the event's `final_status`,
    /// `reviewer_role`, and reason").
    ///
    /// # Errors
    ///
    /// Returns [`Error::EventNotFound`] if the id is unknown, or
    /// [`Error::AlreadyReviewed`] if `final_status` is already set (spec P6).
    async fn finalize(
        &self,
        event_id: &str,
        final_status: FinalStatus,
        reviewer_role: ReviewerRole,
        reason: Option<String>,
    ) -> Result<LearningEvent>;
}

/// In-memory [`LearningEventStore`].
#[derive(Default)]
pub struct InMemoryLearningEventStore {
    rows: DashMap<String, Mutex<LearningEvent>>,
}

impl InMemoryLearningEventStore {
    /// Construct an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
        }
    }
}

#[async_trait]
impl LearningEventStore for InMemoryLearningEventStore {
    async fn insert(&self, event: LearningEvent) -> Result<()> {
        self.rows.insert(event.event_id.clone(), Mutex::new(event));
        Ok(())
    }

    async fn get(&self, event_id: &str) -> Result<LearningEvent> {
        self.rows
            .get(event_id)
            .map(|e| e.lock().clone())
            .ok_or_else(|| Error::EventNotFound(event_id.to_string()))
    }

    async fn finalize(
        &self,
        event_id: &str,
        final_status: FinalStatus,
        reviewer_role: ReviewerRole,
        reason: Option<String>,
    ) -> Result<LearningEvent> {
        let entry = self
            .rows
            .get(event_id)
            .ok_or_else(|| Error::EventNotFound(event_id.to_string()))?;
        let mut event = entry.value().lock();
        if event.final_status.is_some() {
            return Err(Error::AlreadyReviewed(event_id.to_string()));
        }
        event.final_status = Some(final_status);
        event.reviewer_role = reviewer_role;
        event.review_reason = reason;
        Ok(event.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corpus_core::model::EventKind;

    fn pending(event_id: &str) -> LearningEvent {
        LearningEvent {
            event_id: event_id.to_string(),
            triggering_case_id: "case-1".into(),
            event_kind: EventKind::Gap,
            detected_gap_text: "no matching article".into(),
            proposed_article_id: Some("ART-SYN-1".into()),
            flagged_article_id: None,
            draft_summary: "draft summary".into(),
            final_status: None,
            reviewer_role: ReviewerRole::Tier3,
            review_reason: None,
            timestamp: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn finalize_sets_final_status_and_reason() {
        let store = InMemoryLearningEventStore::new();
        store.insert(pending("evt-1")).await.unwrap();
        let event = store
            .finalize("evt-1", FinalStatus::Approved, ReviewerRole::Tier3, Some("matches existing runbook".into()))
            .await
            .unwrap();
        assert_eq!(event.final_status, Some(FinalStatus::Approved));
        assert_eq!(event.review_reason.as_deref(), Some("matches existing runbook"));
    }

    #[tokio::test]
    async fn finalize_twice_fails_already_reviewed() {
        let store = InMemoryLearningEventStore::new();
        store.insert(pending("evt-1")).await.unwrap();
        store
            .finalize("evt-1", FinalStatus::Approved, ReviewerRole::Tier3, None)
            .await
            .unwrap();
        let second = store
            .finalize("evt-1", FinalStatus::Rejected, ReviewerRole::Ops, None)
            .await;
        assert!(matches!(second, Err(Error::AlreadyReviewed(_))));
    }

    #[tokio::test]
    async fn finalize_unknown_event_errors() {
        let store = InMemoryLearningEventStore::new();
        let result = store
            .finalize("ghost", FinalStatus::Approved, ReviewerRole::Tier3, None)
            .await;
        assert!(matches!(result, Err(Error::EventNotFound(_))));
    }
}
