//! An in-memory [`CaseRepository`](corpus_core::CaseRepository), used by
//! tests and demo wiring. Conversation/case storage proper is out of this
//! system's scope (spec §1); production deployments supply their own
//! implementation of the port against whatever ticketing system owns cases.

use async_trait::async_trait;
use corpus_core::error::{Error, Result};
use corpus_core::model::ResolvedCase;
use corpus_core::ports::CaseRepository;
use dashmap::DashMap;

/// In-memory case store, seeded by the caller.
#[derive(Default)]
pub struct InMemoryCaseRepository {
    cases: DashMap<String, ResolvedCase>,
}

impl InMemoryCaseRepository {
    /// Construct an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cases: DashMap::new(),
        }
    }

    /// Seed a closed case, as an ingestion step outside this crate would.
    pub fn insert(&self, case: ResolvedCase) {
        self.cases.insert(case.case_id.clone(), case);
    }
}

#[async_trait]
impl CaseRepository for InMemoryCaseRepository {
    async fn load(&self, case_id: &str) -> Result<ResolvedCase> {
        self.cases
            .get(case_id)
            .map(|c| c.value().clone())
            .ok_or_else(|| Error::CaseNotFound(case_id.to_string()))
    }

    async fn close(&self, case: ResolvedCase) -> Result<()> {
        self.insert(case);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn case(case_id: &str) -> ResolvedCase {
        ResolvedCase {
            case_id: case_id.to_string(),
            conversation_id: "conv-1".into(),
            subject: "VPN handshake fails".into(),
            description: "client can't connect".into(),
            resolution: "rotate the client cert".into(),
            root_cause: Some("expired cert".into()),
            category: Some("Networking".into()),
            tags: vec![],
            script_id: None,
            resolved: true,
            closed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn load_returns_seeded_case() {
        let repo = InMemoryCaseRepository::new();
        repo.insert(case("case-1"));
        let loaded = repo.load("case-1").await.unwrap();
        assert_eq!(loaded.subject, "VPN handshake fails");
    }

    #[tokio::test]
    async fn load_unknown_case_fails() {
        let repo = InMemoryCaseRepository::new();
        assert!(matches!(repo.load("ghost").await, Err(Error::CaseNotFound(_))));
    }

    #[tokio::test]
    async fn close_makes_a_case_loadable() {
        let repo = InMemoryCaseRepository::new();
        CaseRepository::close(&repo, case("case-2")).await.unwrap();
        let loaded = repo.load("case-2").await.unwrap();
        assert_eq!(loaded.case_id, "case-2");
    }
}
