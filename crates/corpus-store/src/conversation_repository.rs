//! An in-memory [`ConversationRepository`](corpus_core::ConversationRepository),
//! used by tests and demo wiring. Conversation storage proper is out of this
//! system's scope (spec §1); production deployments supply their own
//! implementation of the port against whatever conversation/ticketing
//! system owns transcripts.

use async_trait::async_trait;
use corpus_core::error::{Error, Result};
use corpus_core::ports::ConversationRepository;
use dashmap::DashMap;

/// In-memory transcript store, seeded by the caller.
#[derive(Default)]
pub struct InMemoryConversationRepository {
    transcripts: DashMap<String, String>,
}

impl InMemoryConversationRepository {
    /// Construct an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            transcripts: DashMap::new(),
        }
    }

    /// Seed a conversation's transcript, as an ingestion step outside this
    /// crate would.
    pub fn insert(&self, conversation_id: impl Into<String>, transcript: impl Into<String>) {
        self.transcripts.insert(conversation_id.into(), transcript.into());
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn transcript(&self, conversation_id: &str) -> Result<String> {
        self.transcripts
            .get(conversation_id)
            .map(|t| t.value().clone())
            .ok_or_else(|| Error::other(format!("conversation not found: {conversation_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn transcript_returns_seeded_text() {
        let repo = InMemoryConversationRepository::new();
        repo.insert("conv-1", "customer: my vpn is down\nagent: rotate your cert");
        let text = repo.transcript("conv-1").await.unwrap();
        assert!(text.contains("rotate your cert"));
    }

    #[tokio::test]
    async fn transcript_for_unknown_conversation_fails() {
        let repo = InMemoryConversationRepository::new();
        assert!(repo.transcript("ghost").await.is_err());
    }
}
