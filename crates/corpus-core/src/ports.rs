//! Narrow external-provider interfaces the pipeline depends on (spec §4.2).
//!
//! Concrete implementations (OpenAI embeddings, an Anthropic-style chat
//! model, a cross-encoder reranker, mocks for tests) live in the sibling
//! `corpus-providers` crate. Keeping the traits here, object-safe and free
//! of any concrete SDK type, mirrors how `dashflow::core` defines
//! `Embeddings`/`ChatModel`/`DocumentCompressor` once and lets every
//! provider crate (`dashflow-openai`, `dashflow-anthropic`,
//! `dashflow-document-compressors`, ...) implement them independently.

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Token accounting for a single structured-generation call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt.
    pub tokens_in: u64,
    /// Tokens produced by the completion.
    pub tokens_out: u64,
}

impl TokenUsage {
    /// Combine two usages, summing each side.
    #[must_use]
    pub fn combine(self, other: TokenUsage) -> TokenUsage {
        TokenUsage {
            tokens_in: self.tokens_in + other.tokens_in,
            tokens_out: self.tokens_out + other.tokens_out,
        }
    }
}

/// A single role/content pair passed to a [`GenerationPort`].
#[derive(Debug, Clone)]
pub struct GenerationMessage {
    /// `"system"`, `"user"`, or `"assistant"`.
    pub role: &'static str,
    /// Message text.
    pub content: String,
}

impl GenerationMessage {
    /// Construct a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    /// Construct a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

/// Batched embedding of raw text into the shared vector space (spec §4.2).
///
/// A single-text-per-call implementation is a design violation: every
/// caller in `corpus-pipeline` embeds all query variants in one batch.
#[async_trait]
pub trait EmbeddingPort: Send + Sync {
    /// Embed a batch of texts, returning one vector per input in order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Provider`] on transport/quota failure.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Structured chat-completion generation (spec §4.2).
///
/// Returns a `serde_json::Value` rather than a generic type so the trait
/// stays object-safe (callers hold `Arc<dyn GenerationPort>`); callers
/// deserialize the value into the schema-specific struct they asked for.
#[async_trait]
pub trait GenerationPort: Send + Sync {
    /// Generate a value matching `schema`, retrying internally on schema
    /// violation up to the implementation's configured attempt count.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Provider`] on transport/quota failure,
    /// or [`crate::error::Error::SchemaValidation`] if every retry still
    /// failed to validate.
    async fn generate_structured(
        &self,
        messages: &[GenerationMessage],
        schema: &Value,
        temperature: f32,
    ) -> Result<(Value, TokenUsage)>;
}

/// A candidate document offered to a [`RerankPort`].
#[derive(Debug, Clone)]
pub struct RerankCandidate {
    /// Index into the caller's original candidate list; reranked output
    /// references candidates by this index so the caller can reorder its
    /// own richer structures.
    pub index: usize,
    /// Text to score against the query.
    pub text: String,
}

/// Provider-scored relevance rerank (spec §4.2).
///
/// Scores are provider-specific and monotonic only within a single call;
/// they are never compared across calls. If unavailable, callers fall back
/// to similarity order (spec §4.3 node 3).
#[async_trait]
pub trait RerankPort: Send + Sync {
    /// Score and truncate `candidates` to the top `top_k`, highest first.
    ///
    /// Ties are not broken here; callers are responsible for a deterministic
    /// tie-break (spec: ascending `source_id`) when scores are equal.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Provider`] on transport/quota failure.
    async fn rerank(
        &self,
        query: &str,
        candidates: &[RerankCandidate],
        top_k: usize,
    ) -> Result<Vec<(usize, f32)>>;
}

/// Read access to closed cases, used by `learn(case_id)` (spec §6).
///
/// Conversation/case storage itself is out of this system's scope (spec
/// §1); this port is the narrow read interface the self-learning
/// coordinator depends on, the same way the pipeline depends only on the
/// three provider ports above and never on a concrete case database.
#[async_trait]
pub trait CaseRepository: Send + Sync {
    /// Load a closed case by id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::CaseNotFound`] if the id is unknown.
    async fn load(&self, case_id: &str) -> Result<crate::model::ResolvedCase>;

    /// Persist a just-closed case, making it loadable by `load`.
    ///
    /// `close_case` (spec §6) is the boundary at which this system learns
    /// of a closure; it owns assigning the case its id and handing the
    /// record to this port, it does not own the case's long-term storage.
    ///
    /// # Errors
    ///
    /// Returns an implementation-specific error if the record cannot be
    /// written.
    async fn close(&self, case: crate::model::ResolvedCase) -> Result<()>;
}

/// Read access to conversation transcripts, used by the Draft Generator
/// (spec §4.8) to ground a synthesized article's CREATED_FROM/Conversation
/// provenance record. Conversation storage itself is out of this system's
/// scope (spec §1); this is the narrow read interface the draft generator
/// depends on.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Load a conversation's full transcript text by id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Other`] if the id is unknown.
    async fn transcript(&self, conversation_id: &str) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_usage_combines_additively() {
        let a = TokenUsage {
            tokens_in: 10,
            tokens_out: 5,
        };
        let b = TokenUsage {
            tokens_in: 3,
            tokens_out: 7,
        };
        let combined = a.combine(b);
        assert_eq!(combined.tokens_in, 13);
        assert_eq!(combined.tokens_out, 12);
    }

    #[test]
    fn generation_message_constructors_set_role() {
        let sys = GenerationMessage::system("be terse");
        let user = GenerationMessage::user("hello");
        assert_eq!(sys.role, "system");
        assert_eq!(user.role, "user");
    }
}
