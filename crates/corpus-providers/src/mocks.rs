//! Mock ports for pipeline/learning tests, grounded on `dashflow-chains`'s
//! `MockLLM`/`MockEmbeddings` (from `retrieval_qa.rs`'s test module) and
//! `dashflow-document-compressors`'s `FixedScoreEncoder`/`MockCrossEncoder`
//! (from `cross_encoder_rerank.rs`'s test module). Gated behind the
//! `testing` feature so downstream crates can depend on this crate in
//! `dev-dependencies` without pulling mocks into production builds.

use async_trait::async_trait;
use corpus_core::error::{Error, Result};
use corpus_core::ports::{EmbeddingPort, GenerationMessage, GenerationPort, RerankCandidate, RerankPort, TokenUsage};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Embeds every text deterministically by hashing it into a small fixed
/// vector, so cosine similarity is stable across a test run without
/// depending on any real embedding model.
pub struct MockEmbeddingPort {
    dim: usize,
}

impl MockEmbeddingPort {
    /// Construct a mock that emits `dim`-dimensional vectors.
    #[must_use]
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dim];
        for (i, byte) in text.bytes().enumerate() {
            vector[i % self.dim] += f32::from(byte);
        }
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingPort for MockEmbeddingPort {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

/// Returns a fixed, pre-scripted sequence of responses, one per call,
/// mirroring `MockLLM`'s queue-of-responses approach in `retrieval_qa.rs`.
pub struct ScriptedGenerationPort {
    responses: Mutex<Vec<Value>>,
    call_count: AtomicUsize,
}

impl ScriptedGenerationPort {
    /// Construct a port that returns `responses` in order, one per call.
    #[must_use]
    pub fn new(responses: Vec<Value>) -> Self {
        Self {
            responses: Mutex::new(responses),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationPort for ScriptedGenerationPort {
    async fn generate_structured(
        &self,
        _messages: &[GenerationMessage],
        _schema: &Value,
        _temperature: f32,
    ) -> Result<(Value, TokenUsage)> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let mut responses = self.responses.lock().unwrap_or_else(|e| e.into_inner());
        if responses.is_empty() {
            return Err(Error::provider("generation", "scripted responses exhausted"));
        }
        Ok((responses.remove(0), TokenUsage::default()))
    }
}

/// Scores every candidate by the fraction of query words it contains,
/// mirroring `QueryMatchEncoder` in `cross_encoder_rerank.rs`'s test module.
pub struct QueryMatchRerankPort;

#[async_trait]
impl RerankPort for QueryMatchRerankPort {
    async fn rerank(
        &self,
        query: &str,
        candidates: &[RerankCandidate],
        top_k: usize,
    ) -> Result<Vec<(usize, f32)>> {
        let query_words: Vec<&str> = query.split_whitespace().collect();
        let mut scored: Vec<(usize, f32)> = candidates
            .iter()
            .map(|candidate| {
                let text_lower = candidate.text.to_lowercase();
                let matches = query_words
                    .iter()
                    .filter(|w| text_lower.contains(&w.to_lowercase()))
                    .count();
                #[allow(clippy::cast_precision_loss)]
                let score = if query_words.is_empty() {
                    0.0
                } else {
                    matches as f32 / query_words.len() as f32
                };
                (candidate.index, score)
            })
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(top_k);
        Ok(scored)
    }
}
