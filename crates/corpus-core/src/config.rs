//! Flat, construction-time configuration (spec §6, §9).
//!
//! Mirrors the `dashflow` convention of threading a plain config struct
//! through constructors rather than reading from process-global state.

use serde::{Deserialize, Serialize};

/// Weights for the §4.5 final-score blend. Must sum to (approximately) 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Weight on raw vector similarity.
    pub similarity: f32,
    /// Weight on the (normalized) rerank score.
    pub rerank: f32,
    /// Weight on the entry's stored confidence.
    pub confidence: f32,
    /// Weight on the freshness term.
    pub freshness: f32,
    /// Weight on the usage-derived learning score.
    pub learning: f32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            similarity: 0.35,
            rerank: 0.25,
            confidence: 0.2,
            freshness: 0.1,
            learning: 0.1,
        }
    }
}

impl ScoreWeights {
    /// Sum of all weights; callers should assert this is close to 1.0.
    #[must_use]
    pub fn sum(&self) -> f32 {
        self.similarity + self.rerank + self.confidence + self.freshness + self.learning
    }
}

/// All tunable knobs for the corpus engine (spec §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Embedding dimension `D`; fixed for the life of a corpus.
    pub embedding_dim: usize,
    /// Default `top_k` for `suggest()` calls that don't override it.
    pub default_top_k: usize,
    /// Maximum candidates retained during `retrieve` before rerank/truncate.
    pub max_candidates: usize,
    /// Below this similarity, the gap classifier always returns `NEW` (spec P7).
    pub gap_similarity_threshold: f32,
    /// Confidence delta applied on a `RESOLVED` outcome.
    pub confidence_delta_resolved: f32,
    /// Confidence delta applied on a `PARTIAL` outcome.
    pub confidence_delta_partial: f32,
    /// Confidence delta applied on an `UNHELPFUL` outcome.
    pub confidence_delta_unhelpful: f32,
    /// Confidence delta applied on a `CONFIRMED` gap verdict (`SAME`).
    pub confidence_delta_confirmed: f32,
    /// Age, in days, past which the freshness term saturates to zero.
    pub freshness_max_age_days: f32,
    /// Weights for the final-score blend.
    pub score_weights: ScoreWeights,
    /// Whether the rerank port is configured and should be invoked.
    pub reranker_enabled: bool,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            embedding_dim: 1536,
            default_top_k: 10,
            max_candidates: 40,
            gap_similarity_threshold: 0.75,
            confidence_delta_resolved: 0.10,
            confidence_delta_partial: 0.02,
            confidence_delta_unhelpful: -0.05,
            confidence_delta_confirmed: 0.05,
            freshness_max_age_days: 365.0,
            score_weights: ScoreWeights::default(),
            reranker_enabled: true,
        }
    }
}

impl CorpusConfig {
    /// Assert this config's `embedding_dim` matches the dimension a store
    /// reports, per spec §9's note that the correct dimension is whatever
    /// the deployed corpus uses, not a hardcoded constant.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Config`] on mismatch.
    pub fn assert_embedding_dim(&self, store_dim: usize) -> crate::error::Result<()> {
        if self.embedding_dim != store_dim {
            return Err(crate::error::Error::config(format!(
                "configured embedding_dim ({}) does not match store dimension ({})",
                self.embedding_dim, store_dim
            )));
        }
        Ok(())
    }
}
