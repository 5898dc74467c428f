//! A [`RerankPort`] backed by a hosted cross-encoder scoring endpoint,
//! grounded on `dashflow-document-compressors`'s `CrossEncoderRerank`: pair
//! the query with each candidate's text, score, sort descending, truncate
//! to `top_k`, tie-break deterministically rather than relying on an
//! unstable sort.

use async_trait::async_trait;
use corpus_core::error::{Error, Result};
use corpus_core::ports::{RerankCandidate, RerankPort};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Serialize)]
struct ScoreRequest<'a> {
    query: &'a str,
    documents: Vec<&'a str>,
}

#[derive(Deserialize)]
struct ScoreResponse {
    scores: Vec<f32>,
}

/// Calls a hosted cross-encoder endpoint (e.g. a self-hosted reranker
/// service) that accepts `{query, documents}` and returns `{scores}` in
/// the same order as `documents`.
pub struct HttpRerankPort {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRerankPort {
    /// Construct a new port pointed at `endpoint`.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl RerankPort for HttpRerankPort {
    async fn rerank(
        &self,
        query: &str,
        candidates: &[RerankCandidate],
        top_k: usize,
    ) -> Result<Vec<(usize, f32)>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let request = ScoreRequest {
            query,
            documents: candidates.iter().map(|c| c.text.as_str()).collect(),
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::provider("rerank", e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::provider("rerank", e.to_string()))?
            .json::<ScoreResponse>()
            .await
            .map_err(|e| Error::provider("rerank", e.to_string()))?;

        if response.scores.len() != candidates.len() {
            return Err(Error::provider(
                "rerank",
                "scores length did not match candidate count",
            ));
        }

        let mut scored: Vec<(usize, f32)> = candidates
            .iter()
            .zip(response.scores)
            .map(|(candidate, score)| (candidate.index, score))
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(top_k);
        Ok(scored)
    }
}
