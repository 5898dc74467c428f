//! An [`EmbeddingPort`] backed by the OpenAI embeddings API, grounded on
//! `dashflow-openai`'s `OpenAIEmbeddings` (client construction from
//! `OPENAI_API_KEY`, configurable model/chunking, a `RetryPolicy`).

use crate::retry::RetryPolicy;
use async_openai::config::OpenAIConfig;
use async_openai::types::CreateEmbeddingRequestArgs;
use async_openai::Client;
use async_trait::async_trait;
use corpus_core::error::{Error, Result};
use corpus_core::ports::EmbeddingPort;

/// Environment variable holding the API key, mirroring `dashflow-openai`'s
/// `env_string(OPENAI_API_KEY)` lookup.
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Embeds text through OpenAI's `/embeddings` endpoint.
pub struct OpenAIEmbeddingPort {
    client: Client<OpenAIConfig>,
    model: String,
    chunk_size: usize,
    retry_policy: RetryPolicy,
}

impl OpenAIEmbeddingPort {
    /// Construct from the `OPENAI_API_KEY` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the environment variable is unset.
    pub fn try_new(model: impl Into<String>) -> Result<Self> {
        let key = std::env::var(OPENAI_API_KEY)
            .map_err(|_| Error::config(format!("{OPENAI_API_KEY} is not set")))?;
        let config = OpenAIConfig::new().with_api_key(key);
        Ok(Self {
            client: Client::with_config(config),
            model: model.into(),
            chunk_size: 512,
            retry_policy: RetryPolicy::exponential(3),
        })
    }

    /// Override the batch chunk size sent per underlying HTTP request.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Override the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    async fn embed_chunk(&self, chunk: &[String]) -> Result<Vec<Vec<f32>>> {
        self.retry_policy
            .run(|| async {
                let request = CreateEmbeddingRequestArgs::default()
                    .model(&self.model)
                    .input(chunk.to_vec())
                    .build()
                    .map_err(|e| Error::provider("embedding", e.to_string()))?;
                let response = self
                    .client
                    .embeddings()
                    .create(request)
                    .await
                    .map_err(|e| Error::provider("embedding", e.to_string()))?;
                Ok(response
                    .data
                    .into_iter()
                    .map(|d| d.embedding)
                    .collect::<Vec<_>>())
            })
            .await
    }
}

#[async_trait]
impl EmbeddingPort for OpenAIEmbeddingPort {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.chunk_size) {
            out.extend(self.embed_chunk(chunk).await?);
        }
        Ok(out)
    }
}
