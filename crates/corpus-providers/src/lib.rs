//! Concrete [`EmbeddingPort`](corpus_core::EmbeddingPort),
//! [`GenerationPort`](corpus_core::GenerationPort), and
//! [`RerankPort`](corpus_core::RerankPort) implementations, kept in their
//! own crate so `corpus-pipeline` and `corpus-learning` depend only on the
//! port traits in `corpus-core` and never on a concrete provider SDK.

pub mod http_rerank;
pub mod openai_embeddings;
pub mod openai_generation;
pub mod retry;

#[cfg(feature = "testing")]
pub mod mocks;

pub use http_rerank::HttpRerankPort;
pub use openai_embeddings::OpenAIEmbeddingPort;
pub use openai_generation::OpenAIGenerationPort;
pub use retry::RetryPolicy;
