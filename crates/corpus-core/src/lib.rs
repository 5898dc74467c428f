//! Shared domain model, error types, configuration, and provider ports for
//! the support-corpus retrieval-and-self-learning core.
//!
//! This crate has no provider SDKs, no storage backend, and no pipeline
//! logic of its own; it exists so that `corpus-store`, `corpus-providers`,
//! `corpus-pipeline`, `corpus-learning`, and `corpus-service` all compile
//! against the same types without depending on each other directly, the
//! same way `dashflow::core` anchors the wider `dashflow` workspace.

pub mod config;
pub mod error;
pub mod model;
pub mod ports;

pub use config::{CorpusConfig, ScoreWeights};
pub use error::{Error, Result};
pub use ports::{
    CaseRepository, ConversationRepository, EmbeddingPort, GenerationMessage, GenerationPort, RerankCandidate, RerankPort,
    TokenUsage,
};
