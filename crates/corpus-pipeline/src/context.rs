//! The set of singleton collaborators every pipeline node is handed
//! (spec §4.2, §6 Configuration). Constructed once at process start and
//! shared behind `Arc`, mirroring how `RetrievalQA::new(model, retriever,
//! chain_type)` closes over its collaborators rather than threading a
//! global.

use corpus_core::config::CorpusConfig;
use corpus_core::ports::{EmbeddingPort, GenerationPort, RerankPort};
use corpus_store::{ArticleStore, CaseSummaryCatalog, CorpusStore, ExecutionLog, RetrievalLog, ScriptCatalog};
use std::sync::Arc;

/// Everything a pipeline node needs beyond the mutable state record.
pub struct PipelineContext {
    /// Batched text embedding.
    pub embedding: Arc<dyn EmbeddingPort>,
    /// Structured chat-completion generation.
    pub generation: Arc<dyn GenerationPort>,
    /// Optional reranker; absent or unhealthy falls back to similarity order.
    pub rerank: Option<Arc<dyn RerankPort>>,
    /// Vector search, confidence, and usage (spec §4.1).
    pub corpus_store: Arc<dyn CorpusStore>,
    /// Article/provenance lookups for `ARTICLE` enrichment.
    pub article_store: Arc<dyn ArticleStore>,
    /// Script metadata lookups for `SCRIPT` enrichment.
    pub script_catalog: Arc<dyn ScriptCatalog>,
    /// Case summary lookups for `CASE_RESOLUTION` enrichment.
    pub case_summaries: Arc<dyn CaseSummaryCatalog>,
    /// Append-only evidence audit log (spec §4.3 node 8).
    pub retrieval_log: Arc<dyn RetrievalLog>,
    /// Pipeline-level observability rows.
    pub execution_log: Arc<dyn ExecutionLog>,
    /// Flat configuration knobs (spec §6).
    pub config: CorpusConfig,
}
