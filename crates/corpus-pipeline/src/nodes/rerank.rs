//! Node 3: `rerank`. Truncates `state.candidates` into `state.evidence`,
//! reordered by the (optional) rerank port. Falls back to plain similarity
//! order, with a deterministic ascending-`source_id` tie-break, whenever no
//! reranker is configured or the reranker call itself fails (spec §4.3 node
//! 3, §7: reranker failures degrade, they never fail the run).

use crate::context::PipelineContext;
use crate::state::PipelineState;
use corpus_core::error::Result;
use corpus_core::ports::RerankCandidate;

/// Run the `rerank` node.
pub async fn rerank(ctx: &PipelineContext, state: &mut PipelineState) -> Result<()> {
    let mut candidates: Vec<_> = state.candidates.values().cloned().collect();
    candidates.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.entry.key.source_id.cmp(&b.entry.key.source_id))
    });

    let Some(rerank_port) = ctx.rerank.as_ref().filter(|_| ctx.config.reranker_enabled) else {
        candidates.truncate(state.top_k);
        state.evidence = candidates;
        return Ok(());
    };

    let rerank_candidates: Vec<RerankCandidate> = candidates
        .iter()
        .enumerate()
        .map(|(index, hit)| RerankCandidate {
            index,
            text: format!("{}\n{}", hit.entry.title, hit.entry.content),
        })
        .collect();

    match rerank_port.rerank(&state.query, &rerank_candidates, state.top_k).await {
        Ok(scored) => {
            let mut evidence = Vec::with_capacity(scored.len());
            for (index, score) in scored {
                if let Some(hit) = candidates.get(index) {
                    let mut hit = hit.clone();
                    hit.rerank_score = Some(score);
                    evidence.push(hit);
                }
            }
            state.evidence = evidence;
        }
        Err(error) => {
            tracing::warn!(%error, "rerank call failed; falling back to similarity order");
            candidates.truncate(state.top_k);
            state.evidence = candidates;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PipelineContext;
    use crate::state::RetrievalFilters;
    use chrono::Utc;
    use corpus_core::config::CorpusConfig;
    use corpus_core::model::{CorpusEntry, EntryKey, Hit, SourceKind};
    use corpus_providers::mocks::{MockEmbeddingPort, QueryMatchRerankPort, ScriptedGenerationPort};
    use corpus_store::{
        InMemoryArticleStore, InMemoryCaseSummaryCatalog, InMemoryCorpusStore, InMemoryExecutionLog, InMemoryRetrievalLog,
        InMemoryScriptCatalog,
    };
    use std::sync::Arc;

    fn hit(source_id: &str, similarity: f32, content: &str) -> Hit {
        Hit {
            entry: CorpusEntry {
                key: EntryKey::new(SourceKind::Article, source_id),
                title: source_id.into(),
                content: content.into(),
                category: None,
                module: None,
                tags: vec![],
                embedding: vec![1.0],
                confidence: 0.5,
                usage_count: 0,
                updated_at: Utc::now(),
            },
            similarity,
            rerank_score: None,
            final_score: None,
            detail: None,
        }
    }

    fn base_context() -> PipelineContext {
        PipelineContext {
            embedding: Arc::new(MockEmbeddingPort::new(8)),
            generation: Arc::new(ScriptedGenerationPort::new(vec![])),
            rerank: None,
            corpus_store: Arc::new(InMemoryCorpusStore::new()),
            article_store: Arc::new(InMemoryArticleStore::new()),
            script_catalog: Arc::new(InMemoryScriptCatalog::new()),
            case_summaries: Arc::new(InMemoryCaseSummaryCatalog::new()),
            retrieval_log: Arc::new(InMemoryRetrievalLog::new()),
            execution_log: Arc::new(InMemoryExecutionLog::new()),
            config: CorpusConfig::default(),
        }
    }

    fn state_with(evidence_source: Vec<Hit>, top_k: usize) -> PipelineState {
        let filters = RetrievalFilters {
            category: None,
            source_kinds: None,
            top_k,
        };
        let mut state = PipelineState::new_qa("vpn certificate expired".into(), filters, Some("conv-1".into()), "exec-1".into());
        for h in evidence_source {
            state.candidates.insert(h.key(), h);
        }
        state
    }

    #[tokio::test]
    async fn no_reranker_falls_back_to_similarity_order() {
        let ctx = base_context();
        let mut state = state_with(vec![hit("A", 0.4, "reboot router"), hit("B", 0.9, "vpn cert rotate")], 5);
        rerank(&ctx, &mut state).await.unwrap();
        assert_eq!(state.evidence[0].entry.key.source_id, "B");
        assert!(state.evidence[0].rerank_score.is_none());
    }

    #[tokio::test]
    async fn reranker_reorders_by_text_overlap() {
        let mut ctx = base_context();
        ctx.rerank = Some(Arc::new(QueryMatchRerankPort));
        let mut state = state_with(vec![hit("A", 0.9, "reboot router"), hit("B", 0.2, "vpn certificate expired fix")], 5);
        rerank(&ctx, &mut state).await.unwrap();
        assert_eq!(state.evidence[0].entry.key.source_id, "B");
        assert!(state.evidence[0].rerank_score.is_some());
    }

    #[tokio::test]
    async fn reranker_disabled_by_config_falls_back_even_if_present() {
        let mut ctx = base_context();
        ctx.rerank = Some(Arc::new(QueryMatchRerankPort));
        ctx.config.reranker_enabled = false;
        let mut state = state_with(vec![hit("A", 0.9, "reboot router"), hit("B", 0.2, "vpn certificate expired fix")], 5);
        rerank(&ctx, &mut state).await.unwrap();
        assert_eq!(state.evidence[0].entry.key.source_id, "A");
        assert!(state.evidence[0].rerank_score.is_none());
    }

    #[tokio::test]
    async fn evidence_truncated_to_top_k() {
        let ctx = base_context();
        let mut state = state_with(vec![hit("A", 0.9, "x"), hit("B", 0.8, "x"), hit("C", 0.7, "x")], 2);
        rerank(&ctx, &mut state).await.unwrap();
        assert_eq!(state.evidence.len(), 2);
    }
}
