//! Node 2: `retrieve`. Embeds every query variant in a single batch (P9) and
//! searches the corpus store with each resulting vector, merging hits into
//! `state.candidates` keeping the max similarity per key (P1).

use crate::context::PipelineContext;
use crate::state::PipelineState;
use corpus_core::error::{Error, Result};

/// Run the `retrieve` node.
pub async fn retrieve(ctx: &PipelineContext, state: &mut PipelineState) -> Result<()> {
    if state.query_variants.is_empty() {
        return Ok(());
    }

    let vectors = ctx.embedding.embed_batch(&state.query_variants).await?;
    if vectors.len() != state.query_variants.len() {
        return Err(Error::other("embed_batch returned a mismatched number of vectors"));
    }

    for vector in &vectors {
        let hits = ctx
            .corpus_store
            .search(
                vector,
                state.top_k,
                state.source_kinds.as_deref(),
                state.category.as_deref(),
                None,
            )
            .await?;
        for hit in hits {
            let key = hit.key();
            match state.candidates.get(&key) {
                Some(existing) if existing.similarity >= hit.similarity => {}
                _ => {
                    state.candidates.insert(key, hit);
                }
            }
        }
    }

    if state.candidates.len() > ctx.config.max_candidates {
        let mut ranked: Vec<_> = state.candidates.drain().collect();
        ranked.sort_by(|a, b| {
            b.1.similarity
                .partial_cmp(&a.1.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.entry.key.source_id.cmp(&b.1.entry.key.source_id))
        });
        ranked.truncate(ctx.config.max_candidates);
        state.candidates = ranked.into_iter().collect();
    }

    Ok(())
}
