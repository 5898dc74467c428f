//! Node 4: `enrich_sources`. Thin wrapper handing `state.evidence` to the
//! enrichment resolver (spec §4.4); see [`crate::enrich`].

use crate::context::PipelineContext;
use crate::state::PipelineState;

/// Run the `enrich_sources` node. Never fails.
pub async fn enrich_sources(ctx: &PipelineContext, state: &mut PipelineState) {
    crate::enrich::enrich(ctx, &mut state.evidence).await;
}
