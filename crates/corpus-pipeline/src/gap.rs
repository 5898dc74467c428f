//! The gap-detection graph (spec §4.3, scenarios 3-5): plan, retrieve,
//! rerank, enrich, classify, then log. Shares its first four nodes with
//! [`crate::qa`]; unlike QA there is no retry loop, since `classify_knowledge`
//! has no evidence-shaped failure mode to retry against (spec §4.3 node 7
//! short-circuits to `NEW` on empty evidence instead).

use crate::context::PipelineContext;
use crate::nodes;
use crate::scoring;
use crate::state::{PipelineState, RetrievalFilters};
use corpus_core::error::Result;
use corpus_core::model::{ExecutionStatus, KnowledgeDecision, ResolvedCase};

/// Input to [`run_gap`].
#[derive(Debug, Clone)]
pub struct GapInput {
    /// Query used to search the corpus: the case's resolution text (spec §4.6).
    pub query: String,
    /// Retrieval filters and requested `top_k`.
    pub filters: RetrievalFilters,
}

/// Terminal result of a Gap run.
#[derive(Debug, Clone)]
pub struct GapOutcome {
    /// The classifier's decision.
    pub decision: KnowledgeDecision,
    /// Final ranked evidence the decision was made against.
    pub evidence: Vec<corpus_core::model::Hit>,
    /// Terminal status.
    pub status: ExecutionStatus,
    /// This run's execution id.
    pub execution_id: String,
}

/// Run the Gap graph end to end.
///
/// # Errors
///
/// Returns an error only when a node the spec treats as fatal to the run
/// (query planning, retrieval, classification) fails; rerank/enrichment/
/// logging degrade gracefully instead of propagating (spec §7:
/// "`classify_knowledge` failure is fatal to the gap run only").
pub async fn run_gap(ctx: &PipelineContext, input: GapInput, case: &ResolvedCase, execution_id: String) -> Result<GapOutcome> {
    let started = std::time::Instant::now();
    let mut state = PipelineState::new_gap(input.query, input.filters, case.case_id.clone(), execution_id.clone());

    nodes::plan_query(ctx, &mut state).await?;

    if !state.query_variants.is_empty() {
        nodes::retrieve(ctx, &mut state).await?;
        nodes::rerank(ctx, &mut state).await?;
        nodes::enrich_sources(ctx, &mut state).await;
        scoring::apply_and_sort(&mut state.evidence, &ctx.config, chrono::Utc::now());
    }

    let decision = nodes::classify_knowledge(ctx, &mut state, case).await?;
    state.decision = Some(decision.clone());

    let error_message = nodes::log_retrieval(ctx, &state, elapsed_ms(started)).await;
    if let Some(msg) = error_message {
        tracing::warn!(error = %msg, "log_retrieval reported an error for a Gap run");
    }

    Ok(GapOutcome {
        decision,
        evidence: state.evidence,
        status: state.status,
        execution_id,
    })
}

fn elapsed_ms(started: std::time::Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
