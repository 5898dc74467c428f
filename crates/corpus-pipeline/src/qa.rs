//! The question-answering graph (spec §4.3, scenarios 1-2): plan, retrieve,
//! rerank, enrich, write an answer, validate (retrying once on empty
//! evidence or citations), then log. A straight-line `loop` over the shared
//! node functions, not a generic graph interpreter, per the spec's own
//! design note (§9).

use crate::context::PipelineContext;
use crate::nodes::{self, ValidateOutcome};
use crate::scoring;
use crate::state::{Citation, PipelineState, RetrievalFilters};
use corpus_core::error::Result;
use corpus_core::model::ExecutionStatus;

/// Input to [`run_qa`].
#[derive(Debug, Clone)]
pub struct QaInput {
    /// The user's raw query.
    pub query: String,
    /// Retrieval filters and requested `top_k`.
    pub filters: RetrievalFilters,
    /// Owning conversation id.
    pub conversation_id: String,
}

/// Terminal result of a QA run.
#[derive(Debug, Clone)]
pub struct QaOutcome {
    /// Synthesized answer text, if evidence was sufficient.
    pub answer: Option<String>,
    /// Citations backing the answer, if any.
    pub citations: Option<Vec<Citation>>,
    /// Final ranked evidence.
    pub evidence: Vec<corpus_core::model::Hit>,
    /// Terminal status.
    pub status: ExecutionStatus,
    /// This run's execution id.
    pub execution_id: String,
}

/// Run the QA graph end to end.
///
/// # Errors
///
/// Returns an error only when a node the spec treats as fatal to the run
/// (query planning, retrieval) fails; `write_answer` failure is handled as
/// an empty-citations validation failure instead of propagating, and
/// rerank/enrichment/logging degrade gracefully (spec §7).
pub async fn run_qa(ctx: &PipelineContext, input: QaInput, execution_id: String) -> Result<QaOutcome> {
    let started = std::time::Instant::now();
    let mut state = PipelineState::new_qa(input.query, input.filters, Some(input.conversation_id), execution_id.clone());

    nodes::plan_query(ctx, &mut state).await?;

    if state.query_variants.is_empty() {
        state.status = ExecutionStatus::InsufficientEvidence;
        return Ok(finish(ctx, state, execution_id, started).await);
    }

    loop {
        nodes::retrieve(ctx, &mut state).await?;
        nodes::rerank(ctx, &mut state).await?;
        nodes::enrich_sources(ctx, &mut state).await;
        scoring::apply_and_sort(&mut state.evidence, &ctx.config, chrono::Utc::now());

        if !state.evidence.is_empty() {
            if let Err(error) = nodes::write_answer(ctx, &mut state).await {
                tracing::warn!(%error, "write_answer declined or failed; treating as no citations produced");
                state.answer = None;
                state.citations = None;
            }
        }

        match nodes::validate(&mut state) {
            ValidateOutcome::Ok => break,
            ValidateOutcome::Retry => continue,
            ValidateOutcome::Insufficient => break,
        }
    }

    Ok(finish(ctx, state, execution_id, started).await)
}

async fn finish(ctx: &PipelineContext, state: PipelineState, execution_id: String, started: std::time::Instant) -> QaOutcome {
    let error_message = nodes::log_retrieval(ctx, &state, elapsed_ms(started)).await;
    if let Some(msg) = error_message {
        tracing::warn!(error = %msg, "log_retrieval reported an error for a QA run");
    }

    QaOutcome {
        answer: state.answer,
        citations: state.citations,
        evidence: state.evidence,
        status: state.status,
        execution_id,
    }
}

fn elapsed_ms(started: std::time::Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
