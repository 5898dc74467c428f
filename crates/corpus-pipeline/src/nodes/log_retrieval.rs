//! Node 8: `log_retrieval`. Appends one retrieval-log row per evidence hit,
//! bumps usage on the top hits, and appends the run's execution record
//! (spec §4.3 node 8, §3 Execution Record). Logging failures are captured
//! and returned as a message rather than propagated, per spec §7: a
//! dropped log row must never fail the caller's answer/decision.

use crate::context::PipelineContext;
use crate::state::PipelineState;
use corpus_core::model::ExecutionRecord;
use corpus_store::NewAttemptLogRow;

/// Only the top few hits get their usage bumped; logging every hit's usage
/// would overstate how often low-ranked evidence was actually surfaced.
const USAGE_BUMP_TOP_N: usize = 5;
/// Cap on retrieval-log rows written per run, mirroring the evidence list's
/// own practical size.
const MAX_LOGGED_ROWS: usize = 10;

/// Run the `log_retrieval` node. Returns an error message to fold into the
/// execution record, if anything failed.
pub async fn log_retrieval(ctx: &PipelineContext, state: &PipelineState, total_latency_ms: u64) -> Option<String> {
    let mut error_message = None;

    for hit in state.evidence.iter().take(MAX_LOGGED_ROWS) {
        let row = NewAttemptLogRow {
            conversation_id: state.conversation_id.clone(),
            attempt_no: state.attempt_no,
            query_text: state.query.clone(),
            source_kind: Some(hit.entry.key.source_kind),
            source_id: Some(hit.entry.key.source_id.clone()),
            similarity_score: Some(hit.similarity),
            execution_id: state.execution_id.clone(),
        };
        if let Err(error) = ctx.retrieval_log.append(row).await {
            tracing::warn!(%error, "failed to append retrieval log row");
            error_message.get_or_insert_with(|| error.to_string());
        }
    }

    for hit in state.evidence.iter().take(USAGE_BUMP_TOP_N) {
        if let Err(error) = ctx.corpus_store.bump_usage(hit.entry.key.source_kind, &hit.entry.key.source_id).await {
            tracing::warn!(%error, "failed to bump usage for evidence hit");
            error_message.get_or_insert_with(|| error.to_string());
        }
    }

    let top = state.evidence.first();
    let record = ExecutionRecord {
        execution_id: state.execution_id.clone(),
        graph_kind: state.graph_kind,
        conversation_id: state.conversation_id.clone(),
        case_id: state.case_id.clone(),
        query: state.query.clone(),
        total_latency_ms,
        per_node_latencies: state.per_node_latencies.clone(),
        tokens_in: state.tokens_in,
        tokens_out: state.tokens_out,
        evidence_count: state.evidence.len() as u32,
        top_similarity: top.map(|h| h.similarity),
        top_rerank_score: top.and_then(|h| h.rerank_score),
        classification: state.decision.as_ref().map(|d| d.verdict),
        status: state.status,
        error_message: error_message.clone(),
        created_at: chrono::Utc::now(),
    };
    if let Err(error) = ctx.execution_log.append(record).await {
        tracing::warn!(%error, "failed to append execution record");
        error_message.get_or_insert_with(|| error.to_string());
    }

    error_message
}
