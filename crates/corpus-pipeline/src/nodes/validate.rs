//! Node 6: `validate` (QA only). Decides whether `state.evidence` and the
//! citations `write_answer` produced from it are usable as-is, warrant one
//! widened retry, or must terminate the run as insufficient (spec §4.3 node
//! 6). Runs after `write_answer`, so a decline (empty citations) fails
//! validation exactly like empty evidence does.

use crate::state::PipelineState;
use corpus_core::model::ExecutionStatus;

/// What the caller should do after `validate` runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidateOutcome {
    /// Evidence and citations are usable; the run is done.
    Ok,
    /// Evidence or citations were empty on the first attempt; widen `top_k`
    /// and retry once.
    Retry,
    /// Evidence or citations were empty on the retried attempt too; give up.
    Insufficient,
}

fn has_citations(state: &PipelineState) -> bool {
    state.citations.as_ref().is_some_and(|c| !c.is_empty())
}

/// Run the `validate` node, mutating `state` in place when retrying.
pub fn validate(state: &mut PipelineState) -> ValidateOutcome {
    if !state.evidence.is_empty() && has_citations(state) {
        return ValidateOutcome::Ok;
    }

    if state.attempt_no == 0 {
        state.attempt_no = 1;
        state.top_k = ((state.top_k as f32) * 1.5).ceil() as usize;
        state.reset_for_retry();
        ValidateOutcome::Retry
    } else {
        state.status = ExecutionStatus::InsufficientEvidence;
        state.answer = None;
        state.citations = None;
        ValidateOutcome::Insufficient
    }
}
