//! Node 5: `write_answer` (QA only). Synthesizes a cited answer from
//! `state.evidence` via the generation port (spec §4.3 node 5).

use crate::context::PipelineContext;
use crate::schemas::{schema_value, AnswerOutput};
use crate::state::{Citation, PipelineState};
use corpus_core::error::{Error, Result};
use corpus_core::model::SourceKind;
use corpus_core::ports::GenerationMessage;

const SYSTEM_PROMPT: &str = "You are a support-knowledge assistant. Answer the user's query using \
only the evidence provided below, citing the source_kind and source_id of every claim you make. \
If the evidence does not support a confident answer, say so and lower your self_confidence.";

fn source_kind_from_wire(label: &str) -> SourceKind {
    match label {
        "SCRIPT" => SourceKind::Script,
        "CASE_RESOLUTION" => SourceKind::CaseResolution,
        _ => SourceKind::Article,
    }
}

/// Run the `write_answer` node. Errors propagate to the caller, which (in
/// `crate::qa::run_qa`) treats a failed answer synthesis as an execution
/// error rather than leaving evidence unexplained.
pub async fn write_answer(ctx: &PipelineContext, state: &mut PipelineState) -> Result<()> {
    let evidence_block = state
        .evidence
        .iter()
        .map(|hit| {
            let detail = match &hit.detail {
                Some(d) => format!("{d:?}"),
                None => "(unenriched)".to_string(),
            };
            format!(
                "- source_kind={:?} source_id={} title={:?} similarity={:.3}\n  content={:?}\n  detail={detail}",
                hit.entry.key.source_kind, hit.entry.key.source_id, hit.entry.title, hit.similarity, hit.entry.content,
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let user_prompt = format!("Query: {}\n\nEvidence:\n{evidence_block}", state.query);
    let messages = [GenerationMessage::system(SYSTEM_PROMPT), GenerationMessage::user(user_prompt)];
    let schema = schema_value::<AnswerOutput>();

    let (value, usage) = ctx.generation.generate_structured(&messages, &schema, 0.3).await?;
    let parsed: AnswerOutput =
        serde_json::from_value(value).map_err(|e| Error::other(format!("write_answer: malformed response: {e}")))?;

    state.tokens_in += usage.tokens_in;
    state.tokens_out += usage.tokens_out;
    state.answer = Some(parsed.answer);
    state.citations = Some(
        parsed
            .citations
            .into_iter()
            .map(|c| Citation {
                source_kind: source_kind_from_wire(&c.source_kind),
                source_id: c.source_id,
                title: c.title,
                quote: c.quote,
            })
            .collect(),
    );
    Ok(())
}
