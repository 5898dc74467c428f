//! Node 1: `plan_query` (spec §4.3). Asks the generation port to paraphrase
//! the input query across plausible terminology, producing 2-4 variants
//! that `retrieve` will search with.

use crate::context::PipelineContext;
use crate::schemas::{schema_value, PlanQueryOutput};
use crate::state::PipelineState;
use corpus_core::error::{Error, Result};
use corpus_core::ports::GenerationMessage;

const SYSTEM_PROMPT: &str = "You are a query-planning assistant for a customer-support knowledge \
base. Given a support query, produce 2 to 4 alternative phrasings that a human agent might have \
used to describe the same underlying problem, covering plausible synonyms and terminology \
variants. Do not change the underlying intent.";

/// Maximum number of variants kept, even if the model returns more (spec
/// §4.3 node 1: "Produces 2-4 variants").
const MAX_VARIANTS: usize = 4;

/// Run the `plan_query` node, populating `state.query_variants`.
pub async fn plan_query(ctx: &PipelineContext, state: &mut PipelineState) -> Result<()> {
    let schema = schema_value::<PlanQueryOutput>();
    let user_prompt = format!(
        "Query: {}\nCategory filter: {}\nSource kinds: {}",
        state.query,
        state.category.as_deref().unwrap_or("(none)"),
        state
            .source_kinds
            .as_ref()
            .map(|kinds| kinds.iter().map(|k| format!("{k:?}")).collect::<Vec<_>>().join(", "))
            .unwrap_or_else(|| "SCRIPT, ARTICLE, CASE_RESOLUTION".to_string()),
    );
    let messages = [GenerationMessage::system(SYSTEM_PROMPT), GenerationMessage::user(user_prompt)];

    let (value, usage) = ctx.generation.generate_structured(&messages, &schema, 0.0).await?;
    let parsed: PlanQueryOutput =
        serde_json::from_value(value).map_err(|e| Error::other(format!("plan_query: malformed response: {e}")))?;

    state.tokens_in += usage.tokens_in;
    state.tokens_out += usage.tokens_out;
    state.query_variants = parsed.queries.into_iter().filter(|q| !q.trim().is_empty()).take(MAX_VARIANTS).collect();
    Ok(())
}
