//! Draft Generator (spec §4.8): synthesizes a draft knowledge-base article
//! from a resolved case, grounded in its conversation transcript, the
//! script it referenced (if any), and — for a contradiction — the article
//! it replaces. The only generation call in the system that runs above
//! temperature 0 (spec §4.8: "the only place in the system with non-zero
//! temperature").

use crate::schemas::{schema_value, DraftOutput};
use chrono::Utc;
use corpus_core::error::{Error, Result};
use corpus_core::model::{Article, ArticleOrigin, ArticleStatus, Provenance, ProvenanceSourceKind, Relationship, ResolvedCase};
use corpus_core::ports::{ConversationRepository, GenerationMessage};
use corpus_pipeline::PipelineContext;
use uuid::Uuid;

/// Empty-sentinel `source_id` for the `REFERENCES Script` provenance
/// record when the case didn't reference a script (spec §4.8).
pub const NO_SCRIPT_SENTINEL: &str = "";

/// Temperature used for drafting; the spec allows 0.3-0.7, this workspace
/// standardizes on the midpoint.
const DRAFT_TEMPERATURE: f32 = 0.5;

const SYSTEM_PROMPT: &str = "You are a knowledge-base author for a customer-support team. Given a \
resolved case and its conversation transcript, write a clear, reusable knowledge-base article that \
would let another agent resolve the same problem without re-deriving the fix.";

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}

/// Generate and persist a draft article (plus its three provenance
/// records) from a resolved case. `flagged_article`, if given, is the
/// existing article this draft is meant to replace (spec §4.7
/// `CONTRADICTS`); its body is included as prompt context and the draft
/// itself carries no reference back to it (the coordinator links the two
/// through the Learning Event's `flagged_article_id`).
pub async fn generate_draft(
    ctx: &PipelineContext,
    conversations: &dyn ConversationRepository,
    case: &ResolvedCase,
    flagged_article: Option<&Article>,
) -> Result<Article> {
    let transcript = conversations.transcript(&case.conversation_id).await?;

    let script_detail = match &case.script_id {
        Some(script_id) => ctx
            .script_catalog
            .details_for(std::slice::from_ref(script_id))
            .await?
            .remove(script_id),
        None => None,
    };

    let mut user_prompt = format!(
        "Case subject: {}\nDescription: {}\nResolution: {}\nRoot cause: {}\nCategory: {}\n\nConversation transcript:\n{transcript}",
        case.subject,
        case.description,
        case.resolution,
        case.root_cause.as_deref().unwrap_or("(unknown)"),
        case.category.as_deref().unwrap_or("(none)"),
    );
    if let Some(detail) = &script_detail {
        user_prompt.push_str(&format!(
            "\n\nReferenced script purpose: {}\nRequired inputs: {}",
            detail.purpose,
            detail.required_inputs.join(", "),
        ));
    }
    if let Some(flagged) = flagged_article {
        user_prompt.push_str(&format!(
            "\n\nThis draft replaces an existing article titled {:?} whose current body is:\n{}",
            flagged.title, flagged.body,
        ));
    }

    let messages = [GenerationMessage::system(SYSTEM_PROMPT), GenerationMessage::user(user_prompt)];
    let schema = schema_value::<DraftOutput>();
    let (value, _usage) = ctx.generation.generate_structured(&messages, &schema, DRAFT_TEMPERATURE).await?;
    let parsed: DraftOutput =
        serde_json::from_value(value).map_err(|e| Error::other(format!("draft generator: malformed response: {e}")))?;

    let body = if parsed.resolution_steps.is_empty() {
        parsed.body
    } else {
        let steps = parsed
            .resolution_steps
            .iter()
            .enumerate()
            .map(|(i, step)| format!("{}. {step}", i + 1))
            .collect::<Vec<_>>()
            .join("\n");
        format!("{}\n\nResolution steps:\n{steps}", parsed.body)
    };

    let now = Utc::now();
    let article_id = format!("ART-SYN-{}", Uuid::new_v4());
    let article = Article {
        article_id: article_id.clone(),
        title: parsed.title,
        body,
        tags: parsed.tags,
        module: parsed.module,
        category: parsed.category.or_else(|| case.category.clone()),
        status: ArticleStatus::Draft,
        origin: ArticleOrigin::Synthesized,
        created_at: now,
        updated_at: now,
    };
    ctx.article_store.insert(article.clone()).await?;

    let script_source_id = case.script_id.clone().unwrap_or_else(|| NO_SCRIPT_SENTINEL.to_string());
    let script_snippet = script_detail.map_or_else(|| "no script referenced".to_string(), |d| d.purpose);
    ctx.article_store
        .add_provenance(vec![
            Provenance {
                article_id: article_id.clone(),
                source_kind: ProvenanceSourceKind::Case,
                source_id: case.case_id.clone(),
                relationship: Relationship::CreatedFrom,
                evidence_snippet: truncate(&case.resolution, 240),
                timestamp: now,
            },
            Provenance {
                article_id: article_id.clone(),
                source_kind: ProvenanceSourceKind::Conversation,
                source_id: case.conversation_id.clone(),
                relationship: Relationship::CreatedFrom,
                evidence_snippet: truncate(&transcript, 240),
                timestamp: now,
            },
            Provenance {
                article_id: article_id.clone(),
                source_kind: ProvenanceSourceKind::Script,
                source_id: script_source_id,
                relationship: Relationship::References,
                evidence_snippet: script_snippet,
                timestamp: now,
            },
        ])
        .await?;

    Ok(article)
}
