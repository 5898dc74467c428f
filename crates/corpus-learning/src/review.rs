//! Review Gateway (spec §4.9): the only mutator of article status after
//! initial drafting. Applies a human (or system) APPROVED/REJECTED decision
//! to a pending learning event, a strict `pending -> finalized` two-state
//! machine with no reopening (spec P6, enforced by
//! [`LearningEventStore::finalize`]).

use corpus_core::error::{Error, Result};
use corpus_core::model::{ArticleStatus, CorpusEntry, EntryKey, EventKind, FinalStatus, ReviewerRole, SourceKind};
use corpus_pipeline::PipelineContext;
use corpus_store::LearningEventStore;
use std::sync::Arc;

/// Decision applied to a pending learning event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

/// Result of applying a review decision.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewOutcome {
    /// The event's id.
    pub event_id: String,
    /// The final status now recorded on the event.
    pub final_status: FinalStatus,
    /// The article this event proposed, if it activated one.
    pub activated_article_id: Option<String>,
}

/// Apply `decision` to the pending learning event `event_id` (spec §4.9).
///
/// # Errors
///
/// Returns [`Error::EventNotFound`] for an unknown id, [`Error::AlreadyReviewed`]
/// if the event was already finalized, or the underlying store/provider
/// error if a corpus mutation fails partway (the event is finalized only
/// after every corpus mutation has succeeded, so a failure here never
/// leaves a finalized event with an un-mutated corpus).
pub async fn apply_review(
    ctx: &PipelineContext,
    learning_events: Arc<dyn LearningEventStore>,
    event_id: &str,
    decision: ReviewDecision,
    reviewer_role: ReviewerRole,
    reason: Option<String>,
) -> Result<ReviewOutcome> {
    let event = learning_events.get(event_id).await?;
    if event.final_status.is_some() {
        return Err(Error::AlreadyReviewed(event_id.to_string()));
    }

    let activated_article_id = match (decision, event.event_kind) {
        (ReviewDecision::Approved, EventKind::Gap) => {
            let article_id = event
                .proposed_article_id
                .clone()
                .ok_or_else(|| Error::other(format!("GAP event {event_id} has no proposed_article_id")))?;
            activate_gap_article(ctx, &article_id).await?;
            Some(article_id)
        }
        (ReviewDecision::Approved, EventKind::Contradiction) => {
            let article_id = event
                .proposed_article_id
                .clone()
                .ok_or_else(|| Error::other(format!("CONTRADICTION event {event_id} has no proposed_article_id")))?;
            let flagged_id = event
                .flagged_article_id
                .clone()
                .ok_or_else(|| Error::other(format!("CONTRADICTION event {event_id} has no flagged_article_id")))?;
            replace_flagged_article(ctx, &article_id, &flagged_id).await?;
            Some(flagged_id)
        }
        (ReviewDecision::Rejected, EventKind::Gap | EventKind::Contradiction) => {
            if let Some(article_id) = &event.proposed_article_id {
                ctx.article_store.set_status(article_id, ArticleStatus::Archived).await?;
            }
            None
        }
        // CONFIRMED events are auto-finalized by the coordinator and never
        // reach the gateway pending; reaching here would already have
        // failed the AlreadyReviewed check above.
        (_, EventKind::Confirmed) => None,
    };

    let final_status = match decision {
        ReviewDecision::Approved => FinalStatus::Approved,
        ReviewDecision::Rejected => FinalStatus::Rejected,
    };
    learning_events.finalize(event_id, final_status, reviewer_role, reason).await?;

    Ok(ReviewOutcome {
        event_id: event_id.to_string(),
        final_status,
        activated_article_id,
    })
}

async fn activate_gap_article(ctx: &PipelineContext, article_id: &str) -> Result<()> {
    ctx.article_store.set_status(article_id, ArticleStatus::Active).await?;
    let article = ctx.article_store.get(article_id).await?;
    let embedding = ctx
        .embedding
        .embed_batch(std::slice::from_ref(&article.body))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| Error::other("embedding port returned no vectors for a single-element batch"))?;

    ctx.corpus_store
        .upsert(CorpusEntry {
            key: EntryKey::new(SourceKind::Article, article_id.to_string()),
            title: article.title,
            content: article.body,
            category: article.category,
            module: article.module,
            tags: article.tags,
            embedding,
            confidence: 0.75,
            usage_count: 0,
            updated_at: chrono::Utc::now(),
        })
        .await
}

async fn replace_flagged_article(ctx: &PipelineContext, draft_article_id: &str, flagged_article_id: &str) -> Result<()> {
    let draft = ctx.article_store.get(draft_article_id).await?;
    ctx.article_store
        .replace_body(flagged_article_id, draft.title.clone(), draft.body.clone())
        .await?;

    let embedding = ctx
        .embedding
        .embed_batch(std::slice::from_ref(&draft.body))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| Error::other("embedding port returned no vectors for a single-element batch"))?;

    let mut entry = ctx.corpus_store.get(SourceKind::Article, flagged_article_id).await?;
    entry.title = draft.title;
    entry.content = draft.body;
    entry.category = draft.category.or(entry.category);
    entry.module = draft.module.or(entry.module);
    entry.tags = draft.tags;
    entry.embedding = embedding;
    entry.updated_at = chrono::Utc::now();
    ctx.corpus_store.upsert(entry).await?;

    ctx.article_store.set_status(draft_article_id, ArticleStatus::Archived).await
}
