//! The programmatic boundary (spec §6) the rest of the system is driven
//! through: `suggest` for live retrieval, `close_case`/`learn` for the
//! self-learning loop, and `review` for the Review Gateway. Everything
//! behind it — the retrieval graphs in `corpus-pipeline`, the coordinator
//! and gateway in `corpus-learning`, the tables in `corpus-store` — is
//! already a complete system; this crate is the thin facade a transport
//! layer (HTTP, gRPC, an in-process call from the UI) is built on top of,
//! the same way `dashflow-langserve` wraps a `Runnable` without owning any
//! of its logic.
//!
//! HTTP transport, auth, CORS, and health checks are explicitly out of
//! scope (spec §1) and have no representation here.

use chrono::Utc;
use corpus_core::error::{Error, Result};
use corpus_core::model::{LearningEvent, ResolvedCase, SourceKind};
use corpus_core::ports::{CaseRepository, ConversationRepository};
use corpus_learning::{apply_review, learn as run_learn, LearningResult, ReviewDecision};
use corpus_pipeline::{run_qa, PipelineContext, QaInput, QaOutcome, RetrievalFilters};
use corpus_store::LearningEventStore;
use std::sync::Arc;
use uuid::Uuid;

/// Input to [`CorpusEngine::suggest`].
#[derive(Debug, Clone)]
pub struct SuggestInput {
    /// Owning conversation id, threaded onto every retrieval log row.
    pub conversation_id: String,
    /// Natural-language query.
    pub query: String,
    /// Category substring filter, case-insensitive.
    pub category: Option<String>,
    /// Restrict candidates to these source kinds.
    pub source_kinds: Option<Vec<SourceKind>>,
    /// Requested `top_k`; falls back to [`corpus_core::config::CorpusConfig::default_top_k`].
    pub top_k: Option<usize>,
}

/// Whether a closed case resolved the customer's issue, the only signal
/// `close_case` needs to pick a confidence-scoring outcome (spec §4.7
/// step 2 deals only in `RESOLVED`/`UNHELPFUL`; `PARTIAL` is a legal row
/// outcome but never produced by bulk closure stamping).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeHint {
    /// The case closed as resolved.
    Resolved,
    /// The case closed unresolved (escalated, abandoned, etc).
    Unresolved,
}

/// Input to [`CorpusEngine::close_case`]: the fields of a [`ResolvedCase`]
/// this system does not assign itself.
#[derive(Debug, Clone)]
pub struct ClosureSummary {
    /// Owning conversation id.
    pub conversation_id: String,
    /// Subject line.
    pub subject: String,
    /// Full description.
    pub description: String,
    /// How the case was resolved.
    pub resolution: String,
    /// Root cause, if known.
    pub root_cause: Option<String>,
    /// Category.
    pub category: Option<String>,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Referenced script, if any.
    pub script_id: Option<String>,
    /// Whether the case resolved the customer's issue.
    pub outcome_hint: OutcomeHint,
}

/// Output of [`CorpusEngine::close_case`] (spec §6).
#[derive(Debug, Clone)]
pub struct CloseCaseOutcome {
    /// The case id this system assigned (spec §9: `ticket_number` and
    /// `case_id` denote the same entity; this field is the external name).
    pub ticket_number: String,
    /// The full self-learning coordinator result.
    pub learning_result: LearningResult,
    /// Non-fatal failures surfaced by the coordinator's best-effort stages
    /// (mirrors `learning_result.warnings`, surfaced at the top level to
    /// match the spec's external-interface table literally).
    pub warnings: Vec<String>,
}

/// Input to [`CorpusEngine::review`].
#[derive(Debug, Clone)]
pub struct ReviewInput {
    /// The pending learning event to finalize.
    pub event_id: String,
    /// Approve or reject.
    pub decision: ReviewDecision,
    /// Who is finalizing the event.
    pub reviewer_role: corpus_core::model::ReviewerRole,
    /// Optional free-text reason, recorded alongside the decision.
    pub reason: Option<String>,
}

/// Output of [`CorpusEngine::review`].
#[derive(Debug, Clone)]
pub struct ReviewResult {
    /// The event after finalization.
    pub event: LearningEvent,
    /// The article this review activated or re-activated in place, if any.
    pub activated_article_id: Option<String>,
}

/// The facade over retrieval, self-learning, and review.
///
/// Constructed once at process start with every collaborator already
/// wired (spec §9: "environment is injected at construction, not read
/// from a global").
pub struct CorpusEngine {
    /// The collaborators every pipeline node needs.
    pub ctx: PipelineContext,
    /// Read/write access to closed cases.
    pub cases: Arc<dyn CaseRepository>,
    /// Read access to conversation transcripts.
    pub conversations: Arc<dyn ConversationRepository>,
    /// Storage for self-learning decisions pending review.
    pub learning_events: Arc<dyn LearningEventStore>,
}

impl CorpusEngine {
    /// Construct a service over the given collaborators.
    #[must_use]
    pub fn new(
        ctx: PipelineContext,
        cases: Arc<dyn CaseRepository>,
        conversations: Arc<dyn ConversationRepository>,
        learning_events: Arc<dyn LearningEventStore>,
    ) -> Self {
        Self {
            ctx,
            cases,
            conversations,
            learning_events,
        }
    }

    /// Run the QA retrieval pipeline (spec §4.3, §6 `suggest`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `top_k` is `0`; otherwise only
    /// propagates the fatal node failures `run_qa` itself propagates
    /// (query planning, retrieval). Insufficient evidence and provider
    /// degradations are reported through the returned status, not an error.
    pub async fn suggest(&self, input: SuggestInput) -> Result<QaOutcome> {
        let top_k = input.top_k.unwrap_or(self.ctx.config.default_top_k);
        if top_k == 0 {
            return Err(Error::invalid_input("top_k must be greater than zero"));
        }
        let execution_id = Uuid::new_v4().to_string();
        let qa_input = QaInput {
            query: input.query,
            filters: RetrievalFilters {
                category: input.category,
                source_kinds: input.source_kinds,
                top_k,
            },
            conversation_id: input.conversation_id,
        };
        run_qa(&self.ctx, qa_input, execution_id).await
    }

    /// Close a case: assign it an id, persist it, and run the self-learning
    /// coordinator against it (spec §6 `close_case`).
    ///
    /// # Errors
    ///
    /// Returns an error only if the newly assigned case cannot be
    /// persisted, or (in principle, since it was just written) cannot be
    /// loaded back by the coordinator; every other coordinator stage is
    /// captured into `warnings` instead (spec §6: "case-load failure is
    /// fatal; all other stages are captured as warnings").
    pub async fn close_case(&self, summary: ClosureSummary) -> Result<CloseCaseOutcome> {
        let case_id = format!("CASE-{}", Uuid::new_v4().simple());
        let case = ResolvedCase {
            case_id: case_id.clone(),
            conversation_id: summary.conversation_id,
            subject: summary.subject,
            description: summary.description,
            resolution: summary.resolution,
            root_cause: summary.root_cause,
            category: summary.category,
            tags: summary.tags,
            script_id: summary.script_id,
            resolved: summary.outcome_hint == OutcomeHint::Resolved,
            closed_at: Utc::now(),
        };
        self.cases.close(case).await?;
        tracing::info!(case_id = %case_id, "closed case, assigned ticket number");

        let learning_result = self.learn(&case_id).await?;
        if !learning_result.warnings.is_empty() {
            tracing::warn!(case_id = %case_id, warnings = ?learning_result.warnings, "self-learning coordinator reported warnings");
        }
        let warnings = learning_result.warnings.clone();
        Ok(CloseCaseOutcome {
            ticket_number: case_id,
            learning_result,
            warnings,
        })
    }

    /// Run the self-learning coordinator for an already-closed case (spec
    /// §6 `learn`).
    ///
    /// # Errors
    ///
    /// Returns an error only if `case_id` cannot be loaded; every other
    /// stage is captured into the result's `warnings`.
    pub async fn learn(&self, case_id: &str) -> Result<LearningResult> {
        run_learn(&self.ctx, &*self.cases, &*self.conversations, &*self.learning_events, case_id).await
    }

    /// Apply a reviewer's decision to a pending learning event (spec §6,
    /// §4.9 `review`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::EventNotFound`] for an unknown id, or
    /// [`Error::AlreadyReviewed`] if the event already has a final status.
    pub async fn review(&self, input: ReviewInput) -> Result<ReviewResult> {
        let outcome = apply_review(
            &self.ctx,
            Arc::clone(&self.learning_events),
            &input.event_id,
            input.decision,
            input.reviewer_role,
            input.reason,
        )
        .await?;
        let event = self.learning_events.get(&input.event_id).await?;
        Ok(ReviewResult {
            event,
            activated_article_id: outcome.activated_article_id,
        })
    }
}
