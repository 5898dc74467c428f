//! Self-Learning Coordinator (spec §4.7): the synchronous sequence run on
//! case closure — link logs, score outcomes, run gap detection, act on the
//! verdict. Three of those four stages are best-effort: a failure in any
//! one is captured into `warnings` rather than aborting the run. The only
//! fatal error is failing to load the closed case itself.

use crate::draft;
use chrono::Utc;
use corpus_core::error::Result;
use corpus_core::model::{AttemptOutcome, EventKind, FinalStatus, Hit, LearningEvent, ReviewerRole, SourceKind, Verdict};
use corpus_core::ports::{CaseRepository, ConversationRepository};
use corpus_pipeline::{gap, PipelineContext, RetrievalFilters};
use corpus_store::LearningEventStore;
use uuid::Uuid;

/// One row's confidence after an `adjust_confidence` call made during
/// scoring or verdict-acting.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfidenceUpdate {
    /// Which entry was adjusted.
    pub source_kind: SourceKind,
    /// Which entry was adjusted.
    pub source_id: String,
    /// Its confidence after the adjustment.
    pub new_confidence: f32,
}

/// Output of a coordinator run (spec §6 `learn(case_id)`).
#[derive(Debug, Clone, Default)]
pub struct LearningResult {
    /// Number of retrieval log rows linked and scored.
    pub retrieval_logs_processed: usize,
    /// Every confidence adjustment made during scoring and verdict-acting.
    pub confidence_updates: Vec<ConfidenceUpdate>,
    /// The gap classifier's verdict, if gap detection ran successfully.
    pub verdict: Option<Verdict>,
    /// The best-matching entry's `source_id`, for `SAME`/`CONTRADICTS`.
    pub matched_article_id: Option<String>,
    /// The best match's similarity, for `SAME`/`CONTRADICTS`.
    pub similarity: Option<f32>,
    /// The learning event created, if any.
    pub learning_event_id: Option<String>,
    /// The draft article created, for `NEW`/`CONTRADICTS`.
    pub drafted_article_id: Option<String>,
    /// Non-fatal failures from the three best-effort stages.
    pub warnings: Vec<String>,
}

fn source_kind_of(evidence: &[Hit], source_id: &str) -> Option<SourceKind> {
    evidence.iter().find(|hit| hit.entry.key.source_id == source_id).map(|hit| hit.entry.key.source_kind)
}

/// Build the gap-detection query string: `subject + root_cause + category +
/// resolution`, empty fields skipped, in that exact order (spec §4.7 step 3).
fn build_gap_query(case: &corpus_core::model::ResolvedCase) -> String {
    [
        Some(case.subject.as_str()),
        case.root_cause.as_deref(),
        case.category.as_deref(),
        Some(case.resolution.as_str()),
    ]
    .into_iter()
    .flatten()
    .filter(|s| !s.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
}

/// Run the coordinator sequence for a just-closed case.
///
/// # Errors
///
/// Returns an error only if the case itself cannot be loaded; every other
/// stage degrades into a `warnings` entry.
pub async fn learn(
    ctx: &PipelineContext,
    cases: &dyn CaseRepository,
    conversations: &dyn ConversationRepository,
    learning_events: &dyn LearningEventStore,
    case_id: &str,
) -> Result<LearningResult> {
    let case = cases.load(case_id).await?;
    let mut result = LearningResult::default();

    // Stage 1-2: link logs, then score outcomes.
    match ctx.retrieval_log.link_to_case(&case.conversation_id, case_id).await {
        Ok(linked_ids) => {
            result.retrieval_logs_processed = linked_ids.len();
            let outcome = if case.resolved {
                AttemptOutcome::Resolved
            } else {
                AttemptOutcome::Unhelpful
            };
            if let Err(error) = ctx.retrieval_log.stamp_outcomes(&linked_ids, outcome).await {
                result.warnings.push(format!("outcome_stamping_failed: {error}"));
            }
            match ctx.retrieval_log.rows_for_case(case_id).await {
                Ok(rows) => {
                    let delta = match outcome {
                        AttemptOutcome::Resolved => ctx.config.confidence_delta_resolved,
                        AttemptOutcome::Partial => ctx.config.confidence_delta_partial,
                        AttemptOutcome::Unhelpful => ctx.config.confidence_delta_unhelpful,
                    };
                    for row in rows {
                        let (Some(source_kind), Some(source_id)) = (row.source_kind, row.source_id) else {
                            continue;
                        };
                        match ctx.corpus_store.adjust_confidence(source_kind, &source_id, delta, false).await {
                            Ok((new_confidence, _)) => result.confidence_updates.push(ConfidenceUpdate {
                                source_kind,
                                source_id,
                                new_confidence,
                            }),
                            Err(error) => result.warnings.push(format!("confidence_update_failed({source_id}): {error}")),
                        }
                    }
                }
                Err(error) => result.warnings.push(format!("outcome_scoring_failed: {error}")),
            }
        }
        Err(error) => result.warnings.push(format!("log_linkage_failed: {error}")),
    }

    // Stage 3: run gap detection.
    let gap_input = gap::GapInput {
        query: build_gap_query(&case),
        filters: RetrievalFilters {
            category: case.category.clone(),
            source_kinds: None,
            top_k: ctx.config.default_top_k,
        },
    };
    let execution_id = Uuid::new_v4().to_string();
    let outcome = match gap::run_gap(ctx, gap_input, &case, execution_id).await {
        Ok(outcome) => outcome,
        Err(error) => {
            result.warnings.push(format!("gap_detection_failed: {error}"));
            return Ok(result);
        }
    };

    result.verdict = Some(outcome.decision.verdict);
    result.matched_article_id = outcome.decision.best_match_source_id.clone();
    result.similarity = outcome.decision.similarity_score;

    // Stage 4: act on the verdict. Not one of the three best-effort
    // stages named in spec §4.7, but failures here still must not make
    // `close_case`/`learn` fail outright (spec §6: "all other stages are
    // captured as warnings").
    if let Err(error) = act_on_verdict(ctx, conversations, learning_events, &case, &outcome, &mut result).await {
        result.warnings.push(format!("verdict_action_failed: {error}"));
    }

    Ok(result)
}

async fn act_on_verdict(
    ctx: &PipelineContext,
    conversations: &dyn ConversationRepository,
    learning_events: &dyn LearningEventStore,
    case: &corpus_core::model::ResolvedCase,
    outcome: &gap::GapOutcome,
    result: &mut LearningResult,
) -> Result<()> {
    match outcome.decision.verdict {
        Verdict::Same => {
            if let Some(source_id) = &outcome.decision.best_match_source_id {
                if let Some(source_kind) = source_kind_of(&outcome.evidence, source_id) {
                    let (new_confidence, _) = ctx
                        .corpus_store
                        .adjust_confidence(source_kind, source_id, ctx.config.confidence_delta_confirmed, false)
                        .await?;
                    result.confidence_updates.push(ConfidenceUpdate {
                        source_kind,
                        source_id: source_id.clone(),
                        new_confidence,
                    });
                }
            }
            let event = LearningEvent {
                event_id: Uuid::new_v4().to_string(),
                triggering_case_id: case.case_id.clone(),
                event_kind: EventKind::Confirmed,
                detected_gap_text: outcome.decision.reasoning.clone(),
                proposed_article_id: None,
                flagged_article_id: None,
                draft_summary: String::new(),
                final_status: Some(FinalStatus::Approved),
                reviewer_role: ReviewerRole::System,
                review_reason: Some("auto-confirmed: resolution matches existing knowledge".to_string()),
                timestamp: Utc::now(),
            };
            result.learning_event_id = Some(event.event_id.clone());
            learning_events.insert(event).await?;
            Ok(())
        }
        Verdict::New => {
            let article = draft::generate_draft(ctx, conversations, case, None).await?;
            let event = LearningEvent {
                event_id: Uuid::new_v4().to_string(),
                triggering_case_id: case.case_id.clone(),
                event_kind: EventKind::Gap,
                detected_gap_text: outcome.decision.reasoning.clone(),
                proposed_article_id: Some(article.article_id.clone()),
                flagged_article_id: None,
                draft_summary: article.title.clone(),
                final_status: None,
                reviewer_role: ReviewerRole::Tier3,
                review_reason: None,
                timestamp: Utc::now(),
            };
            result.drafted_article_id = Some(article.article_id);
            result.learning_event_id = Some(event.event_id.clone());
            learning_events.insert(event).await?;
            Ok(())
        }
        Verdict::Contradicts => {
            let flagged_source_id = outcome
                .decision
                .best_match_source_id
                .clone()
                .ok_or_else(|| corpus_core::error::Error::other("CONTRADICTS verdict with no best_match_source_id"))?;
            let flagged_article = ctx.article_store.get(&flagged_source_id).await?;
            let article = draft::generate_draft(ctx, conversations, case, Some(&flagged_article)).await?;
            let event = LearningEvent {
                event_id: Uuid::new_v4().to_string(),
                triggering_case_id: case.case_id.clone(),
                event_kind: EventKind::Contradiction,
                detected_gap_text: outcome.decision.reasoning.clone(),
                proposed_article_id: Some(article.article_id.clone()),
                flagged_article_id: Some(flagged_source_id),
                draft_summary: article.title.clone(),
                final_status: None,
                reviewer_role: ReviewerRole::Tier3,
                review_reason: None,
                timestamp: Utc::now(),
            };
            result.drafted_article_id = Some(article.article_id);
            result.learning_event_id = Some(event.event_id.clone());
            learning_events.insert(event).await?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corpus_core::config::CorpusConfig;
    use corpus_core::model::{CorpusEntry, EntryKey, ResolvedCase};
    use corpus_providers::mocks::{MockEmbeddingPort, ScriptedGenerationPort};
    use corpus_store::{
        CorpusStore, InMemoryArticleStore, InMemoryCaseRepository, InMemoryCaseSummaryCatalog, InMemoryConversationRepository,
        InMemoryCorpusStore, InMemoryExecutionLog, InMemoryLearningEventStore, InMemoryRetrievalLog, InMemoryScriptCatalog,
        NewAttemptLogRow, RetrievalLog,
    };
    use std::sync::Arc;

    fn article_entry(source_id: &str, similarity_embedding: Vec<f32>) -> CorpusEntry {
        CorpusEntry {
            key: EntryKey::new(SourceKind::Article, source_id),
            title: "Rotate client cert".into(),
            content: "rotate the expired vpn client certificate".into(),
            category: Some("Networking".into()),
            module: None,
            tags: vec![],
            embedding: similarity_embedding,
            confidence: 0.6,
            usage_count: 0,
            updated_at: Utc::now(),
        }
    }

    fn closed_case(resolved: bool) -> ResolvedCase {
        ResolvedCase {
            case_id: "CASE-1".into(),
            conversation_id: "conv-1".into(),
            subject: "VPN handshake fails".into(),
            description: "client cannot connect".into(),
            resolution: "rotate expired client cert".into(),
            root_cause: Some("expired cert".into()),
            category: Some("Networking".into()),
            tags: vec![],
            script_id: None,
            resolved,
            closed_at: Utc::now(),
        }
    }

    struct Harness {
        ctx: PipelineContext,
        cases: InMemoryCaseRepository,
        conversations: InMemoryConversationRepository,
        learning_events: InMemoryLearningEventStore,
        retrieval_log: Arc<InMemoryRetrievalLog>,
    }

    fn harness(generation: ScriptedGenerationPort, corpus_store: InMemoryCorpusStore) -> Harness {
        let retrieval_log = Arc::new(InMemoryRetrievalLog::new());
        let ctx = PipelineContext {
            embedding: Arc::new(MockEmbeddingPort::new(8)),
            generation: Arc::new(generation),
            rerank: None,
            corpus_store: Arc::new(corpus_store),
            article_store: Arc::new(InMemoryArticleStore::new()),
            script_catalog: Arc::new(InMemoryScriptCatalog::new()),
            case_summaries: Arc::new(InMemoryCaseSummaryCatalog::new()),
            retrieval_log: Arc::clone(&retrieval_log) as _,
            execution_log: Arc::new(InMemoryExecutionLog::new()),
            config: CorpusConfig::default(),
        };
        let cases = InMemoryCaseRepository::new();
        cases.insert(closed_case(true));
        let conversations = InMemoryConversationRepository::new();
        conversations.insert("conv-1", "customer: vpn down\nagent: rotate your cert");
        Harness {
            ctx,
            cases,
            conversations,
            learning_events: InMemoryLearningEventStore::new(),
            retrieval_log,
        }
    }

    #[tokio::test]
    async fn same_verdict_emits_confirmed_event_and_bumps_confidence() {
        let store = InMemoryCorpusStore::new();
        store.upsert(article_entry("ART-1", vec![1.0; 8])).await.unwrap();
        let generation = ScriptedGenerationPort::new(vec![
            serde_json::json!({"queries": ["rotate expired vpn cert"], "rationale": "r"}),
            serde_json::json!({
                "verdict": "SAME",
                "reasoning": "ART-1 covers this",
                "best_match_source_id": "ART-1",
                "similarity_score": 0.9,
            }),
        ]);
        let h = harness(generation, store);
        h.retrieval_log
            .append(NewAttemptLogRow {
                conversation_id: Some("conv-1".into()),
                attempt_no: 0,
                query_text: "vpn down".into(),
                source_kind: Some(SourceKind::Article),
                source_id: Some("ART-1".into()),
                similarity_score: Some(0.9),
                execution_id: "exec-0".into(),
            })
            .await
            .unwrap();

        let result = learn(&h.ctx, &h.cases, &h.conversations, &h.learning_events, "CASE-1").await.unwrap();
        assert_eq!(result.verdict, Some(Verdict::Same));
        assert_eq!(result.retrieval_logs_processed, 1);
        assert!(result.warnings.is_empty());
        assert!(result.drafted_article_id.is_none());
        let event = h.learning_events.get(result.learning_event_id.as_ref().unwrap()).await.unwrap();
        assert_eq!(event.event_kind, EventKind::Confirmed);
        assert_eq!(event.final_status, Some(FinalStatus::Approved));
        assert_eq!(event.reviewer_role, ReviewerRole::System);
        // One confidence bump from scoring (resolved, +0.10) plus one from
        // the SAME verdict (+0.05).
        assert_eq!(result.confidence_updates.len(), 2);
    }

    #[tokio::test]
    async fn new_verdict_drafts_an_article_with_pending_gap_event() {
        let store = InMemoryCorpusStore::new();
        let generation = ScriptedGenerationPort::new(vec![
            serde_json::json!({"queries": ["rotate expired vpn cert"], "rationale": "r"}),
            serde_json::json!({
                "title": "Rotate an expired VPN client certificate",
                "body": "Rotate the client cert when the VPN handshake fails.",
                "tags": [],
                "module": serde_json::Value::Null,
                "category": "Networking",
                "related_error_codes": [],
                "resolution_steps": ["Run rotate-cert.sh"],
                "internal_notes": "",
            }),
        ]);
        let h = harness(generation, store);

        let result = learn(&h.ctx, &h.cases, &h.conversations, &h.learning_events, "CASE-1").await.unwrap();
        assert_eq!(result.verdict, Some(Verdict::New));
        assert!(result.drafted_article_id.is_some());
        let event = h.learning_events.get(result.learning_event_id.as_ref().unwrap()).await.unwrap();
        assert_eq!(event.event_kind, EventKind::Gap);
        assert!(event.final_status.is_none());
        assert_eq!(event.proposed_article_id.as_deref(), result.drafted_article_id.as_deref());
    }

    #[tokio::test]
    async fn case_load_failure_is_fatal() {
        let h = harness(ScriptedGenerationPort::new(vec![]), InMemoryCorpusStore::new());
        let result = learn(&h.ctx, &h.cases, &h.conversations, &h.learning_events, "GHOST").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn gap_detection_failure_is_captured_as_a_warning_not_a_fatal_error() {
        let store = InMemoryCorpusStore::new();
        // plan_query succeeds, retrieve/classify never get a scripted
        // response to consume because classify_knowledge's generation
        // call exhausts the scripted queue and returns a provider error.
        let generation = ScriptedGenerationPort::new(vec![serde_json::json!({
            "queries": ["rotate expired vpn cert"],
            "rationale": "r",
        })]);
        store.upsert(article_entry("ART-1", vec![1.0; 8])).await.unwrap();
        let h = harness(generation, store);

        let result = learn(&h.ctx, &h.cases, &h.conversations, &h.learning_events, "CASE-1").await.unwrap();
        assert!(result.verdict.is_none());
        assert!(result.learning_event_id.is_none());
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].starts_with("gap_detection_failed"));
        // Scoring still ran: log linkage/confidence are independent of gap detection.
        assert_eq!(result.retrieval_logs_processed, 0);
    }
}
