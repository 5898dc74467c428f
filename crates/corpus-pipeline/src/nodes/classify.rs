//! Node 7: `classify_knowledge` (Gap only). Decides whether a resolved
//! case's resolution is already covered, contradicts, or extends the
//! corpus (spec §4.3 node 7, §4.6).

use crate::context::PipelineContext;
use crate::schemas::{schema_value, ClassifyOutput};
use crate::state::PipelineState;
use corpus_core::error::{Error, Result};
use corpus_core::model::{KnowledgeDecision, ResolvedCase, Verdict};
use corpus_core::ports::GenerationMessage;

const SYSTEM_PROMPT: &str = "You are a knowledge-gap classifier for a customer-support knowledge \
base. Compare how a case was actually resolved against the best matching existing knowledge-base \
entries. Decide SAME if an existing entry already covers this resolution, CONTRADICTS if an \
existing entry describes a different or outdated fix, or NEW if no existing entry covers it.";

/// Fixed reasoning used when there is no evidence to compare against at all.
const NO_EVIDENCE_REASONING: &str = "no existing corpus entries matched this case; classified as new knowledge by default";

/// Run the `classify_knowledge` node.
pub async fn classify_knowledge(ctx: &PipelineContext, state: &mut PipelineState, case: &ResolvedCase) -> Result<KnowledgeDecision> {
    if state.evidence.is_empty() {
        return Ok(KnowledgeDecision {
            verdict: Verdict::New,
            reasoning: NO_EVIDENCE_REASONING.to_string(),
            best_match_source_id: None,
            similarity_score: None,
        });
    }

    let top_hits: Vec<_> = state.evidence.iter().take(5).collect();
    let evidence_block = top_hits
        .iter()
        .map(|hit| {
            let detail = match &hit.detail {
                Some(d) => format!("{d:?}"),
                None => "(unenriched)".to_string(),
            };
            format!(
                "- source_kind={:?} source_id={} title={:?} similarity={:.3} detail={detail}",
                hit.entry.key.source_kind, hit.entry.key.source_id, hit.entry.title, hit.similarity
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let user_prompt = format!(
        "Case subject: {}\nResolution: {}\nRoot cause: {}\n\nCandidate existing entries:\n{evidence_block}",
        case.subject,
        case.resolution,
        case.root_cause.as_deref().unwrap_or("(unknown)"),
    );
    let messages = [GenerationMessage::system(SYSTEM_PROMPT), GenerationMessage::user(user_prompt)];
    let schema = schema_value::<ClassifyOutput>();

    let (value, usage) = ctx.generation.generate_structured(&messages, &schema, 0.0).await?;
    let parsed: ClassifyOutput =
        serde_json::from_value(value).map_err(|e| Error::other(format!("classify_knowledge: malformed response: {e}")))?;

    state.tokens_in += usage.tokens_in;
    state.tokens_out += usage.tokens_out;

    let mut verdict: Verdict = parsed.verdict.into();
    // `state.evidence` is ordered by blended `final_score` (scoring::apply_and_sort), not by
    // raw similarity, so the floor check (spec §4.6) must scan for the highest similarity
    // rather than assume index 0 carries it.
    let best_similarity = state
        .evidence
        .iter()
        .map(|hit| hit.similarity)
        .fold(f32::NEG_INFINITY, f32::max);
    if best_similarity < ctx.config.gap_similarity_threshold {
        verdict = Verdict::New;
    }

    Ok(KnowledgeDecision {
        verdict,
        reasoning: parsed.reasoning,
        best_match_source_id: parsed.best_match_source_id,
        similarity_score: parsed.similarity_score.or(Some(best_similarity)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PipelineContext;
    use crate::state::RetrievalFilters;
    use chrono::Utc;
    use corpus_core::config::CorpusConfig;
    use corpus_core::model::{CorpusEntry, EntryKey, Hit, SourceKind};
    use corpus_providers::mocks::{MockEmbeddingPort, ScriptedGenerationPort};
    use corpus_store::{
        InMemoryArticleStore, InMemoryCaseSummaryCatalog, InMemoryCorpusStore, InMemoryExecutionLog, InMemoryRetrievalLog,
        InMemoryScriptCatalog,
    };
    use std::sync::Arc;

    fn case() -> ResolvedCase {
        ResolvedCase {
            case_id: "CASE-1".into(),
            conversation_id: "conv-1".into(),
            subject: "VPN handshake fails".into(),
            description: "client cannot connect".into(),
            resolution: "rotate expired client cert".into(),
            root_cause: Some("expired cert".into()),
            category: None,
            tags: vec![],
            script_id: None,
            resolved: true,
            closed_at: Utc::now(),
        }
    }

    fn hit(source_id: &str, similarity: f32) -> Hit {
        Hit {
            entry: CorpusEntry {
                key: EntryKey::new(SourceKind::Article, source_id),
                title: "t".into(),
                content: "c".into(),
                category: None,
                module: None,
                tags: vec![],
                embedding: vec![1.0],
                confidence: 0.5,
                usage_count: 0,
                updated_at: Utc::now(),
            },
            similarity,
            rerank_score: None,
            final_score: None,
            detail: None,
        }
    }

    fn context(generation: ScriptedGenerationPort) -> PipelineContext {
        PipelineContext {
            embedding: Arc::new(MockEmbeddingPort::new(8)),
            generation: Arc::new(generation),
            rerank: None,
            corpus_store: Arc::new(InMemoryCorpusStore::new()),
            article_store: Arc::new(InMemoryArticleStore::new()),
            script_catalog: Arc::new(InMemoryScriptCatalog::new()),
            case_summaries: Arc::new(InMemoryCaseSummaryCatalog::new()),
            retrieval_log: Arc::new(InMemoryRetrievalLog::new()),
            execution_log: Arc::new(InMemoryExecutionLog::new()),
            config: CorpusConfig::default(),
        }
    }

    fn state() -> PipelineState {
        let filters = RetrievalFilters {
            category: None,
            source_kinds: None,
            top_k: 5,
        };
        PipelineState::new_gap("rotate expired client cert".into(), filters, "CASE-1".into(), "exec-1".into())
    }

    #[tokio::test]
    async fn empty_evidence_short_circuits_to_new_without_calling_generation() {
        let generation = ScriptedGenerationPort::new(vec![]);
        let ctx = context(generation);
        let mut state = state();
        let decision = classify_knowledge(&ctx, &mut state, &case()).await.unwrap();
        assert_eq!(decision.verdict, Verdict::New);
        assert_eq!(decision.reasoning, NO_EVIDENCE_REASONING);
    }

    #[tokio::test]
    async fn low_similarity_forces_new_regardless_of_model_verdict() {
        let generation = ScriptedGenerationPort::new(vec![serde_json::json!({
            "verdict": "SAME",
            "reasoning": "looks identical to ART-1",
            "best_match_source_id": "ART-1",
            "similarity_score": 0.6,
        })]);
        let ctx = context(generation);
        let mut state = state();
        state.evidence.push(hit("ART-1", 0.6));
        let decision = classify_knowledge(&ctx, &mut state, &case()).await.unwrap();
        assert_eq!(decision.verdict, Verdict::New);
    }

    #[tokio::test]
    async fn floor_check_scans_all_evidence_not_just_the_first_entry() {
        // evidence[0] carries a low similarity (as it would after scoring::apply_and_sort
        // reorders by blended final_score rather than raw similarity) while a later entry
        // clears the threshold; the floor check must still find it.
        let generation = ScriptedGenerationPort::new(vec![serde_json::json!({
            "verdict": "SAME",
            "reasoning": "looks identical to ART-2",
            "best_match_source_id": "ART-2",
            "similarity_score": 0.9,
        })]);
        let ctx = context(generation);
        let mut state = state();
        state.evidence.push(hit("ART-1", 0.2));
        state.evidence.push(hit("ART-2", 0.9));
        let decision = classify_knowledge(&ctx, &mut state, &case()).await.unwrap();
        assert_eq!(decision.verdict, Verdict::Same);
    }

    #[tokio::test]
    async fn sufficient_similarity_honors_model_verdict() {
        let generation = ScriptedGenerationPort::new(vec![serde_json::json!({
            "verdict": "CONTRADICTS",
            "reasoning": "existing article says to reboot, not rotate the cert",
            "best_match_source_id": "ART-1",
            "similarity_score": 0.9,
        })]);
        let ctx = context(generation);
        let mut state = state();
        state.evidence.push(hit("ART-1", 0.9));
        let decision = classify_knowledge(&ctx, &mut state, &case()).await.unwrap();
        assert_eq!(decision.verdict, Verdict::Contradicts);
        assert_eq!(decision.best_match_source_id.as_deref(), Some("ART-1"));
    }
}
