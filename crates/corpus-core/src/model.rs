//! The data model shared by every crate in the workspace (spec §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The three kinds of retrievable knowledge unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    /// A scripted fix / runbook step.
    Script,
    /// A curated knowledge-base article.
    Article,
    /// A resolved support case used as evidence.
    CaseResolution,
}

/// Composite primary key for a [`CorpusEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryKey {
    /// The entry's source kind.
    pub source_kind: SourceKind,
    /// The entry's source id, unique within its kind.
    pub source_id: String,
}

impl EntryKey {
    /// Construct a new key.
    pub fn new(source_kind: SourceKind, source_id: impl Into<String>) -> Self {
        Self {
            source_kind,
            source_id: source_id.into(),
        }
    }
}

/// The atom of knowledge: a single retrievable unit embedded into the shared
/// vector space (spec §3, Corpus Entry).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusEntry {
    /// Composite key.
    pub key: EntryKey,
    /// Human-readable title.
    pub title: String,
    /// Full text content.
    pub content: String,
    /// Optional category label.
    pub category: Option<String>,
    /// Optional module label.
    pub module: Option<String>,
    /// Optional free-form tags.
    pub tags: Vec<String>,
    /// Embedding vector, fixed dimension `D` for the life of a corpus.
    pub embedding: Vec<f32>,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
    /// Number of times this entry has been surfaced and used.
    pub usage_count: u64,
    /// Last time this row was mutated.
    pub updated_at: DateTime<Utc>,
}

/// A single evidence hit returned from a corpus search, before enrichment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hit {
    /// The underlying corpus entry.
    pub entry: CorpusEntry,
    /// Cosine-based similarity in `[0, 1]` (`1 - cosine_distance`).
    pub similarity: f32,
    /// Score assigned by the rerank port, if reranking ran.
    pub rerank_score: Option<f32>,
    /// Final blended score used for the user-facing ranking (spec §4.5).
    pub final_score: Option<f32>,
    /// Enrichment detail attached by the enrichment resolver, if any.
    pub detail: Option<EnrichmentDetail>,
}

impl Hit {
    /// Key of the underlying entry, used for dedup/merge bookkeeping.
    #[must_use]
    pub fn key(&self) -> EntryKey {
        self.entry.key.clone()
    }
}

/// Per-source-kind enrichment payload attached to a [`Hit`] (spec §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EnrichmentDetail {
    /// Provenance for an `ARTICLE` hit.
    Article {
        /// Linked case id, if the article was synthesized from one.
        linked_case_id: Option<String>,
        /// Linked conversation id, if the article was synthesized from one.
        linked_conversation_id: Option<String>,
        /// Referenced script id, if any.
        linked_script_id: Option<String>,
    },
    /// Purpose/inputs for a `SCRIPT` hit.
    Script {
        /// What the script is for.
        purpose: String,
        /// Inputs the script requires.
        required_inputs: Vec<String>,
    },
    /// Summary for a `CASE_RESOLUTION` hit.
    CaseResolution {
        /// Case subject.
        subject: String,
        /// How the case was resolved.
        resolution: String,
        /// Root cause, if recorded.
        root_cause: Option<String>,
    },
}

/// Lifecycle status of an [`Article`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArticleStatus {
    /// Live; appears in the corpus store.
    Active,
    /// Pending review; does not appear in the corpus store.
    Draft,
    /// Retired; does not appear in the corpus store.
    Archived,
}

/// Where an article came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArticleOrigin {
    /// Hand-authored, ingested at corpus bootstrap.
    Seed,
    /// Produced by the draft generator from a resolved case.
    Synthesized,
}

/// The human-readable knowledge artifact (spec §3, Article).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// `ART-<hex>` for seeds, `ART-SYN-<hex>` for synthetic articles.
    pub article_id: String,
    /// Title.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Owning module, if any.
    pub module: Option<String>,
    /// Category, if any.
    pub category: Option<String>,
    /// Lifecycle status.
    pub status: ArticleStatus,
    /// Seed vs synthesized.
    pub origin: ArticleOrigin,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// What a [`Provenance`] record points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProvenanceSourceKind {
    /// A resolved case.
    Case,
    /// A conversation transcript.
    Conversation,
    /// A scripted fix.
    Script,
}

/// How a provenance source relates to the article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relationship {
    /// The article was synthesized from this source.
    CreatedFrom,
    /// The article references this source but wasn't created from it.
    References,
}

/// A single provenance link for a synthesized article (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provenance {
    /// Owning article.
    pub article_id: String,
    /// Kind of source being linked.
    pub source_kind: ProvenanceSourceKind,
    /// Id of the linked source (empty-sentinel string if there was no script).
    pub source_id: String,
    /// How the source relates to the article.
    pub relationship: Relationship,
    /// A short quote/snippet backing the link.
    pub evidence_snippet: String,
    /// When the link was recorded.
    pub timestamp: DateTime<Utc>,
}

/// A closed support case (spec §3, Resolved Case). Immutable once closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedCase {
    /// Case id.
    pub case_id: String,
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
    /// Whether the case closed as resolved (vs. unresolved/escalated).
    pub resolved: bool,
    /// Close timestamp.
    pub closed_at: DateTime<Utc>,
}

/// Outcome stamped onto a retrieval log row at case closure (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptOutcome {
    /// The hit contributed to resolving the case.
    Resolved,
    /// The hit did not help.
    Unhelpful,
    /// The hit partially helped.
    Partial,
}

/// One row of the append-only retrieval audit log (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalAttemptLog {
    /// Row id.
    pub log_id: String,
    /// Linked case id; `null` until stamped at closure (spec P5).
    pub case_id: Option<String>,
    /// Owning conversation id.
    pub conversation_id: Option<String>,
    /// Which retry attempt within the run produced this row.
    pub attempt_no: u32,
    /// Original query text.
    pub query_text: String,
    /// Source kind of the evidence hit this row logs.
    pub source_kind: Option<SourceKind>,
    /// Source id of the evidence hit this row logs.
    pub source_id: Option<String>,
    /// Similarity score of the hit.
    pub similarity_score: Option<f32>,
    /// Outcome; `null` until stamped at closure (spec P5).
    pub outcome: Option<AttemptOutcome>,
    /// Owning execution record.
    pub execution_id: String,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
}

/// Which pipeline graph produced an [`ExecutionRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphKind {
    /// The question-answering graph.
    Qa,
    /// The gap-detection graph.
    Gap,
}

/// Terminal status of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Completed successfully.
    Ok,
    /// Failed with an error.
    Error,
    /// Completed, but evidence was insufficient to answer.
    InsufficientEvidence,
}

/// Pipeline-level observability row, one per end-to-end run (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Row id.
    pub execution_id: String,
    /// Which graph ran.
    pub graph_kind: GraphKind,
    /// Owning conversation id, for QA runs.
    pub conversation_id: Option<String>,
    /// Owning case id, for Gap runs.
    pub case_id: Option<String>,
    /// Original query text.
    pub query: String,
    /// Total wall-clock latency across all nodes.
    pub total_latency_ms: u64,
    /// Per-node latency breakdown, keyed by node name.
    pub per_node_latencies: HashMap<String, u64>,
    /// Tokens consumed by prompt input across generation calls.
    pub tokens_in: u64,
    /// Tokens produced across generation calls.
    pub tokens_out: u64,
    /// Number of evidence hits in the final `evidence` list.
    pub evidence_count: u32,
    /// Similarity of the top hit, if any.
    pub top_similarity: Option<f32>,
    /// Rerank score of the top hit, if any.
    pub top_rerank_score: Option<f32>,
    /// Gap-classification verdict, for Gap runs.
    pub classification: Option<Verdict>,
    /// Terminal status.
    pub status: ExecutionStatus,
    /// Captured error detail; logging failures land here, never propagate.
    pub error_message: Option<String>,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
}

/// The gap classifier's decision (spec §3, §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// The resolution is already covered by an existing entry.
    Same,
    /// The resolution contradicts an existing entry.
    Contradicts,
    /// The resolution represents new knowledge.
    New,
}

/// In-memory result of gap classification (spec §3, Knowledge Decision).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeDecision {
    /// The verdict.
    pub verdict: Verdict,
    /// Free-text reasoning from the generation port (or a fixed string for
    /// short-circuited verdicts).
    pub reasoning: String,
    /// Source id of the best matching entry, if any.
    pub best_match_source_id: Option<String>,
    /// Similarity of the best match, if any.
    pub similarity_score: Option<f32>,
}

/// Who/what finalized a [`LearningEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewerRole {
    /// A tier-3 support engineer.
    Tier3,
    /// Ops / knowledge-management staff.
    Ops,
    /// Auto-finalized by the system (used only for `CONFIRMED` events).
    System,
}

/// The kind of self-learning decision a [`LearningEvent`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// A gap: new knowledge proposed.
    Gap,
    /// A contradiction: a replacement draft proposed against a flagged article.
    Contradiction,
    /// A confirmation: the resolution matched existing knowledge.
    Confirmed,
}

/// Final human (or system) decision on a [`LearningEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalStatus {
    /// The proposal was approved.
    Approved,
    /// The proposal was rejected.
    Rejected,
}

/// An auditable record of a self-learning decision (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningEvent {
    /// Row id.
    pub event_id: String,
    /// The case whose closure triggered this event.
    pub triggering_case_id: String,
    /// Which kind of decision this is.
    pub event_kind: EventKind,
    /// Free-text description of the detected gap/contradiction/confirmation.
    pub detected_gap_text: String,
    /// The newly proposed article, for `GAP`/`CONTRADICTION` events.
    pub proposed_article_id: Option<String>,
    /// The existing article flagged as contradicted, for `CONTRADICTION` events.
    pub flagged_article_id: Option<String>,
    /// Human-readable summary of the draft.
    pub draft_summary: String,
    /// Final decision; `null` until reviewed (spec P6).
    pub final_status: Option<FinalStatus>,
    /// Who is expected to (or did) review this event.
    pub reviewer_role: ReviewerRole,
    /// Reason recorded alongside the final decision; `null` until reviewed,
    /// always set alongside `final_status` (spec §4.9).
    pub review_reason: Option<String>,
    /// Row creation time.
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_key_equality_is_structural() {
        let a = EntryKey::new(SourceKind::Script, "SCR-1");
        let b = EntryKey::new(SourceKind::Script, "SCR-1");
        let c = EntryKey::new(SourceKind::Article, "SCR-1");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn hit_key_matches_underlying_entry() {
        let entry = CorpusEntry {
            key: EntryKey::new(SourceKind::Article, "ART-1"),
            title: "t".into(),
            content: "c".into(),
            category: None,
            module: None,
            tags: vec![],
            embedding: vec![0.0; 3],
            confidence: 0.5,
            usage_count: 0,
            updated_at: Utc::now(),
        };
        let hit = Hit {
            entry: entry.clone(),
            similarity: 0.9,
            rerank_score: None,
            final_score: None,
            detail: None,
        };
        assert_eq!(hit.key(), entry.key);
    }
}
