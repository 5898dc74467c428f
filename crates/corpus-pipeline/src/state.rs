//! The single mutable state record threaded through every node (spec
//! §4.3). A plain data struct, not a trait hierarchy, per the spec's own
//! design note (§9: "the state object should be a plain record; node
//! functions take state and return state").

use corpus_core::model::{EntryKey, ExecutionStatus, GraphKind, Hit, KnowledgeDecision, SourceKind};
use std::collections::HashMap;

/// A citation attached to a synthesized QA answer.
#[derive(Debug, Clone)]
pub struct Citation {
    /// Cited entry's source kind.
    pub source_kind: SourceKind,
    /// Cited entry's source id.
    pub source_id: String,
    /// Cited entry's title, for display.
    pub title: String,
    /// The quoted span backing the claim.
    pub quote: String,
}

/// Caller-supplied filters and knobs common to both graphs.
#[derive(Debug, Clone)]
pub struct RetrievalFilters {
    /// Category substring filter, case-insensitive.
    pub category: Option<String>,
    /// Restrict candidates to these source kinds.
    pub source_kinds: Option<Vec<SourceKind>>,
    /// Requested `top_k`.
    pub top_k: usize,
}

/// The shared mutable state a pipeline run carries from node to node.
pub struct PipelineState {
    /// Which graph is running.
    pub graph_kind: GraphKind,
    /// Original query text (unchanged across retries).
    pub query: String,
    /// Category filter, if any.
    pub category: Option<String>,
    /// Source-kind filter, if any.
    pub source_kinds: Option<Vec<SourceKind>>,
    /// Current `top_k`; widened on QA retry (spec §4.3 node 6).
    pub top_k: usize,
    /// Paraphrased query variants from `plan_query`.
    pub query_variants: Vec<String>,
    /// Best-similarity-wins merge of every variant's search hits (spec P1).
    pub candidates: HashMap<EntryKey, Hit>,
    /// Reranked, truncated, scored evidence (post node 3/4).
    pub evidence: Vec<Hit>,
    /// Synthesized answer, QA only.
    pub answer: Option<String>,
    /// Citations backing the answer, QA only.
    pub citations: Option<Vec<Citation>>,
    /// Gap classifier's decision, Gap only.
    pub decision: Option<KnowledgeDecision>,
    /// `0` on first pass, `1` after the single QA retry (spec §4.3 node 6).
    pub attempt_no: u32,
    /// Terminal status once the run completes.
    pub status: ExecutionStatus,
    /// Owning case, Gap runs.
    pub case_id: Option<String>,
    /// Owning conversation, QA runs.
    pub conversation_id: Option<String>,
    /// This run's execution id (spans all QA retry attempts).
    pub execution_id: String,
    /// Per-node latency in milliseconds.
    pub per_node_latencies: HashMap<String, u64>,
    /// Cumulative prompt tokens across generation calls this run.
    pub tokens_in: u64,
    /// Cumulative completion tokens across generation calls this run.
    pub tokens_out: u64,
}

impl PipelineState {
    /// Construct the initial state for a QA run.
    #[must_use]
    pub fn new_qa(query: String, filters: RetrievalFilters, conversation_id: Option<String>, execution_id: String) -> Self {
        Self {
            graph_kind: GraphKind::Qa,
            query,
            category: filters.category,
            source_kinds: filters.source_kinds,
            top_k: filters.top_k,
            query_variants: Vec::new(),
            candidates: HashMap::new(),
            evidence: Vec::new(),
            answer: None,
            citations: None,
            decision: None,
            attempt_no: 0,
            status: ExecutionStatus::Ok,
            case_id: None,
            conversation_id,
            execution_id,
            per_node_latencies: HashMap::new(),
            tokens_in: 0,
            tokens_out: 0,
        }
    }

    /// Construct the initial state for a Gap run.
    #[must_use]
    pub fn new_gap(query: String, filters: RetrievalFilters, case_id: String, execution_id: String) -> Self {
        Self {
            graph_kind: GraphKind::Gap,
            query,
            category: filters.category,
            source_kinds: filters.source_kinds,
            top_k: filters.top_k,
            query_variants: Vec::new(),
            candidates: HashMap::new(),
            evidence: Vec::new(),
            answer: None,
            citations: None,
            decision: None,
            attempt_no: 0,
            status: ExecutionStatus::Ok,
            case_id: Some(case_id),
            conversation_id: None,
            execution_id,
            per_node_latencies: HashMap::new(),
            tokens_in: 0,
            tokens_out: 0,
        }
    }

    /// Clear everything downstream of `retrieve`, as the QA retry policy
    /// requires (spec §4.3 node 6): candidates, evidence, answer, citations.
    pub fn reset_for_retry(&mut self) {
        self.candidates.clear();
        self.evidence.clear();
        self.answer = None;
        self.citations = None;
    }
}
