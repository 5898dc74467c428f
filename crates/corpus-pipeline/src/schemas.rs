//! Structured-generation wire types for the pipeline's three generation
//! calls (spec §4.3 nodes 1, 5, 7), plus the `schemars`-derived JSON
//! schemas `GenerationPort::generate_structured` validates against.
//!
//! Kept separate from [`corpus_core::model`] because these are the
//! *wire* shapes a generation provider fills in, not the domain types the
//! rest of the system stores; `nodes::*` converts between the two.

use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Render `T`'s JSON schema as a `serde_json::Value` for
/// `GenerationPort::generate_structured`.
pub fn schema_value<T: JsonSchema>() -> Value {
    serde_json::to_value(schema_for!(T)).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

/// Output of the `plan_query` node (spec §4.3 node 1).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PlanQueryOutput {
    /// 2-4 paraphrased query variants.
    pub queries: Vec<String>,
    /// Why these variants were chosen.
    pub rationale: String,
}

/// A single citation in [`AnswerOutput`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CitationOutput {
    /// `"SCRIPT"`, `"ARTICLE"`, or `"CASE_RESOLUTION"`.
    pub source_kind: String,
    /// The cited entry's source id.
    pub source_id: String,
    /// The cited entry's title, for display.
    pub title: String,
    /// The quoted span backing the claim.
    pub quote: String,
}

/// The model's self-reported confidence in [`AnswerOutput`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SelfConfidence {
    /// Low confidence in the synthesized answer.
    Low,
    /// Medium confidence.
    Medium,
    /// High confidence.
    High,
}

/// Output of the `write_answer` node (spec §4.3 node 5).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AnswerOutput {
    /// Synthesized, cited answer text.
    pub answer: String,
    /// Citations backing non-trivial claims in `answer`.
    pub citations: Vec<CitationOutput>,
    /// The model's self-reported confidence.
    pub self_confidence: SelfConfidence,
}

/// Wire form of [`corpus_core::model::Verdict`] (spec §4.3 node 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerdictWire {
    /// The resolution is already covered by an existing entry.
    Same,
    /// The resolution contradicts an existing entry.
    Contradicts,
    /// The resolution represents new knowledge.
    New,
}

impl From<VerdictWire> for corpus_core::model::Verdict {
    fn from(value: VerdictWire) -> Self {
        match value {
            VerdictWire::Same => corpus_core::model::Verdict::Same,
            VerdictWire::Contradicts => corpus_core::model::Verdict::Contradicts,
            VerdictWire::New => corpus_core::model::Verdict::New,
        }
    }
}

/// Output of the `classify_knowledge` node (spec §4.3 node 7, §4.6).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClassifyOutput {
    /// The classifier's verdict.
    pub verdict: VerdictWire,
    /// Free-text justification.
    pub reasoning: String,
    /// Source id of the best matching entry, if any.
    #[serde(default)]
    pub best_match_source_id: Option<String>,
    /// Similarity of the best match, if any.
    #[serde(default)]
    pub similarity_score: Option<f32>,
}
