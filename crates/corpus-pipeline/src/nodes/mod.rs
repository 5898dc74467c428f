//! The individual pipeline nodes (spec §4.3). Each is a free async
//! function over `&PipelineContext` and `&mut PipelineState`; the QA and
//! Gap graphs (`crate::qa`, `crate::gap`) call them in the order the spec
//! prescribes rather than through a generic graph-interpreter
//! abstraction, per the spec's own design note (§9) that a graph here is
//! "a list of node references over a common state type".

pub mod classify;
pub mod enrich_sources;
pub mod log_retrieval;
pub mod plan_query;
pub mod rerank;
pub mod retrieve;
pub mod validate;
pub mod write_answer;

pub use classify::classify_knowledge;
pub use enrich_sources::enrich_sources;
pub use log_retrieval::log_retrieval;
pub use plan_query::plan_query;
pub use rerank::rerank;
pub use retrieve::retrieve;
pub use validate::{validate, ValidateOutcome};
pub use write_answer::write_answer;
