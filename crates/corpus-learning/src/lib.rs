//! Gap classification, self-learning coordination, draft generation, and
//! review for the support-corpus retrieval core (spec §4.6-4.9).
//!
//! Gap classification itself (the generation call that tells `SAME` from
//! `CONTRADICTS` from `NEW`) lives in [`corpus_pipeline::nodes::classify`]
//! and is driven end to end by [`corpus_pipeline::run_gap`], since it
//! shares the retrieval/rerank/enrich nodes with the QA graph. This crate
//! is what sits on top of that graph: the coordinator that invokes it at
//! case closure, the generator that drafts an article when it returns
//! `NEW`/`CONTRADICTS`, and the gateway that turns a reviewer's decision
//! into corpus mutations.

pub mod coordinator;
pub mod draft;
pub mod review;
pub mod schemas;

pub use coordinator::{learn, ConfidenceUpdate, LearningResult};
pub use draft::generate_draft;
pub use review::{apply_review, ReviewDecision, ReviewOutcome};
