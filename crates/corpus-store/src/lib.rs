//! Persistence for the support-corpus retrieval core: the Corpus Store
//! proper (spec §4.1), plus the Article, Provenance, Retrieval Log,
//! Execution Record, Learning Event, and Case tables the rest of the
//! system reads and writes (spec §6, Persisted state boundary).
//!
//! Each logical table gets its own small module and trait, the way
//! `dashflow-memory` bundles many independent persistence backends under
//! one crate rather than one God-object store.

pub mod article_store;
pub mod case_repository;
pub mod case_summary_catalog;
pub mod conversation_repository;
pub mod entry_store;
pub mod execution_log;
pub mod learning_event_store;
pub mod retrieval_log;
pub mod script_catalog;
pub mod vector;

pub use article_store::{ArticleStore, InMemoryArticleStore};
pub use case_repository::InMemoryCaseRepository;
pub use case_summary_catalog::{CaseSummary, CaseSummaryCatalog, InMemoryCaseSummaryCatalog};
pub use conversation_repository::InMemoryConversationRepository;
pub use entry_store::{CorpusStore, InMemoryCorpusStore};
pub use execution_log::{ExecutionLog, InMemoryExecutionLog};
pub use learning_event_store::{InMemoryLearningEventStore, LearningEventStore};
pub use retrieval_log::{InMemoryRetrievalLog, NewAttemptLogRow, RetrievalLog};
pub use script_catalog::{InMemoryScriptCatalog, ScriptCatalog, ScriptDetail};
