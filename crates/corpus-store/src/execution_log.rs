//! Pipeline-level observability rows (spec §3, Execution Record).

use async_trait::async_trait;
use corpus_core::error::Result;
use corpus_core::model::ExecutionRecord;
use dashmap::DashMap;

/// Write-only append of [`ExecutionRecord`] rows, plus read-back for tests
/// and diagnostics.
#[async_trait]
pub trait ExecutionLog: Send + Sync {
    /// Append one execution record. Never fails the caller's pipeline run;
    /// logging errors belong in the record's own `error_message` field
    /// (spec §7), not in this call's `Result`.
    async fn append(&self, record: ExecutionRecord) -> Result<()>;

    /// Fetch a record by id, for tests and diagnostics.
    async fn get(&self, execution_id: &str) -> Option<ExecutionRecord>;
}

/// In-memory [`ExecutionLog`].
#[derive(Default)]
pub struct InMemoryExecutionLog {
    rows: DashMap<String, ExecutionRecord>,
}

impl InMemoryExecutionLog {
    /// Construct an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
        }
    }
}

#[async_trait]
impl ExecutionLog for InMemoryExecutionLog {
    async fn append(&self, record: ExecutionRecord) -> Result<()> {
        self.rows.insert(record.execution_id.clone(), record);
        Ok(())
    }

    async fn get(&self, execution_id: &str) -> Option<ExecutionRecord> {
        self.rows.get(execution_id).map(|r| r.value().clone())
    }
}
