//! Script purpose/required-inputs lookup used by the enrichment resolver
//! for `SCRIPT` hits (spec §4.4). A standalone table rather than a field on
//! [`crate::entry_store::CorpusEntry`] because scripts carry structured
//! operational metadata (required inputs) that the vector-searchable
//! entry's `content` text does not need to repeat.

use async_trait::async_trait;
use corpus_core::error::Result;
use dashmap::DashMap;
use std::collections::HashMap;

/// Operational detail about a scripted fix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptDetail {
    /// What the script is for.
    pub purpose: String,
    /// Inputs the script requires to run.
    pub required_inputs: Vec<String>,
}

/// Batched script metadata lookup.
#[async_trait]
pub trait ScriptCatalog: Send + Sync {
    /// Fetch detail for every id in `script_ids` that exists, keyed by id.
    /// Missing ids are simply absent from the result (enrichment marks
    /// those hits unenriched rather than failing the batch).
    async fn details_for(&self, script_ids: &[String]) -> Result<HashMap<String, ScriptDetail>>;
}

/// In-memory [`ScriptCatalog`], seeded by ingestion/tests.
#[derive(Default)]
pub struct InMemoryScriptCatalog {
    rows: DashMap<String, ScriptDetail>,
}

impl InMemoryScriptCatalog {
    /// Construct an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self { rows: DashMap::new() }
    }

    /// Seed a script's detail.
    pub fn insert(&self, script_id: impl Into<String>, purpose: impl Into<String>, required_inputs: Vec<String>) {
        self.rows.insert(
            script_id.into(),
            ScriptDetail {
                purpose: purpose.into(),
                required_inputs,
            },
        );
    }
}

#[async_trait]
impl ScriptCatalog for InMemoryScriptCatalog {
    async fn details_for(&self, script_ids: &[String]) -> Result<HashMap<String, ScriptDetail>> {
        Ok(script_ids
            .iter()
            .filter_map(|id| self.rows.get(id).map(|v| (id.clone(), v.value().clone())))
            .collect())
    }
}
