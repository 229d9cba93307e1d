//! Write targets
//!
//! Provides two sink implementations:
//!
//! - **`BoltSink`**: a Neo4j server over Bolt, via `neo4rs`.
//! - **`MemorySink`**: an in-process [`GraphStore`](crate::graph::GraphStore)
//!   with the same MERGE/MATCH semantics, for tests and dry runs.
//!
//! Both implement [`GraphSink`], which is all the ingestion adapter needs.

pub mod bolt;
pub mod memory;

pub use bolt::BoltSink;
pub use memory::{MemorySink, SinkOp};

use crate::error::IngestResult;
use crate::query::WriteQuery;
use crate::value::Row;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Unified write interface for graph databases
#[async_trait]
pub trait GraphSink: Send + Sync {
    /// Check the endpoint is reachable and accepts the credentials
    async fn verify(&self) -> IngestResult<()>;

    /// Run one standalone statement, e.g. a constraint
    async fn run_script(&self, statement: &str) -> IngestResult<()>;

    /// Apply `query` to every row of one batch, atomically
    async fn write_batch(&self, query: &WriteQuery, rows: &[Row]) -> IngestResult<WriteSummary>;
}

/// Update counters for a write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub nodes_created: u64,
    pub relationships_created: u64,
    /// Property values that changed, including keys of created nodes
    pub properties_set: u64,
}

impl Counters {
    pub fn add(&mut self, other: &Counters) {
        self.nodes_created += other.nodes_created;
        self.relationships_created += other.relationships_created;
        self.properties_set += other.properties_set;
    }

    pub fn is_empty(&self) -> bool {
        *self == Counters::default()
    }
}

/// Outcome of one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteSummary {
    pub rows: usize,
    /// `None` when the sink does not report counters
    pub counters: Option<Counters>,
}

impl WriteSummary {
    pub fn rows(rows: usize) -> Self {
        Self { rows, counters: None }
    }

    pub fn with_counters(rows: usize, counters: Counters) -> Self {
        Self {
            rows,
            counters: Some(counters),
        }
    }

    /// Fold another batch into this summary. Counters stay known only while
    /// every merged batch reported them.
    pub fn merge(&mut self, other: &WriteSummary) {
        let had_batches = self.rows > 0 || self.counters.is_some();
        self.rows += other.rows;
        self.counters = match (self.counters, other.counters) {
            (Some(mut a), Some(b)) => {
                a.add(&b);
                Some(a)
            }
            (None, Some(b)) if !had_batches => Some(b),
            _ => None,
        };
    }
}
