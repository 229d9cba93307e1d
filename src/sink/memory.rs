//! MemorySink: in-process graph sink
//!
//! Interprets write templates directly against a [`GraphStore`], no network
//! or Cypher parser needed. Each batch is applied to a copy of the store and
//! swapped in only if every row succeeds.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::error::{IngestError, IngestResult};
use crate::graph::GraphStore;
use crate::query::{GraphWrite, NodeMerge, RelationshipMerge, WriteQuery};
use crate::value::Row;

use super::{Counters, GraphSink, WriteSummary};

/// One call the sink accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkOp {
    Script(String),
    /// A committed batch and its row count
    Batch(usize),
}

/// Sink that writes into a shared in-memory graph
pub struct MemorySink {
    store: Arc<RwLock<GraphStore>>,
    log: Mutex<Vec<SinkOp>>,
    reachable: bool,
}

impl MemorySink {
    /// Create a sink over a fresh empty graph
    pub fn new() -> Self {
        Self::with_store(Arc::new(RwLock::new(GraphStore::new())))
    }

    /// Create a sink wrapping an existing store
    pub fn with_store(store: Arc<RwLock<GraphStore>>) -> Self {
        Self {
            store,
            log: Mutex::new(Vec::new()),
            reachable: true,
        }
    }

    /// A sink whose endpoint check always fails, like a server that is down
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::new()
        }
    }

    pub fn store(&self) -> &Arc<RwLock<GraphStore>> {
        &self.store
    }

    /// Acquire a read lock on the store
    pub async fn store_read(&self) -> tokio::sync::RwLockReadGuard<'_, GraphStore> {
        self.store.read().await
    }

    /// Script statements and committed batches, in the order they arrived
    pub async fn log(&self) -> Vec<SinkOp> {
        self.log.lock().await.clone()
    }

    /// Statements received through `run_script`, in order
    pub async fn scripts(&self) -> Vec<String> {
        self.log
            .lock()
            .await
            .iter()
            .filter_map(|op| match op {
                SinkOp::Script(statement) => Some(statement.clone()),
                SinkOp::Batch(_) => None,
            })
            .collect()
    }

    /// Row count of every committed batch, in order
    pub async fn batch_sizes(&self) -> Vec<usize> {
        self.log
            .lock()
            .await
            .iter()
            .filter_map(|op| match op {
                SinkOp::Batch(rows) => Some(*rows),
                SinkOp::Script(_) => None,
            })
            .collect()
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_node_merge(
    write: &GraphWrite,
    merge: &NodeMerge,
    store: &mut GraphStore,
    row: &Row,
    counters: &mut Counters,
) -> IngestResult<()> {
    let key = write.resolve(row, &merge.node.alias);
    let (id, created) = store.merge_node(&merge.node.label, &merge.node.key, key)?;
    if created {
        counters.nodes_created += 1;
        counters.properties_set += 1;
    }
    for assignment in &merge.set {
        let value = write.resolve(row, &assignment.alias);
        if store.set_property(id, &assignment.property, value)? {
            counters.properties_set += 1;
        }
    }
    Ok(())
}

fn apply_relationship_merge(
    write: &GraphWrite,
    merge: &RelationshipMerge,
    store: &mut GraphStore,
    row: &Row,
    counters: &mut Counters,
) -> IngestResult<()> {
    let source = store.find_node(
        &merge.source.label,
        &merge.source.key,
        write.resolve(row, &merge.source.alias),
    );
    let target = store.find_node(
        &merge.target.label,
        &merge.target.key,
        write.resolve(row, &merge.target.alias),
    );

    // An unmatched endpoint ends the row with no output, as MATCH does.
    if let (Some(source), Some(target)) = (source, target) {
        let (_, created) = store.merge_edge(source, target, &merge.edge_type)?;
        if created {
            counters.relationships_created += 1;
        }
    }
    Ok(())
}

#[async_trait]
impl GraphSink for MemorySink {
    async fn verify(&self) -> IngestResult<()> {
        if self.reachable {
            Ok(())
        } else {
            Err(IngestError::Connection("in-memory endpoint is unreachable".to_string()))
        }
    }

    async fn run_script(&self, statement: &str) -> IngestResult<()> {
        debug!("Recording script statement: {}", statement);
        self.log.lock().await.push(SinkOp::Script(statement.to_string()));
        Ok(())
    }

    async fn write_batch(&self, query: &WriteQuery, rows: &[Row]) -> IngestResult<WriteSummary> {
        let write = match query {
            WriteQuery::Template(write) => write,
            WriteQuery::Cypher(_) => {
                return Err(IngestError::Unsupported(
                    "the in-memory sink only runs write templates".to_string(),
                ))
            }
        };

        let unbound = write.unbound_aliases();
        if !unbound.is_empty() {
            return Err(IngestError::Query(format!(
                "Variable `{}` not defined",
                unbound.join("`, `")
            )));
        }

        let mut guard = self.store.write().await;
        let mut staged = guard.clone();
        let mut counters = Counters::default();
        for row in rows {
            match write {
                GraphWrite::MergeNode(merge) => {
                    apply_node_merge(write, merge, &mut staged, row, &mut counters)?
                }
                GraphWrite::MergeRelationship(merge) => {
                    apply_relationship_merge(write, merge, &mut staged, row, &mut counters)?
                }
            }
        }
        *guard = staged;
        drop(guard);

        self.log.lock().await.push(SinkOp::Batch(rows.len()));
        Ok(WriteSummary::with_counters(rows.len(), counters))
    }
}
