//! Loangraph
//!
//! Loads customer/loan records from Parquet into a Neo4j property graph.
//!
//! # Architecture
//!
//! - [`source`]: reads a directory of Parquet files into a typed [`Dataset`]
//! - [`query`]: write templates rendered as `UNWIND $events AS event` Cypher
//! - [`ingest`]: batches a dataset through one write query
//! - [`sink`]: write targets, Neo4j over Bolt or an in-memory [`GraphStore`]
//! - [`pipeline`]: Customers, then Loans, then `HAS_LOAN` links
//!
//! ## Example Usage
//!
//! ```rust
//! use loangraph::query::{customer_has_loan, WriteQuery};
//!
//! let query: WriteQuery = customer_has_loan().into();
//! let statement = query.batched();
//! assert!(statement.starts_with("UNWIND $events AS event"));
//! assert!(statement.ends_with("MERGE (c)-[:HAS_LOAN]->(l)"));
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod graph;
pub mod ingest;
pub mod pipeline;
pub mod query;
pub mod sink;
pub mod source;
pub mod value;

// Re-export main types for convenience
pub use config::{ConfigError, ConnectionProfile, PipelineConfig, SourceConfig};
pub use error::{IngestError, IngestResult};
pub use graph::{Edge, EdgeId, EdgeType, GraphError, GraphStore, Label, Node, NodeId};
pub use ingest::{ingest, run_script, IngestReport, SaveMode, WriteOptions};
pub use pipeline::{Pipeline, PipelineReport, StepReport};
pub use query::{GraphWrite, WriteQuery};
pub use sink::{BoltSink, Counters, GraphSink, MemorySink, SinkOp, WriteSummary};
pub use source::{Column, ColumnType, Dataset, SourceError};
pub use value::{Row, Value};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(version(), "0.1.0");
    }
}
