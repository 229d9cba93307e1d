//! In-memory property graph
//!
//! A small graph store with the MERGE/MATCH semantics the ingestion
//! templates rely on. It backs [`crate::sink::MemorySink`], which stands in
//! for a Neo4j server in tests and dry runs.

pub mod edge;
pub mod node;
pub mod property;
pub mod store;
pub mod types;

// Re-export main types
pub use edge::Edge;
pub use node::Node;
pub use property::{PropertyMap, PropertyValue};
pub use store::{GraphError, GraphResult, GraphStore};
pub use types::{EdgeId, EdgeType, Label, NodeId};
