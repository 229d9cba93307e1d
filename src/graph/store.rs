//! In-memory graph storage
//!
//! Node and edge arenas plus a label index. Only the operations the
//! ingestion templates need are provided: merge a node by key, look one up,
//! set properties, merge an edge. There is no delete path.

use super::edge::Edge;
use super::node::Node;
use super::property::PropertyValue;
use super::types::{EdgeId, EdgeType, Label, NodeId};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Errors that can occur during graph operations
#[derive(Error, Debug, PartialEq)]
pub enum GraphError {
    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Cannot merge node using null property value for {key} on :{label}")]
    NullMergeKey { label: Label, key: String },

    #[error("Invalid edge: source node {0} does not exist")]
    InvalidEdgeSource(NodeId),

    #[error("Invalid edge: target node {0} does not exist")]
    InvalidEdgeTarget(NodeId),
}

pub type GraphResult<T> = Result<T, GraphError>;

/// In-memory graph storage
///
/// - nodes: NodeId -> Node (arena, ids are positions)
/// - edges: EdgeId -> Edge (arena)
/// - outgoing: NodeId -> Vec<EdgeId>
/// - label_index: Label -> Vec<NodeId>, in creation order
/// - edge_index: (source, target, type) set, at most one edge per triple
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    outgoing: HashMap<NodeId, Vec<EdgeId>>,
    label_index: HashMap<Label, Vec<NodeId>>,
    edge_index: HashSet<(NodeId, NodeId, EdgeType)>,
}

impl GraphStore {
    /// Create a new empty graph store
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the first node labelled `label` whose `key` equals `value`.
    /// A null `value` never matches.
    pub fn find_node(&self, label: &Label, key: &str, value: &PropertyValue) -> Option<NodeId> {
        self.label_index
            .get(label)?
            .iter()
            .copied()
            .find(|id| self.nodes[id.index()].matches(key, value))
    }

    /// All nodes labelled `label` whose `key` equals `value`
    pub fn find_nodes(&self, label: &Label, key: &str, value: &PropertyValue) -> Vec<&Node> {
        self.get_nodes_by_label(label)
            .into_iter()
            .filter(|node| node.matches(key, value))
            .collect()
    }

    /// Match-or-create a node by a single key property.
    ///
    /// Returns the node and whether it was created.
    pub fn merge_node(
        &mut self,
        label: &Label,
        key: &str,
        value: &PropertyValue,
    ) -> GraphResult<(NodeId, bool)> {
        if value.is_null() {
            return Err(GraphError::NullMergeKey {
                label: label.clone(),
                key: key.to_string(),
            });
        }
        if let Some(id) = self.find_node(label, key, value) {
            return Ok((id, false));
        }

        let id = NodeId::new(self.nodes.len() as u64);
        let mut node = Node::new(id, label.clone());
        node.set_property(key, value.clone());
        self.nodes.push(node);
        self.label_index.entry(label.clone()).or_default().push(id);
        Ok((id, true))
    }

    /// Set a node property. A null value removes the property.
    ///
    /// Returns whether the stored state changed.
    pub fn set_property(
        &mut self,
        id: NodeId,
        key: &str,
        value: &PropertyValue,
    ) -> GraphResult<bool> {
        let node = self
            .nodes
            .get_mut(id.index())
            .ok_or(GraphError::NodeNotFound(id))?;

        if value.is_null() {
            return Ok(node.remove_property(key).is_some());
        }
        Ok(node.set_property(key, value.clone()).as_ref() != Some(value))
    }

    /// Match-or-create the edge `(source)-[edge_type]->(target)`.
    ///
    /// Returns the edge and whether it was created.
    pub fn merge_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        edge_type: &EdgeType,
    ) -> GraphResult<(EdgeId, bool)> {
        if !self.has_node(source) {
            return Err(GraphError::InvalidEdgeSource(source));
        }
        if !self.has_node(target) {
            return Err(GraphError::InvalidEdgeTarget(target));
        }

        if self
            .edge_index
            .contains(&(source, target, edge_type.clone()))
        {
            let existing = self
                .get_outgoing_edges(source)
                .into_iter()
                .find(|e| e.connects(source, target, edge_type))
                .map(|e| e.id);
            if let Some(id) = existing {
                return Ok((id, false));
            }
        }

        let id = EdgeId::new(self.edges.len() as u64);
        self.edges.push(Edge::new(id, source, target, edge_type.clone()));
        self.outgoing.entry(source).or_default().push(id);
        self.edge_index.insert((source, target, edge_type.clone()));
        Ok((id, true))
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn has_node(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    pub fn get_edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.index())
    }

    /// Get all outgoing edges from a node
    pub fn get_outgoing_edges(&self, node_id: NodeId) -> Vec<&Edge> {
        self.outgoing
            .get(&node_id)
            .map(|ids| ids.iter().filter_map(|id| self.get_edge(*id)).collect())
            .unwrap_or_default()
    }

    /// Get all nodes with a specific label, in creation order
    pub fn get_nodes_by_label(&self, label: &Label) -> Vec<&Node> {
        self.label_index
            .get(label)
            .map(|ids| ids.iter().filter_map(|id| self.get_node(*id)).collect())
            .unwrap_or_default()
    }

    /// Get all edges of a specific type
    pub fn get_edges_by_type(&self, edge_type: &EdgeType) -> Vec<&Edge> {
        self.edges
            .iter()
            .filter(|e| e.edge_type == *edge_type)
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Remove every node and edge
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer() -> Label {
        Label::new("Customer")
    }

    #[test]
    fn test_merge_node_is_idempotent() {
        let mut store = GraphStore::new();
        let (first, created) = store.merge_node(&customer(), "id", &"C1".into()).unwrap();
        assert!(created);

        let (second, created) = store.merge_node(&customer(), "id", &"C1".into()).unwrap();
        assert!(!created);
        assert_eq!(first, second);
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn test_merge_key_is_scoped_by_label() {
        let mut store = GraphStore::new();
        store.merge_node(&customer(), "id", &"X".into()).unwrap();
        store.merge_node(&Label::new("Loan"), "id", &"X".into()).unwrap();
        assert_eq!(store.node_count(), 2);
        assert_eq!(store.get_nodes_by_label(&customer()).len(), 1);
    }

    #[test]
    fn test_merge_numeric_key_across_types() {
        let mut store = GraphStore::new();
        let (first, _) = store
            .merge_node(&customer(), "id", &PropertyValue::Integer(1))
            .unwrap();
        let (second, created) = store
            .merge_node(&customer(), "id", &PropertyValue::Float(1.0))
            .unwrap();
        assert!(!created);
        assert_eq!(first, second);
        assert_eq!(
            store.find_node(&customer(), "id", &PropertyValue::Float(1.0)),
            Some(first)
        );
    }

    #[test]
    fn test_merge_null_key() {
        let mut store = GraphStore::new();
        let result = store.merge_node(&customer(), "id", &PropertyValue::Null);
        assert_eq!(
            result,
            Err(GraphError::NullMergeKey {
                label: customer(),
                key: "id".to_string()
            })
        );
        assert_eq!(store.node_count(), 0);
    }

    #[test]
    fn test_set_property_reports_change() {
        let mut store = GraphStore::new();
        let (id, _) = store.merge_node(&customer(), "id", &"C1".into()).unwrap();

        assert!(store.set_property(id, "creditScore", &700i64.into()).unwrap());
        assert!(!store.set_property(id, "creditScore", &700i64.into()).unwrap());
        assert!(store.set_property(id, "creditScore", &PropertyValue::Null).unwrap());
        assert!(store.get_node(id).unwrap().get_property("creditScore").is_none());
        assert!(!store.set_property(id, "creditScore", &PropertyValue::Null).unwrap());

        let missing = NodeId::new(42);
        assert_eq!(
            store.set_property(missing, "x", &1i64.into()),
            Err(GraphError::NodeNotFound(missing))
        );
    }

    #[test]
    fn test_merge_edge() {
        let mut store = GraphStore::new();
        let (c, _) = store.merge_node(&customer(), "id", &"C1".into()).unwrap();
        let (l, _) = store.merge_node(&Label::new("Loan"), "loan_number", &"L1".into()).unwrap();
        let has_loan = EdgeType::new("HAS_LOAN");

        let (e1, created) = store.merge_edge(c, l, &has_loan).unwrap();
        assert!(created);
        let (e2, created) = store.merge_edge(c, l, &has_loan).unwrap();
        assert!(!created);
        assert_eq!(e1, e2);
        assert_eq!(store.edge_count(), 1);

        // Reverse direction is a different edge
        let (_, created) = store.merge_edge(l, c, &has_loan).unwrap();
        assert!(created);
        assert_eq!(store.get_edges_by_type(&has_loan).len(), 2);
        assert_eq!(store.get_outgoing_edges(c).len(), 1);
    }

    #[test]
    fn test_edge_validation() {
        let mut store = GraphStore::new();
        let (c, _) = store.merge_node(&customer(), "id", &"C1".into()).unwrap();
        let invalid = NodeId::new(999);
        let t = EdgeType::new("HAS_LOAN");

        assert_eq!(store.merge_edge(invalid, c, &t), Err(GraphError::InvalidEdgeSource(invalid)));
        assert_eq!(store.merge_edge(c, invalid, &t), Err(GraphError::InvalidEdgeTarget(invalid)));
    }

    #[test]
    fn test_clear() {
        let mut store = GraphStore::new();
        store.merge_node(&customer(), "id", &"C1".into()).unwrap();
        store.clear();
        assert_eq!(store.node_count(), 0);
        assert!(store.find_node(&customer(), "id", &"C1".into()).is_none());
    }
}
