//! Parameterized write templates
//!
//! A template binds fields of the current row (`event`) to aliases and then
//! either merges a node by key or merges a relationship between two matched
//! nodes. Templates render to Cypher for the Bolt sink and are interpreted
//! directly by the in-memory sink.

use crate::graph::{EdgeType, Label};
use crate::value::{Row, Value, NULL};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Write as _;

/// Name of the list parameter each batch of rows is bound to
pub const EVENTS_PARAM: &str = "events";

/// Variable each row is unwound into
pub const EVENT_VAR: &str = "event";

/// `event.<field> AS <alias>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub field: String,
    pub alias: String,
}

/// `<variable>.<property> = <alias>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub property: String,
    pub alias: String,
}

/// `(<variable>:<label> {<key>: <alias>})`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePattern {
    pub variable: String,
    pub label: Label,
    pub key: String,
    pub alias: String,
}

impl NodePattern {
    pub fn new(
        variable: impl Into<String>,
        label: impl Into<Label>,
        key: impl Into<String>,
        alias: impl Into<String>,
    ) -> Self {
        Self {
            variable: variable.into(),
            label: label.into(),
            key: key.into(),
            alias: alias.into(),
        }
    }

    fn render(&self) -> String {
        format!("({}:{} {{{}: {}}})", self.variable, self.label, self.key, self.alias)
    }
}

/// MERGE a node by its key, then SET non-key properties
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMerge {
    pub bindings: Vec<Binding>,
    pub node: NodePattern,
    pub set: Vec<Assignment>,
}

impl NodeMerge {
    pub fn new(node: NodePattern) -> Self {
        Self {
            bindings: Vec::new(),
            node,
            set: Vec::new(),
        }
    }

    pub fn bind(mut self, field: impl Into<String>, alias: impl Into<String>) -> Self {
        self.bindings.push(Binding {
            field: field.into(),
            alias: alias.into(),
        });
        self
    }

    pub fn set(mut self, property: impl Into<String>, alias: impl Into<String>) -> Self {
        self.set.push(Assignment {
            property: property.into(),
            alias: alias.into(),
        });
        self
    }
}

/// MATCH both endpoints by key, then MERGE the relationship between them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipMerge {
    pub bindings: Vec<Binding>,
    pub source: NodePattern,
    pub edge_type: EdgeType,
    pub target: NodePattern,
}

impl RelationshipMerge {
    pub fn new(source: NodePattern, edge_type: impl Into<EdgeType>, target: NodePattern) -> Self {
        Self {
            bindings: Vec::new(),
            source,
            edge_type: edge_type.into(),
            target,
        }
    }

    pub fn bind(mut self, field: impl Into<String>, alias: impl Into<String>) -> Self {
        self.bindings.push(Binding {
            field: field.into(),
            alias: alias.into(),
        });
        self
    }
}

/// One templated graph write, applied to every row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphWrite {
    MergeNode(NodeMerge),
    MergeRelationship(RelationshipMerge),
}

impl GraphWrite {
    pub fn bindings(&self) -> &[Binding] {
        match self {
            GraphWrite::MergeNode(m) => &m.bindings,
            GraphWrite::MergeRelationship(r) => &r.bindings,
        }
    }

    /// Value an alias takes for `row`; unbound aliases read as null
    pub fn resolve<'r>(&self, row: &'r Row, alias: &str) -> &'r Value {
        match self.bindings().iter().find(|b| b.alias == alias) {
            Some(binding) => row.get(&binding.field),
            None => &NULL,
        }
    }

    /// Aliases used by the MERGE/MATCH/SET part that no binding defines
    pub fn unbound_aliases(&self) -> Vec<String> {
        let bound: HashSet<&str> = self.bindings().iter().map(|b| b.alias.as_str()).collect();
        let used: Vec<&str> = match self {
            GraphWrite::MergeNode(m) => std::iter::once(m.node.alias.as_str())
                .chain(m.set.iter().map(|a| a.alias.as_str()))
                .collect(),
            GraphWrite::MergeRelationship(r) => {
                vec![r.source.alias.as_str(), r.target.alias.as_str()]
            }
        };

        let mut unbound: Vec<String> = Vec::new();
        for alias in used {
            if !bound.contains(alias) && !unbound.iter().any(|u| u == alias) {
                unbound.push(alias.to_string());
            }
        }
        unbound
    }

    /// Source fields the template reads
    pub fn fields(&self) -> Vec<String> {
        self.bindings().iter().map(|b| b.field.clone()).collect()
    }

    /// Render the per-row Cypher (without the UNWIND prefix)
    pub fn to_cypher(&self) -> String {
        let mut out = String::new();
        let bindings: Vec<String> = self
            .bindings()
            .iter()
            .map(|b| format!("{}.{} AS {}", EVENT_VAR, b.field, b.alias))
            .collect();
        if !bindings.is_empty() {
            let _ = writeln!(out, "WITH {}", bindings.join(",\n"));
            out.push('\n');
        }

        match self {
            GraphWrite::MergeNode(m) => {
                let _ = write!(out, "MERGE {}", m.node.render());
                if !m.set.is_empty() {
                    let assignments: Vec<String> = m
                        .set
                        .iter()
                        .map(|a| format!("    {}.{} = {}", m.node.variable, a.property, a.alias))
                        .collect();
                    let _ = write!(out, "\nSET\n{}", assignments.join(",\n"));
                }
            }
            GraphWrite::MergeRelationship(r) => {
                let _ = writeln!(out, "MATCH {}", r.source.render());
                let _ = writeln!(out, "MATCH {}", r.target.render());
                let _ = write!(
                    out,
                    "MERGE ({})-[:{}]->({})",
                    r.source.variable, r.edge_type, r.target.variable
                );
            }
        }
        out
    }
}

impl From<NodeMerge> for GraphWrite {
    fn from(m: NodeMerge) -> Self {
        GraphWrite::MergeNode(m)
    }
}

impl From<RelationshipMerge> for GraphWrite {
    fn from(r: RelationshipMerge) -> Self {
        GraphWrite::MergeRelationship(r)
    }
}
