//! Write queries
//!
//! A [`WriteQuery`] is either a structured [`GraphWrite`] template or
//! free-form Cypher. Both are run once per row: the sink binds a batch of
//! rows to `$events` and the query body sees the current row as `event`.

pub mod loans;
pub mod template;

pub use loans::{customer_has_loan, customer_nodes, ingestion_plan, loan_nodes, Step};
pub use template::{
    Assignment, Binding, GraphWrite, NodeMerge, NodePattern, RelationshipMerge, EVENTS_PARAM,
    EVENT_VAR,
};

use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

/// Query applied to every row of a dataset
#[derive(Debug, Clone, PartialEq)]
pub enum WriteQuery {
    Template(GraphWrite),
    /// Cypher text, sent verbatim after the UNWIND prefix
    Cypher(String),
}

impl WriteQuery {
    /// Per-row Cypher body
    pub fn cypher(&self) -> Cow<'_, str> {
        match self {
            WriteQuery::Template(write) => Cow::Owned(write.to_cypher()),
            WriteQuery::Cypher(text) => Cow::Borrowed(text.trim()),
        }
    }

    /// Full statement for one batch: `UNWIND $events AS event` followed by
    /// the per-row body
    pub fn batched(&self) -> String {
        format!("UNWIND ${} AS {}\n{}", EVENTS_PARAM, EVENT_VAR, self.cypher())
    }

    /// Source columns the query reads through `event.<column>`
    pub fn referenced_fields(&self) -> Vec<String> {
        match self {
            WriteQuery::Template(write) => write.fields(),
            WriteQuery::Cypher(text) => {
                let mut fields: Vec<String> = Vec::new();
                for cap in event_field_pattern().captures_iter(text) {
                    let field = cap[1].to_string();
                    if !fields.contains(&field) {
                        fields.push(field);
                    }
                }
                fields
            }
        }
    }
}

fn event_field_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\bevent\.([A-Za-z_][A-Za-z0-9_]*)").expect("event field pattern is valid")
    })
}

impl From<GraphWrite> for WriteQuery {
    fn from(write: GraphWrite) -> Self {
        WriteQuery::Template(write)
    }
}

impl From<String> for WriteQuery {
    fn from(text: String) -> Self {
        WriteQuery::Cypher(text)
    }
}

impl From<&str> for WriteQuery {
    fn from(text: &str) -> Self {
        WriteQuery::Cypher(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batched_prefix() {
        let query = WriteQuery::from("  MERGE (n:Tag {name: event.name})\n");
        assert_eq!(
            query.batched(),
            "UNWIND $events AS event\nMERGE (n:Tag {name: event.name})"
        );
    }

    #[test]
    fn test_template_and_text_agree() {
        let template: WriteQuery = loan_nodes().into();
        let text = WriteQuery::from(template.cypher().into_owned());
        assert_eq!(template.batched(), text.batched());
        assert_eq!(template.referenced_fields(), text.referenced_fields());
    }

    #[test]
    fn test_referenced_fields_from_text() {
        let query = WriteQuery::from(
            "WITH event.Customer_ID AS id, event.Customer_ID AS again, prevent.Other AS x \
             MERGE (c:Customer {id: id}) SET c.score = event.Credit_Score",
        );
        assert_eq!(
            query.referenced_fields(),
            vec!["Customer_ID".to_string(), "Credit_Score".to_string()]
        );
    }
}
