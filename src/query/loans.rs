//! Customer/loan ingestion templates
//!
//! Source columns: `Customer_ID`, `Credit_Score`, `Loan_ID`, `Loan_Amount`.
//! The Customer node keeps `loanNumber` even though `HAS_LOAN` carries the
//! same link.

use super::template::{GraphWrite, NodeMerge, NodePattern, RelationshipMerge};
use super::WriteQuery;

pub const CUSTOMER_LABEL: &str = "Customer";
pub const LOAN_LABEL: &str = "Loan";
pub const HAS_LOAN: &str = "HAS_LOAN";

/// Upsert one Customer per `Customer_ID`
pub fn customer_nodes() -> GraphWrite {
    NodeMerge::new(NodePattern::new("m", CUSTOMER_LABEL, "id", "customer_id"))
        .bind("Customer_ID", "customer_id")
        .bind("Credit_Score", "credit_score")
        .bind("Loan_ID", "loan_number")
        .set("creditScore", "credit_score")
        .set("loanNumber", "loan_number")
        .into()
}

/// Upsert one Loan per `Loan_ID`
pub fn loan_nodes() -> GraphWrite {
    NodeMerge::new(NodePattern::new("m", LOAN_LABEL, "loan_number", "loan_number"))
        .bind("Loan_ID", "loan_number")
        .bind("Loan_Amount", "loan_amount")
        .set("loan_amount", "loan_amount")
        .into()
}

/// Link each Customer to its Loan. Rows whose Customer or Loan was never
/// merged produce no edge.
pub fn customer_has_loan() -> GraphWrite {
    RelationshipMerge::new(
        NodePattern::new("c", CUSTOMER_LABEL, "id", "customer_id"),
        HAS_LOAN,
        NodePattern::new("l", LOAN_LABEL, "loan_number", "loan_number"),
    )
    .bind("Customer_ID", "customer_id")
    .bind("Loan_ID", "loan_number")
    .into()
}

/// A named write of the ingestion run
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub name: &'static str,
    pub query: WriteQuery,
}

/// The three writes in the order they must run: both node writes commit
/// before the relationship write MATCHes them.
pub fn ingestion_plan() -> Vec<Step> {
    vec![
        Step {
            name: "customers",
            query: customer_nodes().into(),
        },
        Step {
            name: "loans",
            query: loan_nodes().into(),
        },
        Step {
            name: "customer_loans",
            query: customer_has_loan().into(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_cypher() {
        let expected = "\
WITH event.Customer_ID AS customer_id,
event.Credit_Score AS credit_score,
event.Loan_ID AS loan_number

MERGE (m:Customer {id: customer_id})
SET
    m.creditScore = credit_score,
    m.loanNumber = loan_number";
        assert_eq!(customer_nodes().to_cypher(), expected);
    }

    #[test]
    fn test_loan_cypher() {
        let expected = "\
WITH event.Loan_ID AS loan_number,
event.Loan_Amount AS loan_amount

MERGE (m:Loan {loan_number: loan_number})
SET
    m.loan_amount = loan_amount";
        assert_eq!(loan_nodes().to_cypher(), expected);
    }

    #[test]
    fn test_relationship_cypher() {
        let expected = "\
WITH event.Customer_ID AS customer_id,
event.Loan_ID AS loan_number

MATCH (c:Customer {id: customer_id})
MATCH (l:Loan {loan_number: loan_number})
MERGE (c)-[:HAS_LOAN]->(l)";
        assert_eq!(customer_has_loan().to_cypher(), expected);
    }

    #[test]
    fn test_templates_are_fully_bound() {
        for step in ingestion_plan() {
            if let WriteQuery::Template(write) = &step.query {
                assert!(write.unbound_aliases().is_empty(), "{} has unbound aliases", step.name);
            }
        }
    }

    #[test]
    fn test_plan_order() {
        let names: Vec<&str> = ingestion_plan().iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["customers", "loans", "customer_loans"]);
        assert!(matches!(
            ingestion_plan()[2].query,
            WriteQuery::Template(GraphWrite::MergeRelationship(_))
        ));
    }
}
