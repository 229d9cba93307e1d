use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use tempfile::TempDir;

use loangraph::query::{customer_has_loan, customer_nodes, loan_nodes};
use loangraph::source::read_parquet_dir;
use loangraph::{
    ingest, EdgeType, IngestError, Label, MemorySink, Pipeline, PipelineConfig, SinkOp, Value,
    WriteOptions,
};

struct LoanRow<'a> {
    customer: &'a str,
    score: i64,
    loan: &'a str,
    amount: f64,
}

fn loan_row(
    customer: &'static str,
    score: i64,
    loan: &'static str,
    amount: f64,
) -> LoanRow<'static> {
    LoanRow {
        customer,
        score,
        loan,
        amount,
    }
}

fn write_parquet(path: &Path, rows: &[LoanRow<'_>]) {
    let schema = Arc::new(Schema::new(vec![
        Field::new("Customer_ID", DataType::Utf8, true),
        Field::new("Credit_Score", DataType::Int64, true),
        Field::new("Loan_ID", DataType::Utf8, true),
        Field::new("Loan_Amount", DataType::Float64, true),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.customer))),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.score))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.loan))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.amount))),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();

    let file = File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

fn fixture(rows: &[LoanRow<'_>]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_parquet(&dir.path().join("part-00000.parquet"), rows);
    dir
}

fn config_for(dir: &Path, batch_size: usize) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.source.path = dir.to_path_buf();
    config.neo4j.batch_size = batch_size;
    config
}

#[tokio::test]
async fn test_single_customer_scenario() {
    let dir = fixture(&[loan_row("C1", 700, "L1", 10000.0)]);
    let sink = MemorySink::new();

    let report = Pipeline::new(config_for(dir.path(), 5000)).run(&sink).await.unwrap();
    assert_eq!(report.rows_read, 1);
    let names: Vec<&str> = report.steps.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["customers", "loans", "customer_loans"]);

    let store = sink.store_read().await;
    assert_eq!(store.node_count(), 2);
    assert_eq!(store.edge_count(), 1);

    let customer = store
        .find_node(&Label::new("Customer"), "id", &Value::from("C1"))
        .unwrap();
    let node = store.get_node(customer).unwrap();
    assert_eq!(node.get_property("creditScore"), Some(&Value::Integer(700)));
    assert_eq!(node.get_property("loanNumber"), Some(&Value::from("L1")));

    let loan = store
        .find_node(&Label::new("Loan"), "loan_number", &Value::from("L1"))
        .unwrap();
    assert_eq!(
        store.get_node(loan).unwrap().get_property("loan_amount"),
        Some(&Value::Float(10000.0))
    );

    let edges = store.get_outgoing_edges(customer);
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].target, loan);
    assert_eq!(edges[0].edge_type, EdgeType::new("HAS_LOAN"));
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let dir = fixture(&[
        loan_row("C1", 700, "L1", 1000.0),
        loan_row("C2", 640, "L2", 2500.5),
        loan_row("C1", 700, "L3", 300.0),
    ]);
    let sink = MemorySink::new();
    let pipeline = Pipeline::new(config_for(dir.path(), 2));

    pipeline.run(&sink).await.unwrap();
    let (nodes, edges) = {
        let store = sink.store_read().await;
        (store.node_count(), store.edge_count())
    };
    assert_eq!(nodes, 5);
    assert_eq!(edges, 3);

    let second = pipeline.run(&sink).await.unwrap();
    let store = sink.store_read().await;
    assert_eq!(store.node_count(), nodes);
    assert_eq!(store.edge_count(), edges);
    for step in &second.steps {
        let counters = step.report.counters.unwrap();
        assert_eq!(counters.nodes_created, 0, "step {}", step.name);
        assert_eq!(counters.relationships_created, 0, "step {}", step.name);
    }
}

#[tokio::test]
async fn test_customer_keeps_last_loan_number() {
    let dir = fixture(&[
        loan_row("C1", 700, "L1", 1000.0),
        loan_row("C1", 710, "L2", 2000.0),
    ]);
    let sink = MemorySink::new();
    Pipeline::new(config_for(dir.path(), 5000)).run(&sink).await.unwrap();

    let store = sink.store_read().await;
    let customers = store.get_nodes_by_label(&Label::new("Customer"));
    assert_eq!(customers.len(), 1);
    assert_eq!(customers[0].get_property("loanNumber"), Some(&Value::from("L2")));
    assert_eq!(customers[0].get_property("creditScore"), Some(&Value::Integer(710)));
    // Both loans are still linked.
    assert_eq!(store.get_outgoing_edges(customers[0].id).len(), 2);
}

#[tokio::test]
async fn test_missing_loan_gives_no_edge() {
    let all = fixture(&[
        loan_row("C1", 700, "L1", 1000.0),
        loan_row("C2", 650, "L2", 2000.0),
    ]);
    let only_first = fixture(&[loan_row("C1", 700, "L1", 1000.0)]);
    let dataset = read_parquet_dir(all.path()).unwrap();
    let loans = read_parquet_dir(only_first.path()).unwrap();

    let sink = MemorySink::new();
    let options = WriteOptions::new(10).unwrap();
    ingest(&sink, &options, &dataset, &customer_nodes().into()).await.unwrap();
    ingest(&sink, &options, &loans, &loan_nodes().into()).await.unwrap();
    let report = ingest(&sink, &options, &dataset, &customer_has_loan().into())
        .await
        .unwrap();

    assert_eq!(report.rows, 2);
    assert_eq!(report.counters.unwrap().relationships_created, 1);
    let store = sink.store_read().await;
    let c2 = store
        .find_node(&Label::new("Customer"), "id", &Value::from("C2"))
        .unwrap();
    assert!(store.get_outgoing_edges(c2).is_empty());
}

#[tokio::test]
async fn test_rows_are_batched() {
    let rows: Vec<LoanRow<'static>> = (0..7)
        .map(|i| LoanRow {
            customer: ["C0", "C1", "C2", "C3", "C4", "C5", "C6"][i],
            score: 600 + i as i64,
            loan: ["L0", "L1", "L2", "L3", "L4", "L5", "L6"][i],
            amount: 100.0 * i as f64,
        })
        .collect();
    let dir = fixture(&rows);
    let sink = MemorySink::new();

    let report = Pipeline::new(config_for(dir.path(), 3)).run(&sink).await.unwrap();
    for step in &report.steps {
        assert_eq!(step.report.batches, 3);
        assert_eq!(step.report.rows, 7);
    }
    assert_eq!(sink.batch_sizes().await, vec![3, 3, 1, 3, 3, 1, 3, 3, 1]);
}

#[tokio::test]
async fn test_files_in_directory_are_combined() {
    let dir = tempfile::tempdir().unwrap();
    write_parquet(&dir.path().join("part-00000.parquet"), &[loan_row("C1", 700, "L1", 1.0)]);
    write_parquet(&dir.path().join("part-00001.parquet"), &[loan_row("C2", 710, "L2", 2.0)]);
    std::fs::write(dir.path().join("_SUCCESS"), b"").unwrap();

    let sink = MemorySink::new();
    let report = Pipeline::new(config_for(dir.path(), 5000)).run(&sink).await.unwrap();
    assert_eq!(report.rows_read, 2);
    assert_eq!(sink.store_read().await.edge_count(), 2);
}

#[tokio::test]
async fn test_missing_source_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let sink = MemorySink::new();
    let config = config_for(&dir.path().join("absent"), 5000);

    let result = Pipeline::new(config).run(&sink).await;
    assert!(matches!(result, Err(IngestError::Source(_))));
    assert_eq!(sink.store_read().await.node_count(), 0);
    assert!(sink.batch_sizes().await.is_empty());
}

#[tokio::test]
async fn test_unreachable_sink_writes_nothing() {
    let dir = fixture(&[loan_row("C1", 700, "L1", 1.0)]);
    let sink = MemorySink::unreachable();

    let result = Pipeline::new(config_for(dir.path(), 5000)).run(&sink).await;
    assert!(matches!(result, Err(IngestError::Connection(_))));
    assert_eq!(sink.store_read().await.node_count(), 0);
}

#[tokio::test]
async fn test_schema_script_runs_first() {
    let dir = fixture(&[loan_row("C1", 700, "L1", 1.0)]);
    let mut config = config_for(dir.path(), 5000);
    config.schema_script = vec![
        "CREATE CONSTRAINT customer_id IF NOT EXISTS FOR (c:Customer) REQUIRE c.id IS UNIQUE"
            .into(),
        "".into(),
        "CREATE CONSTRAINT loan_number IF NOT EXISTS FOR (l:Loan) REQUIRE l.loan_number IS UNIQUE"
            .into(),
    ];
    let sink = MemorySink::new();

    Pipeline::new(config).run(&sink).await.unwrap();
    let log = sink.log().await;
    assert_eq!(log.len(), 5);
    match (&log[0], &log[1]) {
        (SinkOp::Script(first), SinkOp::Script(second)) => {
            assert!(first.contains("customer_id"));
            assert!(second.contains("loan_number"));
        }
        other => panic!("expected the two script statements first, got {:?}", other),
    }
    assert_eq!(&log[2..], &[SinkOp::Batch(1), SinkOp::Batch(1), SinkOp::Batch(1)]);
}

#[tokio::test]
async fn test_zero_batch_size_rejected() {
    let dir = fixture(&[loan_row("C1", 700, "L1", 1.0)]);
    let sink = MemorySink::new();

    let result = Pipeline::new(config_for(dir.path(), 0)).run(&sink).await;
    assert!(matches!(result, Err(IngestError::Config(_))));
    assert_eq!(sink.store_read().await.node_count(), 0);
}
