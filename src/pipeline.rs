//! End-to-end customer/loan ingestion
//!
//! Reads the Parquet source once, runs the optional schema script, then
//! writes Customers, Loans and HAS_LOAN links as three sequential steps.
//! A source error stops the run before anything is sent to the sink.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::PipelineConfig;
use crate::error::IngestResult;
use crate::ingest::{self, IngestReport, WriteOptions};
use crate::query::ingestion_plan;
use crate::sink::GraphSink;
use crate::source::{self, Dataset};

/// Result of one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub name: String,
    pub report: IngestReport,
}

/// Result of a full run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub rows_read: usize,
    pub steps: Vec<StepReport>,
}

impl PipelineReport {
    pub fn step(&self, name: &str) -> Option<&IngestReport> {
        self.steps.iter().find(|s| s.name == name).map(|s| &s.report)
    }
}

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Read the configured source and write it to `sink`
    pub async fn run<S: GraphSink + ?Sized>(&self, sink: &S) -> IngestResult<PipelineReport> {
        self.config.validate()?;
        let dataset = source::read(&self.config.source)?;
        self.run_dataset(sink, &dataset).await
    }

    /// Write an already loaded dataset to `sink`
    pub async fn run_dataset<S: GraphSink + ?Sized>(
        &self,
        sink: &S,
        dataset: &Dataset,
    ) -> IngestResult<PipelineReport> {
        let options = WriteOptions::new(self.config.neo4j.batch_size)?;

        if !self.config.schema_script.is_empty() {
            ingest::run_script(sink, &self.config.schema_script).await?;
        }

        let mut report = PipelineReport {
            rows_read: dataset.num_rows(),
            steps: Vec::new(),
        };
        for step in ingestion_plan() {
            info!("Step {}: starting", step.name);
            let step_report = ingest::ingest(sink, &options, dataset, &step.query).await?;
            info!(
                "Step {}: {} rows in {} batches",
                step.name, step_report.rows, step_report.batches
            );
            report.steps.push(StepReport {
                name: step.name.to_string(),
                report: step_report,
            });
        }
        Ok(report)
    }
}
