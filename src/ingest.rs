//! Dataset-to-graph ingestion adapter
//!
//! [`ingest`] runs one write query over every row of a dataset, in batches
//! of `batch_size` rows. Batches are written in order and the first failure
//! aborts the run. Only the failing batch is rolled back.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{ConfigError, ConnectionProfile};
use crate::error::IngestResult;
use crate::query::WriteQuery;
use crate::sink::{Counters, GraphSink, WriteSummary};
use crate::source::Dataset;

/// Save mode requested by the caller.
///
/// Query writes always upsert through MERGE, so the mode changes nothing;
/// it is accepted for parity with table-style writers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaveMode {
    ErrorIfExists,
    Append,
    #[default]
    Overwrite,
}

/// Options for one write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    pub batch_size: usize,
    pub mode: SaveMode,
}

impl WriteOptions {
    pub fn new(batch_size: usize) -> IngestResult<Self> {
        if batch_size == 0 {
            return Err(ConfigError::Invalid("batch size must be at least 1".into()).into());
        }
        Ok(Self {
            batch_size,
            mode: SaveMode::default(),
        })
    }

    pub fn with_mode(mut self, mode: SaveMode) -> Self {
        self.mode = mode;
        self
    }
}

impl From<&ConnectionProfile> for WriteOptions {
    fn from(profile: &ConnectionProfile) -> Self {
        Self {
            batch_size: profile.batch_size.max(1),
            mode: SaveMode::default(),
        }
    }
}

/// What one ingestion wrote
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub rows: usize,
    pub batches: usize,
    pub counters: Option<Counters>,
}

/// Write every row of `dataset` through `query`.
///
/// The sink is verified before anything is sent, so an unreachable endpoint
/// fails with nothing written.
pub async fn ingest<S: GraphSink + ?Sized>(
    sink: &S,
    options: &WriteOptions,
    dataset: &Dataset,
    query: &WriteQuery,
) -> IngestResult<IngestReport> {
    let options = WriteOptions::new(options.batch_size)?.with_mode(options.mode);
    sink.verify().await?;

    for field in query.referenced_fields() {
        if dataset.column_type(&field).is_none() {
            warn!("Column {} is not in the dataset; it will read as null", field);
        }
    }
    debug!("Save mode {:?} has no effect on query writes", options.mode);

    info!(
        "Writing {} rows in batches of {}",
        dataset.num_rows(),
        options.batch_size
    );

    let mut total = WriteSummary::default();
    let mut batches = 0;
    for rows in dataset.chunks(options.batch_size) {
        let summary = sink.write_batch(query, &rows).await?;
        batches += 1;
        debug!("Batch {} committed ({} rows)", batches, summary.rows);
        total.merge(&summary);
    }

    info!("Wrote {} rows in {} batches", total.rows, batches);
    Ok(IngestReport {
        rows: total.rows,
        batches,
        counters: total.counters,
    })
}

/// Run standalone statements in order, stopping at the first failure.
/// Blank statements are skipped; returns how many were run.
pub async fn run_script<S: GraphSink + ?Sized>(
    sink: &S,
    statements: &[String],
) -> IngestResult<usize> {
    sink.verify().await?;
    let mut ran = 0;
    for statement in statements.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        debug!("Running script statement: {}", statement);
        sink.run_script(statement).await?;
        ran += 1;
    }
    info!("Ran {} script statements", ran);
    Ok(ran)
}
