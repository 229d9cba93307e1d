//! Parquet directory reader

use super::dataset::Dataset;
use super::{SourceError, SourceResult};
use crate::config::SourceConfig;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Read the source described by `config`
pub fn read(config: &SourceConfig) -> SourceResult<Dataset> {
    read_with_batch_size(&config.path, config.read_batch_size)
}

/// Read every Parquet file in `path` with the default read batch size
pub fn read_parquet_dir(path: impl AsRef<Path>) -> SourceResult<Dataset> {
    read_with_batch_size(path.as_ref(), SourceConfig::default().read_batch_size)
}

fn read_with_batch_size(path: &Path, batch_size: usize) -> SourceResult<Dataset> {
    let files = data_files(path)?;
    info!("Reading {} data file(s) from {}", files.len(), path.display());

    let mut batches = Vec::new();
    for file in &files {
        let read = read_file(file, batch_size)?;
        debug!(
            "  {}: {} rows",
            file.display(),
            read.iter().map(|b| b.num_rows()).sum::<usize>()
        );
        batches.extend(read.into_iter().map(|b| (file.clone(), b)));
    }

    let dataset = Dataset::from_labelled_batches(batches)?;
    info!(
        "Loaded {} rows, columns [{}]",
        dataset.num_rows(),
        super::schema::describe(dataset.columns())
    );
    Ok(dataset)
}

/// List the data files under `path`.
///
/// A file path is returned as is. In a directory, hidden and marker files
/// (`.crc`, `_SUCCESS`, `_metadata`) are skipped and subdirectories are not
/// descended into.
fn data_files(path: &Path) -> SourceResult<Vec<PathBuf>> {
    let io_err = |source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    };

    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SourceError::NotFound(path.to_path_buf()))
        }
        Err(e) => return Err(io_err(e)),
    };
    if meta.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(path).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') || name.starts_with('_') {
            continue;
        }
        if entry.file_type().map_err(io_err)?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(SourceError::NoDataFiles(path.to_path_buf()));
    }
    Ok(files)
}

fn read_file(path: &Path, batch_size: usize) -> SourceResult<Vec<RecordBatch>> {
    let parquet_err = |source| SourceError::Parquet {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(parquet_err)?;
    let schema = builder.schema().clone();
    let reader = builder
        .with_batch_size(batch_size.max(1))
        .build()
        .map_err(parquet_err)?;

    let batches: Vec<RecordBatch> = reader
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| SourceError::Arrow {
            path: path.to_path_buf(),
            source,
        })?;

    // An empty file still contributes its schema.
    if batches.is_empty() {
        return Ok(vec![RecordBatch::new_empty(schema)]);
    }
    Ok(batches)
}
