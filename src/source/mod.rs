//! Source reader
//!
//! Loads a directory of Parquet files into a [`Dataset`]. Column types are
//! taken from the files' embedded Arrow schema; no schema is supplied by the
//! caller and nothing is validated beyond the type mapping.

pub mod dataset;
pub mod reader;
pub mod schema;

pub use dataset::{Dataset, RowChunks, Rows};
pub use reader::{read, read_parquet_dir};
pub use schema::{Column, ColumnType};

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading the source
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Source path {0} does not exist")]
    NotFound(PathBuf),

    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No data files found in {0}")]
    NoDataFiles(PathBuf),

    #[error("{path} is not a readable Parquet file: {source}")]
    Parquet {
        path: PathBuf,
        #[source]
        source: parquet::errors::ParquetError,
    },

    #[error("Arrow error in {path}: {source}")]
    Arrow {
        path: PathBuf,
        #[source]
        source: arrow::error::ArrowError,
    },

    #[error("Column {column} has unsupported type {data_type}")]
    UnsupportedType { column: String, data_type: String },

    #[error("Schema of {path} ({found}) does not match the first file ({expected})")]
    SchemaMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },
}

pub type SourceResult<T> = Result<T, SourceError>;
