//! Error types for ingestion

use crate::config::ConfigError;
use crate::graph::GraphError;
use crate::source::SourceError;
use thiserror::Error;

/// Errors that can occur while writing a dataset to a graph
#[derive(Error, Debug)]
pub enum IngestError {
    /// Reading the source failed; nothing was written
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// The endpoint could not be reached or refused the credentials
    #[error("Connection error: {0}")]
    Connection(String),

    /// The database rejected the query
    #[error("Query error: {0}")]
    Query(String),

    /// Neo4j driver error
    #[error("Neo4j error: {0}")]
    Neo4j(#[from] neo4rs::Error),

    /// In-memory graph error
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// The sink cannot run this kind of query
    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type IngestResult<T> = Result<T, IngestError>;
