//! BoltSink: Neo4j over the Bolt protocol
//!
//! Each batch is one explicit transaction: the rows are bound to `$events`
//! and the query runs as `UNWIND $events AS event ...`. A failed batch is
//! rolled back; batches committed before it stay committed.

use async_trait::async_trait;
use neo4rs::{query, ConfigBuilder, Graph};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::config::ConnectionProfile;
use crate::error::{IngestError, IngestResult};
use crate::query::{WriteQuery, EVENTS_PARAM};
use crate::value::Row;

use super::{GraphSink, WriteSummary};

/// Sink backed by a Neo4j database
pub struct BoltSink {
    graph: Graph,
    url: String,
    database: String,
}

impl BoltSink {
    /// Build a driver for `profile`.
    ///
    /// The driver opens connections lazily, so an unreachable server is
    /// reported by [`GraphSink::verify`], not here.
    pub async fn connect(profile: &ConnectionProfile) -> IngestResult<Self> {
        let config = ConfigBuilder::default()
            .uri(&profile.url)
            .user(&profile.user)
            .password(&profile.password)
            .db(profile.database.as_str())
            .max_connections(1)
            .build()
            .map_err(|e| IngestError::Connection(e.to_string()))?;

        let graph = Graph::connect(config)
            .await
            .map_err(|e| IngestError::Connection(format!("{}: {}", profile.url, e)))?;

        debug!(
            url = %profile.url,
            database = %profile.database,
            user = %profile.user,
            "Neo4j driver ready"
        );
        Ok(Self {
            graph,
            url: profile.url.clone(),
            database: profile.database.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn database(&self) -> &str {
        &self.database
    }
}

#[async_trait]
impl GraphSink for BoltSink {
    async fn verify(&self) -> IngestResult<()> {
        let unreachable = |e: neo4rs::Error| {
            IngestError::Connection(format!("{} ({}): {}", self.url, self.database, e))
        };

        let txn = self.graph.start_txn().await.map_err(unreachable)?;
        txn.rollback().await.map_err(unreachable)?;
        info!("Connected to {} database {}", self.url, self.database);
        Ok(())
    }

    async fn run_script(&self, statement: &str) -> IngestResult<()> {
        let mut txn = self.graph.start_txn().await?;
        match txn.run(query(statement)).await {
            Ok(()) => {
                txn.commit().await?;
                Ok(())
            }
            Err(e) => {
                warn!("Script statement failed, rolling back: {}", e);
                if let Err(rollback) = txn.rollback().await {
                    warn!("Rollback failed: {}", rollback);
                }
                Err(IngestError::Query(format!("{}: {}", statement, e)))
            }
        }
    }

    async fn write_batch(&self, write: &WriteQuery, rows: &[Row]) -> IngestResult<WriteSummary> {
        let events: Vec<HashMap<String, neo4rs::BoltType>> =
            rows.iter().map(Row::to_bolt).collect();
        let statement = query(&write.batched()).param(EVENTS_PARAM, events);

        let mut txn = self.graph.start_txn().await?;
        match txn.run(statement).await {
            Ok(()) => {
                txn.commit().await?;
                Ok(WriteSummary::rows(rows.len()))
            }
            Err(e) => {
                warn!("Batch of {} rows failed, rolling back: {}", rows.len(), e);
                if let Err(rollback) = txn.rollback().await {
                    warn!("Rollback failed: {}", rollback);
                }
                Err(e.into())
            }
        }
    }
}
