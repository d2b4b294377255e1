//! Store seams used by the worker
//!
//! `Connector` opens a session and `DocumentStore` runs the two operations
//! the worker needs. The MongoDB implementations are thin wrappers over the
//! `database` crate; tests substitute mocks.

use async_trait::async_trait;
use database::mongodb::{Client, MongoConfig, bson::Document, bson::doc, create_client, ping};
use database::{DatabaseError, DatabaseResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Read-only operations against an established store session
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Liveness round-trip; returns the observed latency
    async fn ping(&self) -> DatabaseResult<Duration>;

    /// Count every document in `database.collection` (empty filter)
    async fn count_documents(&self, database: &str, collection: &str) -> DatabaseResult<u64>;
}

/// Opens a store session from connection settings
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self, config: &MongoConfig) -> DatabaseResult<Arc<dyn DocumentStore>>;
}

/// MongoDB-backed `DocumentStore`
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
}

impl MongoStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn ping(&self) -> DatabaseResult<Duration> {
        ping(&self.client).await
    }

    #[instrument(skip(self))]
    async fn count_documents(&self, database: &str, collection: &str) -> DatabaseResult<u64> {
        self.client
            .database(database)
            .collection::<Document>(collection)
            .count_documents(doc! {})
            .await
            .map_err(DatabaseError::from)
    }
}

/// Connector that builds a `mongodb::Client`
#[derive(Clone, Copy, Debug, Default)]
pub struct MongoConnector;

#[async_trait]
impl Connector for MongoConnector {
    async fn open(&self, config: &MongoConfig) -> DatabaseResult<Arc<dyn DocumentStore>> {
        let client = create_client(config).await?;
        Ok(Arc::new(MongoStore::new(client)))
    }
}
