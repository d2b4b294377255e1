//! Connection manager
//!
//! Opens the store session once at startup and proves it is live before
//! anything else runs.

use database::mongodb::MongoConfig;
use database::DatabaseResult;
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::error::{WorkerError, WorkerResult};
use crate::store::{Connector, DocumentStore};

/// Shared handle to a verified store session
///
/// Cloning is cheap. The session is released when the last clone drops.
#[derive(Clone)]
pub struct ConnectionHandle {
    store: Arc<dyn DocumentStore>,
}

impl ConnectionHandle {
    pub(crate) fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Count all documents in `database.collection`
    pub async fn count_documents(&self, database: &str, collection: &str) -> DatabaseResult<u64> {
        self.store.count_documents(database, collection).await
    }
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle").finish_non_exhaustive()
    }
}

/// Open and verify a connection to the store
///
/// An empty connection string fails with [`WorkerError::Configuration`]
/// before the connector is touched. A failure to open the session, or a
/// failed ping afterwards, is a [`WorkerError::Connectivity`]. The driver
/// opens sessions lazily, so the ping is what actually proves reachability.
#[instrument(skip_all, fields(url = %config.redacted_url()))]
pub async fn connect<C>(connector: &C, config: &MongoConfig) -> WorkerResult<ConnectionHandle>
where
    C: Connector + ?Sized,
{
    if config.url().trim().is_empty() {
        let err = WorkerError::Configuration("MONGO_URI is set but empty".to_string());
        error!(error = %err, "Refusing to connect");
        return Err(err);
    }

    let store = connector.open(config).await.map_err(|e| {
        error!(error = %e, "Error creating MongoDB client");
        WorkerError::Connectivity(e.to_string())
    })?;

    let latency = store.ping().await.map_err(|e| {
        error!(error = %e, "Error pinging MongoDB");
        WorkerError::Connectivity(e.to_string())
    })?;

    info!(latency_ms = latency.as_millis() as u64, "Connected to MongoDB");
    Ok(ConnectionHandle::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MockConnector, MockDocumentStore};
    use database::DatabaseError;
    use std::time::Duration;

    fn healthy_store() -> Arc<dyn DocumentStore> {
        let mut store = MockDocumentStore::new();
        store
            .expect_ping()
            .times(1)
            .returning(|| Ok(Duration::from_millis(3)));
        store
            .expect_count_documents()
            .returning(|_, _| Ok(3));
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_connect_empty_uri_makes_no_calls() {
        let mut connector = MockConnector::new();
        connector.expect_open().times(0);

        let err = connect(&connector, &MongoConfig::new("")).await.unwrap_err();
        assert!(matches!(err, WorkerError::Configuration(_)));

        let err = connect(&connector, &MongoConfig::new("   ")).await.unwrap_err();
        assert!(matches!(err, WorkerError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_connect_success_returns_usable_handle() {
        let store = healthy_store();
        let mut connector = MockConnector::new();
        connector
            .expect_open()
            .times(1)
            .returning(move |_| Ok(store.clone()));

        let handle = connect(&connector, &MongoConfig::new("mongodb://localhost:27017"))
            .await
            .unwrap();
        assert_eq!(handle.count_documents("backend-test", "users").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_connect_passes_config_to_connector() {
        let store = healthy_store();
        let mut connector = MockConnector::new();
        connector
            .expect_open()
            .withf(|config| config.url == "mongodb://db.internal:27017")
            .times(1)
            .returning(move |_| Ok(store.clone()));

        assert!(
            connect(&connector, &MongoConfig::new("mongodb://db.internal:27017"))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_connect_failed_ping_is_connectivity_error() {
        let mut store = MockDocumentStore::new();
        store
            .expect_ping()
            .times(1)
            .returning(|| Err(DatabaseError::HealthCheckFailed("server selection timeout".into())));
        store.expect_count_documents().times(0);
        let store: Arc<dyn DocumentStore> = Arc::new(store);

        let mut connector = MockConnector::new();
        connector
            .expect_open()
            .times(1)
            .returning(move |_| Ok(store.clone()));

        let err = connect(&connector, &MongoConfig::new("mongodb://localhost:27017"))
            .await
            .unwrap_err();
        match err {
            WorkerError::Connectivity(msg) => assert!(msg.contains("server selection timeout")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connect_open_failure_is_connectivity_error() {
        let mut connector = MockConnector::new();
        connector
            .expect_open()
            .times(1)
            .returning(|_| Err(DatabaseError::ConnectionFailed("invalid scheme".into())));

        let err = connect(&connector, &MongoConfig::new("mongo://oops"))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::Connectivity(_)));
    }

    mod events {
        use super::*;
        use std::fmt;
        use std::sync::Mutex;
        use tracing::field::{Field, Visit};
        use tracing::{Event, Level, Subscriber};
        use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

        /// Records the level and message of every event it sees
        #[derive(Clone, Default)]
        struct CapturedEvents(Arc<Mutex<Vec<(Level, String)>>>);

        impl CapturedEvents {
            fn count(&self, level: Level, message: &str) -> usize {
                self.0
                    .lock()
                    .unwrap()
                    .iter()
                    .filter(|(l, m)| *l == level && m == message)
                    .count()
            }

            fn count_level(&self, level: Level) -> usize {
                self.0.lock().unwrap().iter().filter(|(l, _)| *l == level).count()
            }
        }

        struct MessageVisitor(String);

        impl Visit for MessageVisitor {
            fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
                if field.name() == "message" {
                    self.0 = format!("{value:?}");
                }
            }
        }

        impl<S: Subscriber> Layer<S> for CapturedEvents {
            fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
                let mut visitor = MessageVisitor(String::new());
                event.record(&mut visitor);
                self.0
                    .lock()
                    .unwrap()
                    .push((*event.metadata().level(), visitor.0));
            }
        }

        fn capture() -> (CapturedEvents, tracing::subscriber::DefaultGuard) {
            let events = CapturedEvents::default();
            let guard =
                tracing::subscriber::set_default(tracing_subscriber::registry().with(events.clone()));
            (events, guard)
        }

        fn connector_returning(store: Arc<dyn DocumentStore>) -> MockConnector {
            let mut connector = MockConnector::new();
            connector
                .expect_open()
                .times(1)
                .returning(move |_| Ok(store.clone()));
            connector
        }

        #[tokio::test]
        async fn test_success_logs_connected_once() {
            let (events, _guard) = capture();
            let connector = connector_returning(healthy_store());

            connect(&connector, &MongoConfig::new("mongodb://localhost:27017"))
                .await
                .unwrap();

            assert_eq!(events.count(Level::INFO, "Connected to MongoDB"), 1);
            assert_eq!(events.count_level(Level::ERROR), 0);
        }

        #[tokio::test]
        async fn test_empty_uri_logs_one_error() {
            let (events, _guard) = capture();
            let mut connector = MockConnector::new();
            connector.expect_open().times(0);

            connect(&connector, &MongoConfig::new("")).await.unwrap_err();

            assert_eq!(events.count(Level::ERROR, "Refusing to connect"), 1);
            assert_eq!(events.count_level(Level::ERROR), 1);
            assert_eq!(events.count(Level::INFO, "Connected to MongoDB"), 0);
        }

        #[tokio::test]
        async fn test_open_failure_logs_one_error() {
            let (events, _guard) = capture();
            let mut connector = MockConnector::new();
            connector
                .expect_open()
                .times(1)
                .returning(|_| Err(DatabaseError::ConnectionFailed("invalid scheme".into())));

            connect(&connector, &MongoConfig::new("mongo://oops"))
                .await
                .unwrap_err();

            assert_eq!(events.count(Level::ERROR, "Error creating MongoDB client"), 1);
            assert_eq!(events.count_level(Level::ERROR), 1);
            assert_eq!(events.count(Level::INFO, "Connected to MongoDB"), 0);
        }

        #[tokio::test]
        async fn test_failed_ping_logs_one_error() {
            let (events, _guard) = capture();
            let mut store = MockDocumentStore::new();
            store
                .expect_ping()
                .times(1)
                .returning(|| Err(DatabaseError::HealthCheckFailed("no primary".into())));
            let connector = connector_returning(Arc::new(store));

            connect(&connector, &MongoConfig::new("mongodb://localhost:27017"))
                .await
                .unwrap_err();

            assert_eq!(events.count(Level::ERROR, "Error pinging MongoDB"), 1);
            assert_eq!(events.count_level(Level::ERROR), 1);
            assert_eq!(events.count(Level::INFO, "Connected to MongoDB"), 0);
        }
    }
}
