//! Stats Worker Service
//!
//! A background worker that verifies MongoDB connectivity once at startup and
//! then reports the number of documents in a collection on a fixed interval.
//!
//! ## Flow
//!
//! ```text
//! .env / environment
//!   ↓ Config::from_env
//! connect()            ← empty URI or failed ping stops the process here
//!   ↓ ConnectionHandle
//! Reporter::run        ← one count per tick, errors logged and skipped
//!   ↓ SIGINT / SIGTERM
//! exit 0
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod reporter;
pub mod store;

use core_config::tracing::{init_tracing, install_color_eyre};
use core_config::{Environment, FromEnv};
use eyre::{Result, WrapErr};
use tokio::signal;
use tokio::sync::watch;
use tracing::{debug, error, info};

pub use config::Config;
pub use connection::{ConnectionHandle, connect};
pub use error::{WorkerError, WorkerResult};
pub use reporter::{CountReport, CountTarget, ReportSink, Reporter, TickOutcome, TracingSink};
pub use store::{Connector, DocumentStore, MongoConnector, MongoStore};

/// Run the stats worker
///
/// 1. Loads `.env` (if present) and sets up tracing
/// 2. Loads configuration from the environment
/// 3. Connects to MongoDB and pings it
/// 4. Reports the collection count every interval until SIGINT/SIGTERM
///
/// # Errors
///
/// Returns an error if configuration is missing or invalid, or if MongoDB
/// cannot be reached at startup. Query failures after startup are logged and
/// never returned.
pub async fn run() -> Result<()> {
    install_color_eyre();

    let dotenv = dotenvy::dotenv();

    let environment = Environment::from_env();
    init_tracing(&environment);

    match dotenv {
        Ok(path) => debug!(path = %path.display(), "Loaded .env file"),
        Err(e) => debug!(error = %e, "No .env file loaded"),
    }

    info!(
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
        "Starting stats worker"
    );

    let config = Config::from_env()
        .map_err(WorkerError::from)
        .inspect_err(|e| error!(error = %e, "MONGO_URI or worker settings invalid"))
        .wrap_err("Failed to load stats worker configuration")?;

    info!(
        environment = ?config.environment,
        url = %config.mongodb.redacted_url(),
        database = %config.target.database,
        collection = %config.target.collection,
        interval_ms = config.poll_interval.as_millis() as u64,
        "Configuration loaded"
    );

    let handle = connect(&MongoConnector, &config.mongodb)
        .await
        .wrap_err("Failed to connect to MongoDB")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(forward_shutdown(shutdown_signal(), shutdown_tx));

    let reporter = Reporter::new(handle, config.target, config.poll_interval);
    reporter.run(shutdown_rx).await;

    info!("Stats worker stopped");
    Ok(())
}

/// Flip `shutdown` to `true` once `signal` fires
///
/// If the signal handlers cannot be installed the error is logged and the
/// sender is held forever, so polling keeps running instead of exiting 0.
async fn forward_shutdown<F>(signal: F, shutdown: watch::Sender<bool>)
where
    F: Future<Output = Result<()>>,
{
    match signal.await {
        Ok(()) => {
            let _ = shutdown.send(true);
        }
        Err(e) => {
            error!(error = %e, "Error waiting for shutdown signal, continuing without one");
            std::future::pending::<()>().await;
            drop(shutdown);
        }
    }
}

/// Wait for a shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.wrap_err("Failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .wrap_err("Failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<(), eyre::Report>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        result = ctrl_c => {
            result?;
            info!("Received Ctrl+C, initiating shutdown...");
        },
        result = terminate => {
            result?;
            info!("Received SIGTERM, initiating shutdown...");
        },
    }

    Ok(())
}
