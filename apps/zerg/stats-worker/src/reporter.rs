//! Polling reporter
//!
//! Counts the documents in one collection on every tick and hands the
//! outcome to a [`ReportSink`]. Failures are per-tick values; the loop only
//! ends when shutdown is requested.

use std::fmt;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior, interval_at, timeout};
use tracing::{debug, error, info, instrument};

use crate::connection::ConnectionHandle;
use crate::error::WorkerError;

/// Operation name used in per-tick error lines
pub const COUNT_OPERATION: &str = "counting documents";

/// Database and collection whose documents are counted
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CountTarget {
    pub database: String,
    pub collection: String,
}

impl CountTarget {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }
}

/// A successful count for one tick
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CountReport {
    pub database: String,
    pub collection: String,
    pub count: u64,
}

impl fmt::Display for CountReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Total {}: {}", self.collection, self.count)
    }
}

/// Result of handling one tick
#[derive(Debug)]
pub enum TickOutcome {
    Counted(CountReport),
    Failed(WorkerError),
}

impl fmt::Display for TickOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickOutcome::Counted(report) => write!(f, "{report}"),
            TickOutcome::Failed(err) => write!(f, "{err}"),
        }
    }
}

/// Destination for per-tick report and error lines
pub trait ReportSink: Send + Sync {
    fn emit(&self, outcome: &TickOutcome);
}

/// Sink that writes outcomes to the tracing subscriber
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn emit(&self, outcome: &TickOutcome) {
        match outcome {
            TickOutcome::Counted(report) => info!(
                database = %report.database,
                collection = %report.collection,
                count = report.count,
                "{report}"
            ),
            TickOutcome::Failed(err @ WorkerError::Query { operation, cause }) => error!(
                operation = *operation,
                error = %cause,
                "{err}"
            ),
            TickOutcome::Failed(err) => error!(error = %err, "{err}"),
        }
    }
}

/// Periodic count reporter
///
/// Bundles the connection handle, the target and the interval. The first
/// tick fires one full interval after [`Reporter::run`] starts. Each query
/// is bounded by the interval, and ticks missed while a query was running
/// are skipped rather than replayed.
pub struct Reporter<S = TracingSink> {
    handle: ConnectionHandle,
    target: CountTarget,
    interval: Duration,
    sink: S,
}

impl Reporter<TracingSink> {
    /// Create a reporter that logs through tracing
    ///
    /// # Panics
    ///
    /// Panics if `interval` is zero.
    pub fn new(handle: ConnectionHandle, target: CountTarget, interval: Duration) -> Self {
        assert!(!interval.is_zero(), "poll interval must be non-zero");
        Self {
            handle,
            target,
            interval,
            sink: TracingSink,
        }
    }
}

impl<S: ReportSink> Reporter<S> {
    /// Replace the sink outcomes are emitted to
    pub fn with_sink<T: ReportSink>(self, sink: T) -> Reporter<T> {
        Reporter {
            handle: self.handle,
            target: self.target,
            interval: self.interval,
            sink,
        }
    }

    /// Run a single count query and classify the result
    pub async fn poll_once(&self) -> TickOutcome {
        let query = self
            .handle
            .count_documents(&self.target.database, &self.target.collection);

        match timeout(self.interval, query).await {
            Ok(Ok(count)) => TickOutcome::Counted(CountReport {
                database: self.target.database.clone(),
                collection: self.target.collection.clone(),
                count,
            }),
            Ok(Err(e)) => TickOutcome::Failed(WorkerError::Query {
                operation: COUNT_OPERATION,
                cause: e.to_string(),
            }),
            Err(_) => TickOutcome::Failed(WorkerError::Query {
                operation: COUNT_OPERATION,
                cause: format!("timed out after {}ms", self.interval.as_millis()),
            }),
        }
    }

    /// Poll until `shutdown` turns `true` (or its sender is dropped)
    ///
    /// Returns the number of ticks that produced an outcome. A query still
    /// in flight when shutdown arrives is abandoned without emitting.
    #[instrument(
        skip_all,
        fields(
            database = %self.target.database,
            collection = %self.target.collection,
            interval_ms = self.interval.as_millis() as u64,
        )
    )]
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> u64 {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Starting stats reporter");
        let mut ticks = 0u64;

        loop {
            tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => break,
                _ = ticker.tick() => {}
            }

            let outcome = tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => {
                    debug!("Shutdown requested while a query was in flight, dropping it");
                    break;
                }
                outcome = self.poll_once() => outcome,
            };

            self.sink.emit(&outcome);
            ticks += 1;
        }

        info!(ticks, "Stats reporter stopped");
        ticks
    }
}

/// Resolves once shutdown is signalled or the sender is gone
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}
