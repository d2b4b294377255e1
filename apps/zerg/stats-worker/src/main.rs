//! Stats Worker Service - Entry Point
//!
//! Background worker that reports collection document counts on an interval.

#[tokio::main]
async fn main() -> eyre::Result<()> {
    zerg_stats_worker::run().await
}
