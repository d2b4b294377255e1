use mongodb::{Client, bson::doc};
use std::time::{Duration, Instant};

use crate::common::{DatabaseError, DatabaseResult};

/// Run a `{ ping: 1 }` round-trip against the `admin` database
///
/// Returns the observed round-trip time. Any failure (server selection
/// timeout, auth error, network error) maps to
/// [`DatabaseError::HealthCheckFailed`].
///
/// # Example
/// ```ignore
/// use database::mongodb::{create_client, ping};
///
/// let client = create_client(&config).await?;
/// let latency = ping(&client).await?;
/// ```
pub async fn ping(client: &Client) -> DatabaseResult<Duration> {
    let start = Instant::now();

    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await
        .map_err(|e| DatabaseError::HealthCheckFailed(e.to_string()))?;

    Ok(start.elapsed())
}
