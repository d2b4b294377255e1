use mongodb::{Client, options::ClientOptions};
use std::time::Duration;
use tracing::{debug, instrument};

use super::MongoConfig;
use crate::common::{DatabaseError, DatabaseResult};

/// Build a MongoDB client from a `MongoConfig`
///
/// Parses the connection string and applies the pool and timeout settings.
/// The driver connects lazily, so success here does not mean the server is
/// reachable; follow up with [`super::ping`] to verify.
///
/// # Errors
///
/// - [`DatabaseError::ConfigError`] if the connection string is empty
/// - [`DatabaseError::ConnectionFailed`] if the string cannot be parsed or
///   the client cannot be constructed
///
/// # Example
/// ```ignore
/// use database::mongodb::{MongoConfig, create_client};
///
/// let config = MongoConfig::new("mongodb://localhost:27017");
/// let client = create_client(&config).await?;
/// ```
#[instrument(skip(config), fields(url = %config.redacted_url()))]
pub async fn create_client(config: &MongoConfig) -> DatabaseResult<Client> {
    if config.url.trim().is_empty() {
        return Err(DatabaseError::ConfigError(
            "MongoDB connection string is empty".to_string(),
        ));
    }

    let mut options = ClientOptions::parse(&config.url)
        .await
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

    options.max_pool_size = Some(config.max_pool_size);
    options.min_pool_size = Some(config.min_pool_size);
    options.connect_timeout = Some(Duration::from_secs(config.connect_timeout_secs));
    options.server_selection_timeout =
        Some(Duration::from_secs(config.server_selection_timeout_secs));

    if let Some(ref app_name) = config.app_name {
        options.app_name = Some(app_name.clone());
    }

    let client =
        Client::with_options(options).map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

    debug!("MongoDB client created");
    Ok(client)
}
