use core_config::{ConfigError, Environment, FromEnv, env_or_default, env_parse_or};
use database::mongodb::MongoConfig;
use std::time::Duration;

use crate::reporter::CountTarget;

pub const DEFAULT_DATABASE: &str = "backend-test";
pub const DEFAULT_COLLECTION: &str = "users";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

/// Stats worker configuration
///
/// Environment variables:
/// - `MONGO_URI` (required) and the `MONGODB_*` driver settings, see [`MongoConfig`]
/// - `STATS_DATABASE` (default: `backend-test`)
/// - `STATS_COLLECTION` (default: `users`)
/// - `STATS_POLL_INTERVAL_MS` (default: 1000, must be > 0)
/// - `APP_ENV` (default: development)
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: Environment,
    pub mongodb: MongoConfig,
    pub target: CountTarget,
    pub poll_interval: Duration,
}

fn non_empty(key: &str, value: String) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::ParseError {
            key: key.to_string(),
            details: "must not be empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

impl FromEnv for Config {
    fn from_env() -> Result<Self, ConfigError> {
        let database = non_empty(
            "STATS_DATABASE",
            env_or_default("STATS_DATABASE", DEFAULT_DATABASE),
        )?;
        let collection = non_empty(
            "STATS_COLLECTION",
            env_or_default("STATS_COLLECTION", DEFAULT_COLLECTION),
        )?;

        let interval_ms = env_parse_or("STATS_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)?;
        if interval_ms == 0 {
            return Err(ConfigError::ParseError {
                key: "STATS_POLL_INTERVAL_MS".to_string(),
                details: "must be greater than zero".to_string(),
            });
        }

        let mut mongodb = MongoConfig::from_env()?;
        if mongodb.app_name.is_none() {
            mongodb = mongodb.with_app_name(env!("CARGO_PKG_NAME"));
        }

        Ok(Self {
            environment: Environment::from_env(),
            mongodb,
            target: CountTarget::new(database, collection),
            poll_interval: Duration::from_millis(interval_ms),
        })
    }
}
