//! Database library providing MongoDB connectors and utilities
//!
//! Client construction and liveness checks live here so applications only
//! deal with a configured [`mongodb::Client`] and a unified [`DatabaseError`].
//!
//! # Features
//!
//! - `mongodb` (default) - MongoDB support
//! - `config` - Configuration support with `core_config::FromEnv`
//!
//! # Example
//!
//! ```ignore
//! use database::mongodb::{MongoConfig, create_client, ping};
//!
//! let config = MongoConfig::new("mongodb://localhost:27017");
//! let client = create_client(&config).await?;
//! let latency = ping(&client).await?;
//! let users = client.database("backend-test").collection::<Document>("users");
//! ```

pub mod common;

#[cfg(feature = "mongodb")]
pub mod mongodb;

pub use common::{DatabaseError, DatabaseResult};
