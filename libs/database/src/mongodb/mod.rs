//! MongoDB connector and utilities
//!
//! Provides client construction and a liveness check.

mod config;
mod connector;
mod health;

pub use config::MongoConfig;
pub use connector::create_client;
pub use health::ping;

// Re-export MongoDB types for convenience
pub use mongodb::{Client, Collection, Database, bson};
