//! Shared test utilities
//!
//! - `TestMongo`: MongoDB container with automatic cleanup
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { workspace = true }
//! ```
//!
//! ```rust,ignore
//! use test_utils::TestMongo;
//!
//! #[tokio::test]
//! async fn my_mongo_test() {
//!     let mongo = TestMongo::new().await;
//!     let users = mongo.collection("backend-test", "users");
//!     users.insert_one(doc! { "name": "ada" }).await.unwrap();
//! }
//! ```

mod mongo;

pub use mongo::TestMongo;
