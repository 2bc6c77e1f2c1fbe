//! Relationship import service
//!
//! This crate wires the pieces of an import together:
//! - Options: fills in defaults and the session user
//! - Classifier: routes records to create/update/delete by strategy
//! - Dispatcher: runs the buckets against a store and builds the report
//! - Aggregator: merges bucket results and applies the report mode
//! - Store: the downstream collaborators and a SurrealDB-backed implementation

pub mod aggregator;
pub mod classifier;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod options;
pub mod session;
pub mod store;

#[cfg(test)]
mod testing;

pub use classifier::{Bucket, Buckets, StrategyClassifier};
pub use config::ImportConfig;
pub use dispatcher::ImportDispatcher;
pub use error::{ImportError, Result};
pub use options::ImportOptionsResolver;
pub use session::{EnvUserProvider, StaticUserProvider};
pub use store::{CurrentUserProvider, RelationshipStore, RepositoryStore};
