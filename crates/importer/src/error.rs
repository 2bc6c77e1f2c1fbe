//! Import error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    /// Payload could not be decoded; nothing was mutated
    #[error("Payload error: {0}")]
    Payload(#[from] relimport_core::CoreError),

    #[error("Database error: {0}")]
    Database(#[from] relimport_db::DbError),

    /// Unexpected failure inside a downstream store
    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ImportError {
    /// True for decoding failures that abort an import before any mutation
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            ImportError::Payload(
                relimport_core::CoreError::Parse(_)
                    | relimport_core::CoreError::PayloadTooLarge { .. }
                    | relimport_core::CoreError::UnsupportedFormat(_)
            )
        )
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;
