//! Core domain types for relationship import
//!
//! This crate defines the records carried by an import payload, the options
//! that steer an import, the summaries it reports, and the decoder that turns
//! JSON or XML payloads into records.

pub mod codec;
pub mod error;
pub mod options;
pub mod relationship;
pub mod serde_ext;
pub mod summary;

pub use codec::{DecodeAttempt, PayloadDecoder, PayloadFormat, RawPayload, DEFAULT_MAX_PAYLOAD_BYTES};
pub use error::{CoreError, Result};
pub use options::{ImportOptions, ImportStrategy, ReportMode, User};
pub use relationship::{ItemKind, Relationship, RelationshipItem};
pub use summary::{ImportConflict, ImportCount, ImportStatus, ImportSummaries, ImportSummary};
