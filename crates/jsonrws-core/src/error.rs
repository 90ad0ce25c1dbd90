//! Shared error type across jsonRWS crates.

use thiserror::Error;

/// Shared result type.
pub type Result<T> = std::result::Result<T, JsonRwsError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum JsonRwsError {
    /// The text on the wire (or about to go on the wire) is not a valid
    /// envelope: unparseable JSON, not an object, a disallowed field, or a
    /// missing required field. Carries the offending content for diagnosis.
    #[error("protocol violation: {reason} (raw: {raw})")]
    ProtocolViolation { reason: String, raw: String },
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal: {0}")]
    Internal(String),
}
