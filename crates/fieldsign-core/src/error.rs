//! Error types for the signing engine

use thiserror::Error;

/// Terminal failures of a signing operation. None of these are retried
/// internally; the first failure aborts the whole pass.
#[derive(Debug, Error)]
pub enum SignError {
    #[error("document not found: {0}")]
    NotFound(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unsupported signature image format: {0}")]
    UnsupportedImageFormat(String),

    #[error("no signature field supplied")]
    MissingSignatureField,

    #[error("failed to persist signed output: {0}")]
    PersistenceFailure(String),

    /// The signed artifact was stored but the audit append failed. The
    /// caller must see this as a failure even though the embed succeeded,
    /// since the stored location cannot be trusted without its record.
    #[error("output stored at {location} but audit append failed: {reason}")]
    AuditFailure { location: String, reason: String },

    #[error("document error: {0}")]
    Document(String),
}
