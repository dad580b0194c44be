// models/src/errors.rs

use std::io;

pub use thiserror::Error;
use uuid::Error as UuidError;

/// Error taxonomy shared by every engine operation.
///
/// Engine code returns these typed errors; the REST layer turns each variant
/// into a stable error code plus the human-readable detail produced by
/// `Display`.
#[derive(Debug, Error)]
pub enum HospitalError {
    /// A referenced entity does not exist.
    #[error("{0} was not found")]
    NotFound(String),
    /// A uniqueness rule or a state-machine precondition was violated.
    #[error("{0}")]
    Conflict(String),
    /// The operation is not permitted from the entity's current workflow state.
    #[error("{0}")]
    InvalidState(String),
    /// A gating condition (administration fee) is not met yet.
    #[error("{0}")]
    PaymentRequired(String),
    /// Missing or invalid credentials.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),
    /// The caller's role lacks the permission for this operation.
    #[error("Permission denied: {0}")]
    Forbidden(String),
    /// A malformed time interval.
    #[error("Invalid time range: {0}")]
    InvalidRange(String),
    #[error("Invalid input or data: {0}")]
    InvalidData(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HospitalError {
    /// Stable, machine-readable code for the service boundary.
    pub fn code(&self) -> &'static str {
        match self {
            HospitalError::NotFound(_) => "NOT_FOUND",
            HospitalError::Conflict(_) => "CONFLICT",
            HospitalError::InvalidState(_) => "INVALID_STATE",
            HospitalError::PaymentRequired(_) => "PAYMENT_REQUIRED",
            HospitalError::Unauthorized(_) => "UNAUTHORIZED",
            HospitalError::Forbidden(_) => "FORBIDDEN",
            HospitalError::InvalidRange(_) => "INVALID_RANGE",
            HospitalError::InvalidData(_) => "INVALID_DATA",
            HospitalError::Storage(_) => "STORAGE_ERROR",
            HospitalError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn not_found(kind: &str, id: impl std::fmt::Display) -> Self {
        HospitalError::NotFound(format!("{} '{}'", kind, id))
    }
}

impl From<serde_json::Error> for HospitalError {
    fn from(err: serde_json::Error) -> Self {
        HospitalError::Storage(format!("JSON processing error: {}", err))
    }
}

impl From<io::Error> for HospitalError {
    fn from(err: io::Error) -> Self {
        HospitalError::Storage(format!("I/O error: {}", err))
    }
}

impl From<UuidError> for HospitalError {
    fn from(err: UuidError) -> Self {
        HospitalError::InvalidData(format!("UUID parsing error: {}", err))
    }
}

#[cfg(feature = "sled-errors")]
impl From<sled::Error> for HospitalError {
    fn from(err: sled::Error) -> Self {
        HospitalError::Storage(format!("sled: {}", err))
    }
}

/// A type alias for a `Result` that returns a `HospitalError` on failure.
pub type HospitalResult<T> = Result<T, HospitalError>;
