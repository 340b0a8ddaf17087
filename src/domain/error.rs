//! Domain error kinds raised by the tracking operations

use crate::domain::status::VALID_STATUSES;
use crate::infra::store_error::StoreError;
use thiserror::Error;

pub type TrackingResult<T> = Result<T, TrackingError>;

#[derive(Error, Debug)]
pub enum TrackingError {
    /// Status literal outside the closed set. Client input error.
    #[error("Invalid status '{status}'. Valid statuses are: {}", valid.join(", "))]
    InvalidStatus { status: String, valid: Vec<&'static str> },

    /// Unit already holds the requested status. Nothing was written.
    #[error("Unit {unit_id} already has status '{status}'. Duplicate request detected.")]
    DuplicateRequest { unit_id: String, status: String },

    /// Opaque backing-store failure, not interpreted by the core
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TrackingError {
    pub fn invalid_status(status: &str) -> Self {
        Self::InvalidStatus { status: status.to_string(), valid: VALID_STATUSES.to_vec() }
    }

    pub fn duplicate_request(unit_id: &str, status: &str) -> Self {
        Self::DuplicateRequest { unit_id: unit_id.to_string(), status: status.to_string() }
    }

    /// Short kind name used in API error bodies and logs
    pub fn kind(&self) -> &'static str {
        match self {
            TrackingError::InvalidStatus { .. } => "InvalidStatus",
            TrackingError::DuplicateRequest { .. } => "DuplicateRequest",
            TrackingError::Store(_) => "StoreError",
        }
    }
}
