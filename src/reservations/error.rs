// Error types for the reservation engine
//
// Everything here is an unexpected failure or a caller mistake. Slot
// conflicts are not errors at all: the availability check returns them
// as values (`Availability::Conflict`) and reservation creation reports
// them as `CreateOutcome::Rejected`, keeping the happy path and the
// conflict path explicit.

use thiserror::Error;

use crate::catalog::{CatalogError, ResourceKind};
use crate::interval::InvalidInterval;

/// Main error type for reservation operations
#[derive(Debug, Error)]
pub enum ReservationError {
    /// Malformed time range (end not after start)
    #[error("invalid time slot: {0}")]
    InvalidInterval(#[from] InvalidInterval),

    /// Request DTO failed field validation
    #[error("validation failed: {0}")]
    Validation(String),

    /// Referenced game or table does not exist
    #[error("{kind} with id {id} not found")]
    ResourceNotFound { kind: ResourceKind, id: i32 },

    /// Reservation id does not exist (update/read paths)
    #[error("reservation not found")]
    NotFound,

    /// Caller is neither the reservation's owner nor an admin
    #[error("permission denied")]
    PermissionDenied,

    /// Status change rejected by the lifecycle state machine
    #[error("invalid status transition: {0}")]
    InvalidTransition(String),

    /// Database operation errors, automatically converted from sqlx::Error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// SQLSTATE for an exclusion constraint violation
const EXCLUSION_VIOLATION: &str = "23P01";

impl ReservationError {
    /// True when Postgres rejected an insert through the no-overlap
    /// exclusion constraint on booked table reservations
    ///
    /// In a multi-process deployment two instances can race past their
    /// own in-process slot locks; the loser's insert trips the
    /// constraint and must be reported as a slot conflict, not as an
    /// infrastructure failure.
    pub fn is_slot_exclusion(&self) -> bool {
        match self {
            ReservationError::Database(sqlx::Error::Database(db)) => {
                db.code().as_deref() == Some(EXCLUSION_VIOLATION)
            }
            _ => false,
        }
    }
}

/// Result type alias for reservation operations
pub type ReservationResult<T> = Result<T, ReservationError>;

impl From<CatalogError> for ReservationError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Database(e) => ReservationError::Database(e),
        }
    }
}

impl From<validator::ValidationErrors> for ReservationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ReservationError::Validation(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_not_found_display() {
        let err = ReservationError::ResourceNotFound {
            kind: ResourceKind::Table,
            id: 9,
        };
        assert_eq!(err.to_string(), "table with id 9 not found");
    }

    #[test]
    fn test_error_from_sqlx() {
        let err: ReservationError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ReservationError::Database(_)));
    }

    #[test]
    fn test_error_from_catalog() {
        let err: ReservationError = CatalogError::Database(sqlx::Error::PoolClosed).into();
        assert!(matches!(err, ReservationError::Database(_)));
    }

    #[test]
    fn test_invalid_interval_display() {
        use chrono::NaiveTime;
        let inner = InvalidInterval {
            start: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        };
        let err: ReservationError = inner.into();
        assert!(err.to_string().contains("must be after start"));
    }
}
