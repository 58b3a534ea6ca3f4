//! Error taxonomy for scheduling operations.
//!
//! Domain failures each get their own variant so callers can branch
//! without string matching; infrastructure failures are wrapped.

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use crate::db::DatabaseError;
use crate::models::AppointmentStatus;

#[derive(Error, Debug)]
pub enum SchedulingError {
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Slot not available on {date} at {start_time}: {reason}")]
    SlotUnavailable {
        date: NaiveDate,
        start_time: NaiveTime,
        reason: String,
    },

    #[error("Invalid status transition: {} -> {}", from.as_str(), to.as_str())]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Appointment {id} was modified concurrently (expected status {expected})")]
    ConcurrentModification { id: String, expected: String },

    #[error("Database error: {0}")]
    Database(DatabaseError),
}

/// Storage-level misses keep their meaning at this layer: an unknown id
/// stays NotFound, a missed status predicate becomes
/// ConcurrentModification. Everything else is infrastructure.
impl From<DatabaseError> for SchedulingError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::NotFound { entity_type, id } => Self::NotFound { entity_type, id },
            DatabaseError::StaleStatus { id, expected } => {
                Self::ConcurrentModification { id, expected }
            }
            other => Self::Database(other),
        }
    }
}
