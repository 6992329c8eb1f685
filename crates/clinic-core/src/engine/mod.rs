//! Role-scoped use-cases over the clinic store.
//!
//! Every service borrows the [`Database`](crate::db::Database) it is handed and
//! runs each multi-entity effect inside one transaction. Nothing here holds state
//! of its own.

mod dispensing;
mod inventory;
mod outcomes;
mod records;
mod scheduling;

pub use dispensing::*;
pub use inventory::*;
pub use outcomes::*;
pub use records::*;
pub use scheduling::*;

use thiserror::Error;

use crate::db::DbError;
use crate::models::slot_time::SlotTimeError;
use crate::models::{InvalidTransition, Principal, Role, StockOverflow};

/// Use-case errors. All of them are recoverable by the caller.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Storage failure: {0}")]
    Storage(#[from] DbError),
}

impl From<InvalidTransition> for EngineError {
    fn from(e: InvalidTransition) -> Self {
        EngineError::InvalidState(e.to_string())
    }
}

impl From<StockOverflow> for EngineError {
    fn from(e: StockOverflow) -> Self {
        EngineError::Validation(e.to_string())
    }
}

impl From<SlotTimeError> for EngineError {
    fn from(e: SlotTimeError) -> Self {
        EngineError::Validation(e.to_string())
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(e: rusqlite::Error) -> Self {
        EngineError::Storage(DbError::from(e))
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Reject callers whose role is not in `allowed`.
pub(crate) fn require_role(principal: &Principal, allowed: &[Role]) -> EngineResult<()> {
    if allowed.contains(&principal.role) {
        return Ok(());
    }
    tracing::warn!(
        principal = %principal.id,
        role = %principal.role,
        "Operation refused for role"
    );
    Err(EngineError::Forbidden(format!(
        "{} {} may not perform this operation",
        principal.role, principal.id
    )))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppointmentStatus;
    use crate::models::SlotEvent;

    #[test]
    fn test_require_role() {
        let doctor = testing::doctor();
        assert!(require_role(&doctor, &[Role::Doctor]).is_ok());
        assert!(matches!(
            require_role(&doctor, &[Role::Patient, Role::Pharmacist]),
            Err(EngineError::Forbidden(_))
        ));
    }

    #[test]
    fn test_invalid_transition_maps_to_invalid_state() {
        let err: EngineError = InvalidTransition {
            appointment_id: "a1".into(),
            from: AppointmentStatus::Pending,
            event: SlotEvent::RequestBooking,
        }
        .into();
        assert!(matches!(err, EngineError::InvalidState(msg) if msg.contains("PENDING")));
    }

    #[test]
    fn test_stock_overflow_maps_to_validation() {
        let err: EngineError = StockOverflow {
            medicine: "Amoxicillin".into(),
            stock: 5,
            delta: i64::MAX,
        }
        .into();
        assert!(matches!(err, EngineError::Validation(msg) if msg.contains("Amoxicillin")));
    }
}
