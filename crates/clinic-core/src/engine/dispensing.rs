//! Prescription fulfilment.
//!
//! Dispensing touches three rows: the medicine (stock), the outcome (cost)
//! and the prescription (status). They are written in that order inside a
//! single transaction, so either all three change or none do.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::db::Database;
use crate::models::{Medicine, Prescription, PrescriptionStatus, Principal, Role};

use super::{require_role, EngineError, EngineResult};

/// Result of a successful dispense.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispenseReceipt {
    pub prescription: Prescription,
    /// Medicine after the stock decrement
    pub medicine: Medicine,
    /// Amount added to the outcome
    pub charged: f64,
    /// Outcome cost after the charge
    pub outcome_cost: f64,
}

pub struct Dispensary<'a> {
    db: &'a Database,
}

impl<'a> Dispensary<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Every prescription not yet dispensed, oldest first.
    pub fn pending_prescriptions(&self, pharmacist: &Principal) -> EngineResult<Vec<Prescription>> {
        require_role(pharmacist, &[Role::Pharmacist])?;
        Ok(self
            .db
            .list_prescriptions_by_status(PrescriptionStatus::Pending)?)
    }

    /// Fulfil a pending prescription.
    ///
    /// Stock is decremented without a floor, so it may go negative. A
    /// prescription that is already dispensed is rejected and nothing changes.
    pub fn dispense(&self, pharmacist: &Principal, prescription_id: &str) -> EngineResult<DispenseReceipt> {
        require_role(pharmacist, &[Role::Pharmacist])?;

        self.db.atomically(|db| {
            let mut prescription = db.get_prescription(prescription_id)?.ok_or_else(|| {
                EngineError::NotFound(format!("Prescription {}", prescription_id))
            })?;
            if prescription.is_dispensed() {
                warn!(prescription_id, "Prescription already dispensed");
                return Err(EngineError::InvalidState(format!(
                    "Prescription {} has already been dispensed",
                    prescription_id
                )));
            }

            let mut medicine = db.get_medicine(&prescription.medication)?.ok_or_else(|| {
                EngineError::NotFound(format!("Medicine {}", prescription.medication))
            })?;
            let mut outcome = db.get_outcome(&prescription.appointment_id)?.ok_or_else(|| {
                EngineError::NotFound(format!("Outcome for {}", prescription.appointment_id))
            })?;

            let charged = medicine.cost_of(prescription.quantity);
            medicine.decrease(i64::from(prescription.quantity))?;
            outcome.charge(charged);

            db.update_medicine(&medicine)?;
            db.update_outcome_cost(&outcome.appointment_id, outcome.cost)?;
            if !db.mark_prescription_dispensed(&prescription.prescription_id)? {
                return Err(EngineError::InvalidState(format!(
                    "Prescription {} is no longer pending",
                    prescription_id
                )));
            }
            prescription.status = PrescriptionStatus::Dispensed;

            if medicine.check_low_stock() {
                warn!(
                    medicine = %medicine.name,
                    stock = medicine.stock,
                    threshold = medicine.alert_threshold,
                    "Medicine at or below alert threshold"
                );
            }
            info!(
                prescription_id,
                medicine = %medicine.name,
                quantity = prescription.quantity,
                charged,
                outcome_cost = outcome.cost,
                "Prescription dispensed"
            );

            Ok(DispenseReceipt {
                prescription,
                medicine,
                charged,
                outcome_cost: outcome.cost,
            })
        })
    }
}
