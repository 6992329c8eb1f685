//! Prescription models.

use serde::{Deserialize, Serialize};

/// Dispense status of a prescription.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PrescriptionStatus {
    Pending,
    /// Irreversible; stock and billing have been applied
    Dispensed,
}

impl PrescriptionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PrescriptionStatus::Pending => "pending",
            PrescriptionStatus::Dispensed => "dispensed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PrescriptionStatus::Pending),
            "dispensed" => Some(PrescriptionStatus::Dispensed),
            _ => None,
        }
    }
}

/// A medication issued as part of an appointment outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prescription {
    /// Unique prescription ID (UUID)
    pub prescription_id: String,
    /// Appointment this prescription belongs to
    pub appointment_id: String,
    /// Medicine name (references the ledger)
    pub medication: String,
    /// Units to dispense, always positive
    pub quantity: u32,
    pub status: PrescriptionStatus,
}

impl Prescription {
    /// Create a new pending prescription.
    pub fn new(appointment_id: String, medication: String, quantity: u32) -> Self {
        Self {
            prescription_id: uuid::Uuid::new_v4().to_string(),
            appointment_id,
            medication,
            quantity,
            status: PrescriptionStatus::Pending,
        }
    }

    pub fn is_dispensed(&self) -> bool {
        self.status == PrescriptionStatus::Dispensed
    }
}

/// A doctor's request to prescribe, before validation against the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrescriptionOrder {
    pub medication: String,
    /// Requested units; non-positive values are rejected
    pub quantity: i64,
}

impl PrescriptionOrder {
    pub fn new(medication: impl Into<String>, quantity: i64) -> Self {
        Self {
            medication: medication.into(),
            quantity,
        }
    }
}

/// An order that could not be turned into a prescription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RejectedOrder {
    pub order: PrescriptionOrder,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_prescription_is_pending() {
        let p = Prescription::new("appt-1".into(), "Paracetamol".into(), 2);
        assert_eq!(p.status, PrescriptionStatus::Pending);
        assert!(!p.is_dispensed());
        assert_eq!(p.prescription_id.len(), 36);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(PrescriptionStatus::parse("dispensed"), Some(PrescriptionStatus::Dispensed));
        assert_eq!(PrescriptionStatus::parse("DISPENSED"), None);
    }
}
