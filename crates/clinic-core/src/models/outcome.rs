//! Appointment outcome models.

use serde::{Deserialize, Serialize};

use super::{Appointment, Prescription};

/// Fee charged for every completed appointment before medication.
pub const APPOINTMENT_BASE_FEE: f64 = 20.0;

/// Clinical and billing record of a completed appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentOutcome {
    /// Appointment this outcome belongs to (1:1)
    pub appointment_id: String,
    /// When the outcome was recorded (RFC 3339)
    pub recorded_at: String,
    /// Services rendered
    pub services: String,
    /// Consultation notes
    pub notes: String,
    /// Base fee plus every dispensed prescription so far
    pub cost: f64,
}

impl AppointmentOutcome {
    /// Create an outcome charged at the base fee.
    pub fn new(appointment_id: String, services: String, notes: String) -> Self {
        Self {
            appointment_id,
            recorded_at: chrono::Utc::now().to_rfc3339(),
            services,
            notes,
            cost: APPOINTMENT_BASE_FEE,
        }
    }

    /// Add the cost of a dispensed prescription.
    pub fn charge(&mut self, amount: f64) {
        self.cost += amount;
    }
}

/// A completed appointment with its outcome and prescriptions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutcomeRecord {
    pub appointment: Appointment,
    pub outcome: AppointmentOutcome,
    pub prescriptions: Vec<Prescription>,
}
