//! Billing statements for completed appointments.

use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::engine::{require_role, EngineError, EngineResult};
use crate::models::slot_time::{format_date, format_time};
use crate::models::{
    Appointment, AppointmentOutcome, AppointmentStatus, Prescription, PrescriptionStatus,
    Principal, Role, APPOINTMENT_BASE_FEE,
};

/// Billing statement for a single completed appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillingStatement {
    pub metadata: StatementMetadata,
    /// Base fee first, then one line per dispensed prescription
    pub lines: Vec<BillingLine>,
    /// Accumulated outcome cost
    pub total: f64,
}

/// Statement metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatementMetadata {
    pub appointment_id: String,
    pub patient_id: String,
    pub practitioner_id: String,
    pub practitioner_name: String,
    /// Slot date (dd/MM/yy)
    pub date: String,
    /// Slot time (HH:mm)
    pub time: String,
    pub services: String,
    /// When the outcome was recorded
    pub recorded_at: String,
}

/// Single charge on a statement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillingLine {
    pub description: String,
    /// Dispensed prescription, if this is a medication charge
    pub prescription_id: Option<String>,
    pub quantity: u32,
    pub unit_cost: f64,
    pub amount: f64,
}

impl BillingStatement {
    /// Build a statement from an outcome and the medicines its prescriptions reference.
    ///
    /// Pending prescriptions are not billed.
    pub fn from_outcome(
        appointment: &Appointment,
        outcome: &AppointmentOutcome,
        prescriptions: &[Prescription],
        unit_cost: impl Fn(&str) -> Option<f64>,
    ) -> Self {
        let mut lines = vec![BillingLine {
            description: "Consultation fee".to_string(),
            prescription_id: None,
            quantity: 1,
            unit_cost: APPOINTMENT_BASE_FEE,
            amount: APPOINTMENT_BASE_FEE,
        }];

        for prescription in prescriptions {
            if prescription.status != PrescriptionStatus::Dispensed {
                continue;
            }
            let cost = unit_cost(&prescription.medication).unwrap_or_default();
            lines.push(BillingLine {
                description: prescription.medication.clone(),
                prescription_id: Some(prescription.prescription_id.clone()),
                quantity: prescription.quantity,
                unit_cost: cost,
                amount: cost * f64::from(prescription.quantity),
            });
        }

        Self {
            metadata: StatementMetadata {
                appointment_id: appointment.appointment_id.clone(),
                patient_id: appointment.patient_id.clone().unwrap_or_default(),
                practitioner_id: appointment.practitioner_id.clone(),
                practitioner_name: appointment.practitioner_name.clone(),
                date: format_date(&appointment.date),
                time: format_time(&appointment.time),
                services: outcome.services.clone(),
                recorded_at: outcome.recorded_at.clone(),
            },
            lines,
            total: outcome.cost,
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    fn write_csv_lines(&self, csv: &mut String) {
        for line in &self.lines {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{},{:.2},{:.2}\n",
                escape_csv(&self.metadata.appointment_id),
                escape_csv(&self.metadata.patient_id),
                escape_csv(&self.metadata.practitioner_id),
                escape_csv(&self.metadata.date),
                escape_csv(&self.metadata.time),
                escape_csv(&line.description),
                line.prescription_id.as_deref().unwrap_or(""),
                line.quantity,
                line.unit_cost,
                line.amount,
            ));
        }
    }

    /// Export to CSV format.
    pub fn to_csv(&self) -> String {
        let mut csv = String::from(CSV_HEADER);
        self.write_csv_lines(&mut csv);
        csv
    }
}

const CSV_HEADER: &str =
    "appointment_id,patient_id,practitioner_id,date,time,description,prescription_id,quantity,unit_cost,amount\n";

/// Batch of statements.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillingBatch {
    /// Export timestamp
    pub exported_at: String,
    pub statements: Vec<BillingStatement>,
    /// Total line count across statements
    pub total_lines: usize,
    /// Sum of statement totals
    pub grand_total: f64,
}

impl BillingBatch {
    fn new(statements: Vec<BillingStatement>) -> Self {
        Self {
            exported_at: chrono::Utc::now().to_rfc3339(),
            total_lines: statements.iter().map(|s| s.lines.len()).sum(),
            grand_total: statements.iter().map(|s| s.total).sum(),
            statements,
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV format.
    pub fn to_csv(&self) -> String {
        let mut csv = String::from(CSV_HEADER);
        for statement in &self.statements {
            statement.write_csv_lines(&mut csv);
        }
        csv
    }
}

/// Billing exporter.
pub struct BillingExporter<'a> {
    db: &'a Database,
}

impl<'a> BillingExporter<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Statement for one completed appointment. Patients may only fetch their own.
    pub fn statement_for(&self, caller: &Principal, appointment_id: &str) -> EngineResult<BillingStatement> {
        require_role(caller, &[Role::Administrator, Role::Patient])?;

        let appointment = self
            .db
            .get_appointment(appointment_id)?
            .ok_or_else(|| EngineError::NotFound(format!("Appointment {}", appointment_id)))?;
        if caller.role == Role::Patient && appointment.patient_id.as_deref() != Some(caller.id.as_str()) {
            return Err(EngineError::Forbidden(format!(
                "Appointment {} belongs to another patient",
                appointment_id
            )));
        }
        if appointment.status != AppointmentStatus::Completed {
            return Err(EngineError::InvalidState(format!(
                "Appointment {} is {} and has no bill",
                appointment_id, appointment.status
            )));
        }
        self.build(&appointment)
    }

    /// Statements for every completed appointment.
    pub fn export_all(&self, admin: &Principal) -> EngineResult<BillingBatch> {
        require_role(admin, &[Role::Administrator])?;

        let completed = self
            .db
            .list_appointments_by_status(AppointmentStatus::Completed)?;
        let statements = completed
            .iter()
            .map(|appointment| self.build(appointment))
            .collect::<EngineResult<Vec<_>>>()?;

        tracing::info!(statements = statements.len(), "Billing exported");
        Ok(BillingBatch::new(statements))
    }

    /// Statements for one patient's completed appointments.
    pub fn export_for_patient(&self, patient: &Principal) -> EngineResult<BillingBatch> {
        require_role(patient, &[Role::Patient])?;

        let statements = self
            .db
            .list_appointments_for_patient(&patient.id)?
            .iter()
            .filter(|a| a.status == AppointmentStatus::Completed)
            .map(|appointment| self.build(appointment))
            .collect::<EngineResult<Vec<_>>>()?;

        Ok(BillingBatch::new(statements))
    }

    fn build(&self, appointment: &Appointment) -> EngineResult<BillingStatement> {
        let outcome = self
            .db
            .get_outcome(&appointment.appointment_id)?
            .ok_or_else(|| {
                EngineError::NotFound(format!("Outcome for {}", appointment.appointment_id))
            })?;
        let prescriptions = self
            .db
            .list_prescriptions_for_appointment(&appointment.appointment_id)?;
        let medicines = self.db.list_medicines()?;

        Ok(BillingStatement::from_outcome(
            appointment,
            &outcome,
            &prescriptions,
            |name| medicines.iter().find(|m| m.name == name).map(|m| m.unit_cost),
        ))
    }
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
