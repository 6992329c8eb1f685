//! Clinic Core Library
//!
//! Appointment scheduling and fulfilment engine for a single clinic: bookable
//! slots, the request/approval lifecycle, outcome recording, prescription
//! dispensing and medicine replenishment.
//!
//! # Architecture
//!
//! ```text
//!  Doctor ──create──▶ OPEN ──patient books──▶ PENDING ──doctor approves──▶ SCHEDULED
//!                      │  ▲                     │                            │
//!                cancel│  └──decline / release──┘◀────── patient cancels ────┤
//!                      ▼                                                     │
//!                  CANCELLED                               doctor records outcome
//!                                                                            │
//!                                                                            ▼
//!                                             ┌──────────────── COMPLETED + Outcome (fee 20)
//!                                             │                       │
//!                                             ▼                       ▼
//!                                      Prescriptions ──dispense──▶ stock −q, cost +unit×q
//!                                                                     │
//!                                Medicine at/below threshold ◀────────┘
//!                                             │
//!                              pharmacist files request ──admin approves──▶ stock +amount
//! ```
//!
//! # Core Principle
//!
//! **Every multi-entity effect is one SQLite transaction.** A failed operation
//! leaves no partial state behind.
//!
//! # Modules
//!
//! - [`db`]: SQLite persistence and bulk snapshots
//! - [`models`]: Domain types (Appointment, Medicine, Prescription, etc.)
//! - [`engine`]: Role-scoped use-cases (scheduling, outcomes, dispensing, inventory, records)
//! - [`export`]: Billing statements
//! - [`config`]: Environment configuration and tracing

pub mod config;
pub mod db;
pub mod engine;
pub mod export;
pub mod models;

// Re-export commonly used types
pub use config::ClinicConfig;
pub use db::{Database, DbError, Snapshot};
pub use engine::{
    Dispensary, DispenseReceipt, EngineError, EngineResult, Inventory, OutcomeReceipt,
    OutcomeRecorder, PatientHistory, RecordKeeper, ReplenishmentReceipt, Scheduler,
};
pub use export::{BillingBatch, BillingExporter, BillingStatement};
pub use models::{
    Appointment, AppointmentOutcome, AppointmentStatus, MedicalRecord, Medicine, MedicineStock,
    OutcomeRecord, Prescription, PrescriptionOrder, PrescriptionStatus, Principal,
    RejectedOrder, ReplenishmentRequest, ReplenishmentStatus, Role,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use engine::require_role;
use models::slot_time::{format_date, format_time};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ClinicError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Validation failed: {0}")]
    ValidationFailure(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Storage failure: {0}")]
    StorageFailure(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<EngineError> for ClinicError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::NotFound(msg) => ClinicError::NotFound(msg),
            EngineError::InvalidState(msg) => ClinicError::InvalidState(msg),
            EngineError::Validation(msg) => ClinicError::ValidationFailure(msg),
            EngineError::Conflict(msg) => ClinicError::Conflict(msg),
            EngineError::Forbidden(msg) => ClinicError::Forbidden(msg),
            EngineError::Storage(e) => ClinicError::StorageFailure(e.to_string()),
        }
    }
}

impl From<DbError> for ClinicError {
    fn from(e: DbError) -> Self {
        ClinicError::StorageFailure(e.to_string())
    }
}

impl From<serde_json::Error> for ClinicError {
    fn from(e: serde_json::Error) -> Self {
        ClinicError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for ClinicError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        ClinicError::StorageFailure(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

fn wrap(db: Database) -> Arc<ClinicCore> {
    Arc::new(ClinicCore {
        db: Arc::new(Mutex::new(db)),
    })
}

/// Open or create a clinic database at the given path.
#[uniffi::export]
pub fn open_clinic(path: String) -> Result<Arc<ClinicCore>, ClinicError> {
    Ok(wrap(Database::open(&path)?))
}

/// Create an in-memory clinic (for testing).
#[uniffi::export]
pub fn open_clinic_in_memory() -> Result<Arc<ClinicCore>, ClinicError> {
    Ok(wrap(Database::open_in_memory()?))
}

/// Open the clinic configured by `CLINIC_DB_PATH`, installing tracing first.
#[uniffi::export]
pub fn open_clinic_from_env() -> Result<Arc<ClinicCore>, ClinicError> {
    let config = ClinicConfig::from_env().map_err(|e| ClinicError::ConfigError(format!("{:#}", e)))?;
    config.init_tracing();
    tracing::info!(path = %config.database_path.display(), "Opening clinic database");
    Ok(wrap(Database::open(&config.database_path)?))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe clinic handle for FFI.
///
/// One lock serialises every call; each call that touches several entities
/// commits them in a single transaction.
#[derive(uniffi::Object)]
pub struct ClinicCore {
    db: Arc<Mutex<Database>>,
}

#[uniffi::export]
impl ClinicCore {
    // =========================================================================
    // Doctor Operations
    // =========================================================================

    pub fn create_slot(
        &self,
        doctor: FfiPrincipal,
        date: String,
        time: String,
    ) -> Result<FfiAppointment, ClinicError> {
        let db = self.db.lock()?;
        let slot = Scheduler::new(&db).create_slot(&principal(doctor)?, &date, &time)?;
        Ok(slot.into())
    }

    pub fn cancel_slot(
        &self,
        doctor: FfiPrincipal,
        date: String,
        time: String,
    ) -> Result<FfiAppointment, ClinicError> {
        let db = self.db.lock()?;
        let slot = Scheduler::new(&db).cancel_slot(&principal(doctor)?, &date, &time)?;
        Ok(slot.into())
    }

    /// Booking requests awaiting this doctor's decision.
    pub fn pending_requests(&self, doctor: FfiPrincipal) -> Result<Vec<FfiAppointment>, ClinicError> {
        let db = self.db.lock()?;
        let pending = Scheduler::new(&db).pending_requests(&principal(doctor)?)?;
        Ok(pending.into_iter().map(Into::into).collect())
    }

    pub fn approve_request(
        &self,
        doctor: FfiPrincipal,
        appointment_id: String,
    ) -> Result<FfiAppointment, ClinicError> {
        let db = self.db.lock()?;
        let appointment = Scheduler::new(&db).approve_request(&principal(doctor)?, &appointment_id)?;
        Ok(appointment.into())
    }

    pub fn decline_request(
        &self,
        doctor: FfiPrincipal,
        appointment_id: String,
    ) -> Result<FfiAppointment, ClinicError> {
        let db = self.db.lock()?;
        let appointment = Scheduler::new(&db).decline_request(&principal(doctor)?, &appointment_id)?;
        Ok(appointment.into())
    }

    pub fn personal_schedule(&self, doctor: FfiPrincipal) -> Result<Vec<FfiAppointment>, ClinicError> {
        let db = self.db.lock()?;
        let schedule = Scheduler::new(&db).personal_schedule(&principal(doctor)?)?;
        Ok(schedule.into_iter().map(Into::into).collect())
    }

    pub fn upcoming_appointments(&self, doctor: FfiPrincipal) -> Result<Vec<FfiAppointment>, ClinicError> {
        let db = self.db.lock()?;
        let upcoming = Scheduler::new(&db).upcoming_appointments(&principal(doctor)?)?;
        Ok(upcoming.into_iter().map(Into::into).collect())
    }

    /// Complete the scheduled appointment at `date`/`time`.
    ///
    /// Unknown medications and non-positive quantities come back in `rejected`;
    /// they do not stop the outcome from being recorded.
    pub fn record_outcome(
        &self,
        doctor: FfiPrincipal,
        date: String,
        time: String,
        services: String,
        notes: String,
        orders: Vec<FfiPrescriptionOrder>,
    ) -> Result<FfiOutcomeReceipt, ClinicError> {
        let db = self.db.lock()?;
        let orders: Vec<PrescriptionOrder> = orders.into_iter().map(Into::into).collect();
        let receipt = OutcomeRecorder::new(&db).record_outcome(
            &principal(doctor)?,
            &date,
            &time,
            &services,
            &notes,
            &orders,
        )?;
        Ok(receipt.into())
    }

    /// Complete one of the doctor's scheduled appointments by ID.
    pub fn record_outcome_by_id(
        &self,
        doctor: FfiPrincipal,
        appointment_id: String,
        services: String,
        notes: String,
        orders: Vec<FfiPrescriptionOrder>,
    ) -> Result<FfiOutcomeReceipt, ClinicError> {
        let db = self.db.lock()?;
        let orders: Vec<PrescriptionOrder> = orders.into_iter().map(Into::into).collect();
        let receipt = OutcomeRecorder::new(&db).record_outcome_for(
            &principal(doctor)?,
            &appointment_id,
            &services,
            &notes,
            &orders,
        )?;
        Ok(receipt.into())
    }

    pub fn patient_records(&self, doctor: FfiPrincipal) -> Result<Vec<FfiPatientHistory>, ClinicError> {
        let db = self.db.lock()?;
        let histories = RecordKeeper::new(&db).patient_records(&principal(doctor)?)?;
        Ok(histories.into_iter().map(Into::into).collect())
    }

    pub fn add_medical_record(
        &self,
        doctor: FfiPrincipal,
        patient_id: String,
        diagnosis: String,
        treatment: String,
    ) -> Result<FfiMedicalRecord, ClinicError> {
        let db = self.db.lock()?;
        let record = RecordKeeper::new(&db).add_record(&principal(doctor)?, &patient_id, &diagnosis, &treatment)?;
        Ok(record.into())
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Every bookable slot.
    pub fn open_slots(&self) -> Result<Vec<FfiAppointment>, ClinicError> {
        let db = self.db.lock()?;
        let slots = Scheduler::new(&db).open_slots()?;
        Ok(slots.into_iter().map(Into::into).collect())
    }

    pub fn book(
        &self,
        patient: FfiPrincipal,
        doctor_id: String,
        date: String,
        time: String,
    ) -> Result<FfiAppointment, ClinicError> {
        let db = self.db.lock()?;
        let booked = Scheduler::new(&db).book(&principal(patient)?, &doctor_id, &date, &time)?;
        Ok(booked.into())
    }

    pub fn cancel_booking(
        &self,
        patient: FfiPrincipal,
        doctor_id: String,
        date: String,
        time: String,
    ) -> Result<FfiAppointment, ClinicError> {
        let db = self.db.lock()?;
        let released = Scheduler::new(&db).cancel_booking(&principal(patient)?, &doctor_id, &date, &time)?;
        Ok(released.into())
    }

    /// Move a booking; the original is kept if the new slot cannot be booked.
    pub fn reschedule(
        &self,
        patient: FfiPrincipal,
        from: FfiSlotKey,
        to: FfiSlotKey,
    ) -> Result<FfiAppointment, ClinicError> {
        let db = self.db.lock()?;
        let booked = Scheduler::new(&db).reschedule(
            &principal(patient)?,
            (from.doctor_id.as_str(), from.date.as_str(), from.time.as_str()),
            (to.doctor_id.as_str(), to.date.as_str(), to.time.as_str()),
        )?;
        Ok(booked.into())
    }

    pub fn my_appointments(&self, patient: FfiPrincipal) -> Result<Vec<FfiAppointment>, ClinicError> {
        let db = self.db.lock()?;
        let mine = Scheduler::new(&db).my_appointments(&principal(patient)?)?;
        Ok(mine.into_iter().map(Into::into).collect())
    }

    pub fn my_outcomes(&self, patient: FfiPrincipal) -> Result<Vec<FfiOutcomeRecord>, ClinicError> {
        let db = self.db.lock()?;
        let outcomes = OutcomeRecorder::new(&db).my_outcomes(&principal(patient)?)?;
        Ok(outcomes.into_iter().map(Into::into).collect())
    }

    pub fn my_records(&self, patient: FfiPrincipal) -> Result<Vec<FfiMedicalRecord>, ClinicError> {
        let db = self.db.lock()?;
        let records = RecordKeeper::new(&db).my_records(&principal(patient)?)?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    /// One appointment's outcome, if the caller may see it.
    pub fn outcome_for(
        &self,
        caller: FfiPrincipal,
        appointment_id: String,
    ) -> Result<FfiOutcomeRecord, ClinicError> {
        let db = self.db.lock()?;
        let record = OutcomeRecorder::new(&db).outcome_record(&principal(caller)?, &appointment_id)?;
        Ok(record.into())
    }

    // =========================================================================
    // Pharmacist Operations
    // =========================================================================

    /// Completed appointments with their outcomes (pharmacist or administrator).
    pub fn all_outcomes(&self, caller: FfiPrincipal) -> Result<Vec<FfiOutcomeRecord>, ClinicError> {
        let db = self.db.lock()?;
        let outcomes = OutcomeRecorder::new(&db).all_outcomes(&principal(caller)?)?;
        Ok(outcomes.into_iter().map(Into::into).collect())
    }

    pub fn pending_prescriptions(&self, pharmacist: FfiPrincipal) -> Result<Vec<FfiPrescription>, ClinicError> {
        let db = self.db.lock()?;
        let pending = Dispensary::new(&db).pending_prescriptions(&principal(pharmacist)?)?;
        Ok(pending.into_iter().map(Into::into).collect())
    }

    pub fn dispense(
        &self,
        pharmacist: FfiPrincipal,
        prescription_id: String,
    ) -> Result<FfiDispenseReceipt, ClinicError> {
        let db = self.db.lock()?;
        let receipt = Dispensary::new(&db).dispense(&principal(pharmacist)?, &prescription_id)?;
        Ok(receipt.into())
    }

    pub fn file_request(
        &self,
        pharmacist: FfiPrincipal,
        medicine: String,
        amount: i64,
    ) -> Result<FfiReplenishmentRequest, ClinicError> {
        let db = self.db.lock()?;
        let request = Inventory::new(&db).file_request(&principal(pharmacist)?, &medicine, amount)?;
        Ok(request.into())
    }

    /// Every medicine with its low-stock flag (pharmacist or administrator).
    pub fn inventory(&self, caller: FfiPrincipal) -> Result<Vec<FfiMedicine>, ClinicError> {
        let db = self.db.lock()?;
        let stock = Inventory::new(&db).inventory(&principal(caller)?)?;
        Ok(stock.into_iter().map(Into::into).collect())
    }

    // =========================================================================
    // Administrator Operations
    // =========================================================================

    pub fn all_appointments(&self, admin: FfiPrincipal) -> Result<Vec<FfiAppointment>, ClinicError> {
        let db = self.db.lock()?;
        let all = Scheduler::new(&db).all_appointments(&principal(admin)?)?;
        Ok(all.into_iter().map(Into::into).collect())
    }

    pub fn add_medicine(
        &self,
        admin: FfiPrincipal,
        name: String,
        unit_cost: f64,
        stock: i64,
        alert_threshold: i64,
    ) -> Result<FfiMedicine, ClinicError> {
        let db = self.db.lock()?;
        let medicine =
            Inventory::new(&db).add_medicine(&principal(admin)?, &name, unit_cost, stock, alert_threshold)?;
        Ok(MedicineStock::from(medicine).into())
    }

    pub fn set_alert_threshold(
        &self,
        admin: FfiPrincipal,
        medicine: String,
        level: i64,
    ) -> Result<FfiMedicine, ClinicError> {
        let db = self.db.lock()?;
        let updated = Inventory::new(&db).set_alert_threshold(&principal(admin)?, &medicine, level)?;
        Ok(MedicineStock::from(updated).into())
    }

    pub fn pending_replenishments(
        &self,
        admin: FfiPrincipal,
    ) -> Result<Vec<FfiReplenishmentRequest>, ClinicError> {
        let db = self.db.lock()?;
        let pending = Inventory::new(&db).pending_replenishments(&principal(admin)?)?;
        Ok(pending.into_iter().map(Into::into).collect())
    }

    pub fn approve_replenishment(
        &self,
        admin: FfiPrincipal,
        request_id: String,
    ) -> Result<FfiReplenishmentReceipt, ClinicError> {
        let db = self.db.lock()?;
        let receipt = Inventory::new(&db).approve_replenishment(&principal(admin)?, &request_id)?;
        Ok(receipt.into())
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Export billing statements as JSON.
    pub fn export_billing_json(&self, admin: FfiPrincipal) -> Result<String, ClinicError> {
        let db = self.db.lock()?;
        let batch = BillingExporter::new(&db).export_all(&principal(admin)?)?;
        Ok(batch.to_json()?)
    }

    /// Export billing statements as CSV.
    pub fn export_billing_csv(&self, admin: FfiPrincipal) -> Result<String, ClinicError> {
        let db = self.db.lock()?;
        let batch = BillingExporter::new(&db).export_all(&principal(admin)?)?;
        Ok(batch.to_csv())
    }

    /// The patient's own billing statements as CSV.
    pub fn my_billing_csv(&self, patient: FfiPrincipal) -> Result<String, ClinicError> {
        let db = self.db.lock()?;
        let batch = BillingExporter::new(&db).export_for_patient(&principal(patient)?)?;
        Ok(batch.to_csv())
    }

    /// One appointment's billing statement as JSON (administrator or its patient).
    pub fn billing_statement_json(
        &self,
        caller: FfiPrincipal,
        appointment_id: String,
    ) -> Result<String, ClinicError> {
        let db = self.db.lock()?;
        let statement = BillingExporter::new(&db).statement_for(&principal(caller)?, &appointment_id)?;
        Ok(statement.to_json()?)
    }

    /// One appointment's billing statement as CSV (administrator or its patient).
    pub fn billing_statement_csv(
        &self,
        caller: FfiPrincipal,
        appointment_id: String,
    ) -> Result<String, ClinicError> {
        let db = self.db.lock()?;
        let statement = BillingExporter::new(&db).statement_for(&principal(caller)?, &appointment_id)?;
        Ok(statement.to_csv())
    }

    /// Export every collection as a JSON snapshot.
    pub fn export_snapshot_json(&self, admin: FfiPrincipal) -> Result<String, ClinicError> {
        require_role(&principal(admin)?, &[Role::Administrator])?;
        let db = self.db.lock()?;
        Ok(db.export_snapshot()?.to_json()?)
    }

    /// Replace every collection with the contents of a JSON snapshot.
    pub fn import_snapshot_json(&self, admin: FfiPrincipal, json: String) -> Result<(), ClinicError> {
        require_role(&principal(admin)?, &[Role::Administrator])?;
        let snapshot = Snapshot::from_json(&json)?;
        let db = self.db.lock()?;
        db.import_snapshot(&snapshot)?;
        Ok(())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe caller identity. `role` is one of patient, doctor, pharmacist, administrator.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrincipal {
    pub id: String,
    pub name: String,
    pub role: String,
}

impl TryFrom<FfiPrincipal> for Principal {
    type Error = ClinicError;

    fn try_from(principal: FfiPrincipal) -> Result<Self, Self::Error> {
        let role = Role::parse(&principal.role).ok_or_else(|| {
            ClinicError::ValidationFailure(format!("Unknown role: {}", principal.role))
        })?;
        Ok(Principal::new(principal.id, principal.name, role))
    }
}

fn principal(caller: FfiPrincipal) -> Result<Principal, ClinicError> {
    caller.try_into()
}

/// FFI-safe slot key (`dd/MM/yy`, `HH:mm`).
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSlotKey {
    pub doctor_id: String,
    pub date: String,
    pub time: String,
}

/// FFI-safe appointment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointment {
    pub appointment_id: String,
    pub practitioner_id: String,
    pub practitioner_name: String,
    pub date: String,
    pub time: String,
    pub patient_id: Option<String>,
    pub status: String,
}

impl From<Appointment> for FfiAppointment {
    fn from(appointment: Appointment) -> Self {
        Self {
            date: format_date(&appointment.date),
            time: format_time(&appointment.time),
            status: appointment.status.to_string(),
            appointment_id: appointment.appointment_id,
            practitioner_id: appointment.practitioner_id,
            practitioner_name: appointment.practitioner_name,
            patient_id: appointment.patient_id,
        }
    }
}

/// FFI-safe medicine with its low-stock flag.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicine {
    pub name: String,
    pub unit_cost: f64,
    pub stock: i64,
    pub alert_threshold: i64,
    pub low_stock: bool,
}

impl From<MedicineStock> for FfiMedicine {
    fn from(stock: MedicineStock) -> Self {
        Self {
            name: stock.medicine.name,
            unit_cost: stock.medicine.unit_cost,
            stock: stock.medicine.stock,
            alert_threshold: stock.medicine.alert_threshold,
            low_stock: stock.low_stock,
        }
    }
}

/// FFI-safe prescription.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrescription {
    pub prescription_id: String,
    pub appointment_id: String,
    pub medication: String,
    pub quantity: u32,
    pub status: String,
}

impl From<Prescription> for FfiPrescription {
    fn from(prescription: Prescription) -> Self {
        Self {
            prescription_id: prescription.prescription_id,
            appointment_id: prescription.appointment_id,
            medication: prescription.medication,
            quantity: prescription.quantity,
            status: prescription.status.as_str().to_string(),
        }
    }
}

/// FFI-safe prescription order.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrescriptionOrder {
    pub medication: String,
    pub quantity: i64,
}

impl From<FfiPrescriptionOrder> for PrescriptionOrder {
    fn from(order: FfiPrescriptionOrder) -> Self {
        PrescriptionOrder::new(order.medication, order.quantity)
    }
}

/// FFI-safe rejected order.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRejectedOrder {
    pub medication: String,
    pub quantity: i64,
    pub reason: String,
}

impl From<RejectedOrder> for FfiRejectedOrder {
    fn from(rejected: RejectedOrder) -> Self {
        Self {
            medication: rejected.order.medication,
            quantity: rejected.order.quantity,
            reason: rejected.reason,
        }
    }
}

/// FFI-safe appointment outcome.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiOutcome {
    pub appointment_id: String,
    pub recorded_at: String,
    pub services: String,
    pub notes: String,
    pub cost: f64,
}

impl From<AppointmentOutcome> for FfiOutcome {
    fn from(outcome: AppointmentOutcome) -> Self {
        Self {
            appointment_id: outcome.appointment_id,
            recorded_at: outcome.recorded_at,
            services: outcome.services,
            notes: outcome.notes,
            cost: outcome.cost,
        }
    }
}

/// FFI-safe outcome with its appointment and prescriptions.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiOutcomeRecord {
    pub appointment: FfiAppointment,
    pub outcome: FfiOutcome,
    pub prescriptions: Vec<FfiPrescription>,
}

impl From<OutcomeRecord> for FfiOutcomeRecord {
    fn from(record: OutcomeRecord) -> Self {
        Self {
            appointment: record.appointment.into(),
            outcome: record.outcome.into(),
            prescriptions: record.prescriptions.into_iter().map(Into::into).collect(),
        }
    }
}

/// FFI-safe outcome recording result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiOutcomeReceipt {
    pub appointment: FfiAppointment,
    pub outcome: FfiOutcome,
    pub prescriptions: Vec<FfiPrescription>,
    pub rejected: Vec<FfiRejectedOrder>,
}

impl From<OutcomeReceipt> for FfiOutcomeReceipt {
    fn from(receipt: OutcomeReceipt) -> Self {
        Self {
            appointment: receipt.appointment.into(),
            outcome: receipt.outcome.into(),
            prescriptions: receipt.prescriptions.into_iter().map(Into::into).collect(),
            rejected: receipt.rejected.into_iter().map(Into::into).collect(),
        }
    }
}

/// FFI-safe dispense result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDispenseReceipt {
    pub prescription: FfiPrescription,
    pub medicine: FfiMedicine,
    pub charged: f64,
    pub outcome_cost: f64,
}

impl From<DispenseReceipt> for FfiDispenseReceipt {
    fn from(receipt: DispenseReceipt) -> Self {
        Self {
            prescription: receipt.prescription.into(),
            medicine: MedicineStock::from(receipt.medicine).into(),
            charged: receipt.charged,
            outcome_cost: receipt.outcome_cost,
        }
    }
}

/// FFI-safe replenishment request.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReplenishmentRequest {
    pub request_id: String,
    pub pharmacist_id: String,
    pub medicine_name: String,
    pub amount: i64,
    pub requested_at: String,
    pub status: String,
}

impl From<ReplenishmentRequest> for FfiReplenishmentRequest {
    fn from(request: ReplenishmentRequest) -> Self {
        Self {
            request_id: request.request_id,
            pharmacist_id: request.pharmacist_id,
            medicine_name: request.medicine_name,
            amount: request.amount,
            requested_at: request.requested_at,
            status: request.status.as_str().to_string(),
        }
    }
}

/// FFI-safe replenishment approval result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReplenishmentReceipt {
    pub request: FfiReplenishmentRequest,
    pub medicine: FfiMedicine,
}

impl From<ReplenishmentReceipt> for FfiReplenishmentReceipt {
    fn from(receipt: ReplenishmentReceipt) -> Self {
        Self {
            request: receipt.request.into(),
            medicine: MedicineStock::from(receipt.medicine).into(),
        }
    }
}

/// FFI-safe medical record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicalRecord {
    pub record_id: String,
    pub patient_id: String,
    pub author_id: String,
    pub diagnosis: String,
    pub treatment: String,
    pub recorded_at: String,
}

impl From<MedicalRecord> for FfiMedicalRecord {
    fn from(record: MedicalRecord) -> Self {
        Self {
            record_id: record.record_id,
            patient_id: record.patient_id,
            author_id: record.author_id,
            diagnosis: record.diagnosis,
            treatment: record.treatment,
            recorded_at: record.recorded_at,
        }
    }
}

/// FFI-safe patient history.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientHistory {
    pub patient_id: String,
    pub records: Vec<FfiMedicalRecord>,
}

impl From<PatientHistory> for FfiPatientHistory {
    fn from(history: PatientHistory) -> Self {
        Self {
            patient_id: history.patient_id,
            records: history.records.into_iter().map(Into::into).collect(),
        }
    }
}
