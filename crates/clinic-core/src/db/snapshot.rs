//! Bulk load/save of every entity collection.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Database, DbResult};
use crate::models::{
    Appointment, AppointmentOutcome, MedicalRecord, Medicine, Prescription, ReplenishmentRequest,
};

/// Every collection the engine owns, in store order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub appointments: Vec<Appointment>,
    pub outcomes: Vec<AppointmentOutcome>,
    pub prescriptions: Vec<Prescription>,
    pub medicines: Vec<Medicine>,
    pub replenishment_requests: Vec<ReplenishmentRequest>,
    #[serde(default)]
    pub medical_records: Vec<MedicalRecord>,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Write the snapshot to a JSON file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> DbResult<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Read a snapshot from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

impl Database {
    /// Export every collection.
    pub fn export_snapshot(&self) -> DbResult<Snapshot> {
        Ok(Snapshot {
            appointments: self.list_appointments()?,
            outcomes: self.list_outcomes()?,
            prescriptions: self.list_prescriptions()?,
            medicines: self.list_medicines()?,
            replenishment_requests: self.list_replenishment_requests()?,
            medical_records: self.list_medical_records()?,
        })
    }

    /// Replace all stored entities with the snapshot's, in one transaction.
    ///
    /// Nothing is changed if any entity is rejected.
    pub fn import_snapshot(&self, snapshot: &Snapshot) -> DbResult<()> {
        self.atomically(|db| {
            db.conn.execute_batch(
                r#"
                DELETE FROM prescriptions;
                DELETE FROM appointment_outcomes;
                DELETE FROM replenishment_requests;
                DELETE FROM medical_records;
                DELETE FROM appointments;
                DELETE FROM medicines;
                "#,
            )?;

            // Parents before children
            for medicine in &snapshot.medicines {
                db.insert_medicine(medicine)?;
            }
            for appointment in &snapshot.appointments {
                db.insert_appointment(appointment)?;
            }
            for outcome in &snapshot.outcomes {
                db.insert_outcome(outcome)?;
            }
            for prescription in &snapshot.prescriptions {
                db.insert_prescription(prescription)?;
            }
            for request in &snapshot.replenishment_requests {
                db.insert_replenishment_request(request)?;
            }
            for record in &snapshot.medical_records {
                db.insert_medical_record(record)?;
            }
            Ok(())
        })
    }
}
