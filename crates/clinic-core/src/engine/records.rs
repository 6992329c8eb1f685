//! Medical history, visible to a patient and to the doctors who have seen them.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::Database;
use crate::models::{MedicalRecord, Principal, Role};

use super::{require_role, EngineError, EngineResult};

/// One patient's history as seen by a doctor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientHistory {
    pub patient_id: String,
    pub records: Vec<MedicalRecord>,
}

pub struct RecordKeeper<'a> {
    db: &'a Database,
}

impl<'a> RecordKeeper<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Append a diagnosis/treatment entry for one of the doctor's patients.
    pub fn add_record(
        &self,
        doctor: &Principal,
        patient_id: &str,
        diagnosis: &str,
        treatment: &str,
    ) -> EngineResult<MedicalRecord> {
        require_role(doctor, &[Role::Doctor])?;
        if diagnosis.trim().is_empty() {
            return Err(EngineError::Validation("Diagnosis is empty".into()));
        }
        if !self.patients_of(doctor)?.iter().any(|p| p == patient_id) {
            return Err(EngineError::NotFound(format!(
                "Patient {} is not under the care of {}",
                patient_id, doctor.id
            )));
        }

        let record = MedicalRecord::new(
            patient_id.to_string(),
            doctor.id.clone(),
            diagnosis.trim().to_string(),
            treatment.trim().to_string(),
        );
        self.db.insert_medical_record(&record)?;

        info!(record_id = %record.record_id, patient = patient_id, author = %doctor.id, "Medical record added");
        Ok(record)
    }

    /// Histories of every patient who has booked with this doctor.
    pub fn patient_records(&self, doctor: &Principal) -> EngineResult<Vec<PatientHistory>> {
        require_role(doctor, &[Role::Doctor])?;

        self.patients_of(doctor)?
            .into_iter()
            .map(|patient_id| {
                let records = self.db.list_medical_records_for_patient(&patient_id)?;
                Ok(PatientHistory {
                    patient_id,
                    records,
                })
            })
            .collect()
    }

    pub fn my_records(&self, patient: &Principal) -> EngineResult<Vec<MedicalRecord>> {
        require_role(patient, &[Role::Patient])?;
        Ok(self.db.list_medical_records_for_patient(&patient.id)?)
    }

    /// Distinct patients holding (or having held) one of the doctor's slots, first seen first.
    fn patients_of(&self, doctor: &Principal) -> EngineResult<Vec<String>> {
        let mut patients: Vec<String> = Vec::new();
        for appointment in self.db.list_appointments_for_practitioner(&doctor.id)? {
            if !appointment.status.holds_patient() {
                continue;
            }
            if let Some(patient_id) = appointment.patient_id {
                if !patients.contains(&patient_id) {
                    patients.push(patient_id);
                }
            }
        }
        Ok(patients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::*;
    use crate::engine::Scheduler;

    fn booked(db: &Database) {
        let scheduler = Scheduler::new(db);
        scheduler.create_slot(&doctor(), "25/12/24", "14:30").unwrap();
        scheduler.book(&patient(), "D001", "25/12/24", "14:30").unwrap();
    }

    #[test]
    fn test_add_and_read_records() {
        let db = setup_db();
        booked(&db);
        let keeper = RecordKeeper::new(&db);

        let record = keeper
            .add_record(&doctor(), "P1001", "Influenza", "Rest, fluids")
            .unwrap();
        assert_eq!(record.author_id, "D001");

        let mine = keeper.my_records(&patient()).unwrap();
        assert_eq!(mine, vec![record]);

        let histories = keeper.patient_records(&doctor()).unwrap();
        assert_eq!(histories.len(), 1);
        assert_eq!(histories[0].patient_id, "P1001");
        assert_eq!(histories[0].records.len(), 1);
    }

    #[test]
    fn test_records_limited_to_own_patients() {
        let db = setup_db();
        booked(&db);
        let keeper = RecordKeeper::new(&db);

        assert!(matches!(
            keeper.add_record(&doctor(), "P1002", "Influenza", ""),
            Err(EngineError::NotFound(_))
        ));
        assert!(matches!(
            keeper.add_record(&other_doctor(), "P1001", "Influenza", ""),
            Err(EngineError::NotFound(_))
        ));
        assert!(matches!(
            keeper.add_record(&doctor(), "P1001", "  ", ""),
            Err(EngineError::Validation(_))
        ));
        assert!(keeper.patient_records(&other_doctor()).unwrap().is_empty());
    }
}
