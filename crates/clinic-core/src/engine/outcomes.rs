//! Completing appointments and reading back their outcomes.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::db::Database;
use crate::models::slot_time::{parse_date, parse_time};
use crate::models::{
    Appointment, AppointmentOutcome, AppointmentStatus, OutcomeRecord, Prescription,
    PrescriptionOrder, Principal, RejectedOrder, Role, SlotKey,
};

use super::{closest_medicine, require_role, EngineError, EngineResult};

/// Result of recording an outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutcomeReceipt {
    pub appointment: Appointment,
    pub outcome: AppointmentOutcome,
    pub prescriptions: Vec<Prescription>,
    /// Orders dropped individually; the outcome was still recorded
    pub rejected: Vec<RejectedOrder>,
}

pub struct OutcomeRecorder<'a> {
    db: &'a Database,
}

impl<'a> OutcomeRecorder<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Complete the doctor's scheduled appointment at `date`/`time`.
    pub fn record_outcome(
        &self,
        doctor: &Principal,
        date: &str,
        time: &str,
        services: &str,
        notes: &str,
        orders: &[PrescriptionOrder],
    ) -> EngineResult<OutcomeReceipt> {
        require_role(doctor, &[Role::Doctor])?;
        let key = SlotKey::new(doctor.id.clone(), parse_date(date)?, parse_time(time)?);

        self.db.atomically(|db| {
            let appointment = db
                .find_appointment(&key, &[AppointmentStatus::Scheduled])?
                .ok_or_else(|| {
                    EngineError::NotFound(format!("No scheduled appointment at {}", key))
                })?;
            self.complete(appointment, services, notes, orders)
        })
    }

    /// Complete a scheduled appointment by ID.
    pub fn record_outcome_for(
        &self,
        doctor: &Principal,
        appointment_id: &str,
        services: &str,
        notes: &str,
        orders: &[PrescriptionOrder],
    ) -> EngineResult<OutcomeReceipt> {
        require_role(doctor, &[Role::Doctor])?;

        self.db.atomically(|db| {
            let appointment = db
                .get_appointment(appointment_id)?
                .ok_or_else(|| EngineError::NotFound(format!("Appointment {}", appointment_id)))?;
            if appointment.practitioner_id != doctor.id {
                return Err(EngineError::Forbidden(format!(
                    "Appointment {} belongs to another practitioner",
                    appointment_id
                )));
            }
            self.complete(appointment, services, notes, orders)
        })
    }

    /// Outcomes of the patient's completed appointments.
    pub fn my_outcomes(&self, patient: &Principal) -> EngineResult<Vec<OutcomeRecord>> {
        require_role(patient, &[Role::Patient])?;

        let completed = self
            .db
            .list_appointments_for_patient(&patient.id)?
            .into_iter()
            .filter(|a| a.status == AppointmentStatus::Completed);
        self.collect_records(completed)
    }

    /// Every completed appointment with its outcome.
    pub fn all_outcomes(&self, principal: &Principal) -> EngineResult<Vec<OutcomeRecord>> {
        require_role(principal, &[Role::Pharmacist, Role::Administrator])?;

        let completed = self
            .db
            .list_appointments_by_status(AppointmentStatus::Completed)?;
        self.collect_records(completed)
    }

    /// One completed appointment's outcome.
    ///
    /// Pharmacists and administrators see any outcome; a doctor sees their own
    /// appointments and a patient their own bookings.
    pub fn outcome_record(&self, caller: &Principal, appointment_id: &str) -> EngineResult<OutcomeRecord> {
        let appointment = self
            .db
            .get_appointment(appointment_id)?
            .ok_or_else(|| EngineError::NotFound(format!("Appointment {}", appointment_id)))?;
        let visible = match caller.role {
            Role::Pharmacist | Role::Administrator => true,
            Role::Doctor => appointment.practitioner_id == caller.id,
            Role::Patient => appointment.patient_id.as_deref() == Some(caller.id.as_str()),
        };
        if !visible {
            warn!(principal = %caller.id, appointment_id, "Outcome outside caller's scope");
            return Err(EngineError::Forbidden(format!(
                "{} {} may not view appointment {}",
                caller.role, caller.id, appointment_id
            )));
        }
        self.load_record(appointment)?
            .ok_or_else(|| EngineError::NotFound(format!("Outcome for {}", appointment_id)))
    }

    // Runs inside the caller's transaction.
    fn complete(
        &self,
        mut appointment: Appointment,
        services: &str,
        notes: &str,
        orders: &[PrescriptionOrder],
    ) -> EngineResult<OutcomeReceipt> {
        appointment.complete_slot()?;
        if !self.db.update_appointment(&appointment, AppointmentStatus::Scheduled)? {
            return Err(EngineError::InvalidState(format!(
                "Appointment {} is no longer SCHEDULED",
                appointment.appointment_id
            )));
        }

        let outcome = AppointmentOutcome::new(
            appointment.appointment_id.clone(),
            services.to_string(),
            notes.to_string(),
        );
        self.db.insert_outcome(&outcome).map_err(|e| {
            if e.is_constraint_violation() {
                EngineError::Conflict(format!(
                    "Outcome already recorded for {}",
                    appointment.appointment_id
                ))
            } else {
                e.into()
            }
        })?;

        let known = self.db.medicine_names()?;
        let mut prescriptions = Vec::new();
        let mut rejected = Vec::new();

        for order in orders {
            match validate_order(order, &known) {
                Ok(quantity) => {
                    let prescription = Prescription::new(
                        appointment.appointment_id.clone(),
                        order.medication.clone(),
                        quantity,
                    );
                    self.db.insert_prescription(&prescription)?;
                    debug!(
                        prescription_id = %prescription.prescription_id,
                        medicine = %prescription.medication,
                        quantity,
                        "Prescription issued"
                    );
                    prescriptions.push(prescription);
                }
                Err(reason) => {
                    warn!(medicine = %order.medication, quantity = order.quantity, %reason, "Prescription order rejected");
                    rejected.push(RejectedOrder {
                        order: order.clone(),
                        reason,
                    });
                }
            }
        }

        info!(
            appointment_id = %appointment.appointment_id,
            prescriptions = prescriptions.len(),
            rejected = rejected.len(),
            cost = outcome.cost,
            "Outcome recorded"
        );

        Ok(OutcomeReceipt {
            appointment,
            outcome,
            prescriptions,
            rejected,
        })
    }

    fn collect_records<I>(&self, appointments: I) -> EngineResult<Vec<OutcomeRecord>>
    where
        I: IntoIterator<Item = Appointment>,
    {
        let mut records = Vec::new();
        for appointment in appointments {
            if let Some(record) = self.load_record(appointment)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    fn load_record(&self, appointment: Appointment) -> EngineResult<Option<OutcomeRecord>> {
        let Some(outcome) = self.db.get_outcome(&appointment.appointment_id)? else {
            return Ok(None);
        };
        let prescriptions = self
            .db
            .list_prescriptions_for_appointment(&appointment.appointment_id)?;
        Ok(Some(OutcomeRecord {
            appointment,
            outcome,
            prescriptions,
        }))
    }
}

/// Check an order against the ledger, returning the quantity to prescribe.
fn validate_order(order: &PrescriptionOrder, known: &[String]) -> Result<u32, String> {
    if !known.iter().any(|name| name == &order.medication) {
        return Err(match closest_medicine(&order.medication, known) {
            Some(hint) => format!("Unknown medication '{}', did you mean '{}'?", order.medication, hint),
            None => format!("Unknown medication '{}'", order.medication),
        });
    }
    if order.quantity <= 0 {
        return Err(format!("Quantity must be positive, got {}", order.quantity));
    }
    u32::try_from(order.quantity).map_err(|_| format!("Quantity {} is too large", order.quantity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::*;
    use crate::engine::Scheduler;
    use crate::models::{PrescriptionStatus, APPOINTMENT_BASE_FEE};

    fn scheduled(db: &Database) -> Appointment {
        let scheduler = Scheduler::new(db);
        scheduler.create_slot(&doctor(), "25/12/24", "14:30").unwrap();
        let booked = scheduler.book(&patient(), "D001", "25/12/24", "14:30").unwrap();
        scheduler.approve_request(&doctor(), &booked.appointment_id).unwrap()
    }

    #[test]
    fn test_record_outcome() {
        let db = setup_db();
        let appointment = scheduled(&db);
        let recorder = OutcomeRecorder::new(&db);

        let receipt = recorder
            .record_outcome(
                &doctor(),
                "25/12/24",
                "14:30",
                "Consultation",
                "Rest and fluids",
                &[PrescriptionOrder::new("Paracetamol", 2)],
            )
            .unwrap();

        assert_eq!(receipt.appointment.status, AppointmentStatus::Completed);
        assert_eq!(receipt.outcome.cost, APPOINTMENT_BASE_FEE);
        assert_eq!(receipt.prescriptions.len(), 1);
        assert_eq!(receipt.prescriptions[0].status, PrescriptionStatus::Pending);
        assert!(receipt.rejected.is_empty());

        let stored = db.get_appointment(&appointment.appointment_id).unwrap().unwrap();
        assert_eq!(stored.status, AppointmentStatus::Completed);
        assert_eq!(stored.patient_id.as_deref(), Some("P1001"));
    }

    #[test]
    fn test_bad_orders_rejected_individually() {
        let db = setup_db();
        scheduled(&db);
        let recorder = OutcomeRecorder::new(&db);

        let receipt = recorder
            .record_outcome(
                &doctor(),
                "25/12/24",
                "14:30",
                "Consultation",
                "",
                &[
                    PrescriptionOrder::new("Paracetmol", 2),
                    PrescriptionOrder::new("Ibuprofen", 0),
                    PrescriptionOrder::new("Ibuprofen", 3),
                ],
            )
            .unwrap();

        assert_eq!(receipt.prescriptions.len(), 1);
        assert_eq!(receipt.prescriptions[0].medication, "Ibuprofen");
        assert_eq!(receipt.rejected.len(), 2);
        assert!(receipt.rejected[0].reason.contains("Paracetamol"));
        assert!(receipt.rejected[1].reason.contains("positive"));
    }

    #[test]
    fn test_record_outcome_requires_scheduled() {
        let db = setup_db();
        let scheduler = Scheduler::new(&db);
        scheduler.create_slot(&doctor(), "25/12/24", "14:30").unwrap();
        scheduler.book(&patient(), "D001", "25/12/24", "14:30").unwrap();
        let recorder = OutcomeRecorder::new(&db);

        // Still pending
        assert!(matches!(
            recorder.record_outcome(&doctor(), "25/12/24", "14:30", "x", "y", &[]),
            Err(EngineError::NotFound(_))
        ));
        assert!(db.list_outcomes().unwrap().is_empty());
    }

    #[test]
    fn test_record_outcome_for_is_single_shot() {
        let db = setup_db();
        let appointment = scheduled(&db);
        let recorder = OutcomeRecorder::new(&db);

        recorder
            .record_outcome_for(&doctor(), &appointment.appointment_id, "x", "y", &[])
            .unwrap();
        let err = recorder
            .record_outcome_for(&doctor(), &appointment.appointment_id, "x", "y", &[])
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidState(_)));
        assert_eq!(db.list_outcomes().unwrap().len(), 1);

        assert!(matches!(
            recorder.record_outcome_for(&other_doctor(), &appointment.appointment_id, "x", "y", &[]),
            Err(EngineError::Forbidden(_))
        ));
    }

    #[test]
    fn test_outcome_views() {
        let db = setup_db();
        let appointment = scheduled(&db);
        let recorder = OutcomeRecorder::new(&db);
        recorder
            .record_outcome(
                &doctor(),
                "25/12/24",
                "14:30",
                "Consultation",
                "",
                &[PrescriptionOrder::new("Paracetamol", 2)],
            )
            .unwrap();

        let mine = recorder.my_outcomes(&patient()).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].prescriptions.len(), 1);
        assert!(recorder.my_outcomes(&other_patient()).unwrap().is_empty());

        assert_eq!(recorder.all_outcomes(&pharmacist()).unwrap().len(), 1);
        assert!(matches!(
            recorder.all_outcomes(&patient()),
            Err(EngineError::Forbidden(_))
        ));

        let id = &appointment.appointment_id;
        let record = recorder.outcome_record(&patient(), id).unwrap();
        assert_eq!(record.outcome.services, "Consultation");
        assert!(recorder.outcome_record(&doctor(), id).is_ok());
        assert!(recorder.outcome_record(&pharmacist(), id).is_ok());
        assert!(recorder.outcome_record(&admin(), id).is_ok());
        assert!(matches!(
            recorder.outcome_record(&other_patient(), id),
            Err(EngineError::Forbidden(_))
        ));
        assert!(matches!(
            recorder.outcome_record(&other_doctor(), id),
            Err(EngineError::Forbidden(_))
        ));
    }
}
