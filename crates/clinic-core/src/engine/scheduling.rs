//! Slot creation, booking and the practitioner's approval queue.

use tracing::{debug, info, warn};

use crate::db::Database;
use crate::models::slot_time::{parse_date, parse_slot_time, parse_time};
use crate::models::{Appointment, AppointmentStatus, Principal, Role, SlotKey};

use super::{require_role, EngineError, EngineResult};

/// Appointment state machine driver.
pub struct Scheduler<'a> {
    db: &'a Database,
}

impl<'a> Scheduler<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    // =========================================================================
    // Doctor operations
    // =========================================================================

    /// Open a new slot on the doctor's calendar.
    ///
    /// `date` is `dd/MM/yy`, `time` is `HH:mm` on a 30-minute boundary.
    pub fn create_slot(&self, doctor: &Principal, date: &str, time: &str) -> EngineResult<Appointment> {
        require_role(doctor, &[Role::Doctor])?;
        let key = SlotKey::new(doctor.id.clone(), parse_date(date)?, parse_slot_time(time)?);

        self.db.atomically(|db| {
            if db.slot_occupied(&key)? {
                warn!(slot = %key, "Slot already exists");
                return Err(EngineError::Conflict(format!(
                    "An appointment slot already exists at {}",
                    key
                )));
            }

            let slot = Appointment::create_slot(doctor.id.clone(), doctor.name.clone(), key.date, key.time);
            db.insert_appointment(&slot).map_err(|e| {
                if e.is_constraint_violation() {
                    EngineError::Conflict(format!("An appointment slot already exists at {}", key))
                } else {
                    e.into()
                }
            })?;

            info!(appointment_id = %slot.appointment_id, slot = %key, "Slot created");
            Ok(slot)
        })
    }

    /// Withdraw one of the doctor's unbooked slots.
    pub fn cancel_slot(&self, doctor: &Principal, date: &str, time: &str) -> EngineResult<Appointment> {
        require_role(doctor, &[Role::Doctor])?;
        let key = SlotKey::new(doctor.id.clone(), parse_date(date)?, parse_time(time)?);

        self.db.atomically(|db| {
            let mut slot = db
                .find_appointment(&key, &[AppointmentStatus::Open])?
                .ok_or_else(|| {
                    EngineError::NotFound(format!("No open appointment slot at {}", key))
                })?;

            slot.cancel_slot()?;
            self.commit(&slot, AppointmentStatus::Open)?;

            info!(appointment_id = %slot.appointment_id, slot = %key, "Slot cancelled");
            Ok(slot)
        })
    }

    /// The doctor's booking requests awaiting a decision.
    pub fn pending_requests(&self, doctor: &Principal) -> EngineResult<Vec<Appointment>> {
        require_role(doctor, &[Role::Doctor])?;
        Ok(self
            .db
            .list_appointments_for_practitioner(&doctor.id)?
            .into_iter()
            .filter(|a| a.status == AppointmentStatus::Pending)
            .collect())
    }

    /// Accept a booking request.
    pub fn approve_request(&self, doctor: &Principal, appointment_id: &str) -> EngineResult<Appointment> {
        require_role(doctor, &[Role::Doctor])?;

        self.db.atomically(|_| {
            let mut appointment = self.owned_appointment(doctor, appointment_id)?;
            appointment.approve()?;
            self.commit(&appointment, AppointmentStatus::Pending)?;

            info!(
                appointment_id,
                patient = appointment.patient_id.as_deref().unwrap_or_default(),
                "Booking approved"
            );
            Ok(appointment)
        })
    }

    /// Refuse a booking request; the slot reopens for others.
    pub fn decline_request(&self, doctor: &Principal, appointment_id: &str) -> EngineResult<Appointment> {
        require_role(doctor, &[Role::Doctor])?;

        self.db.atomically(|_| {
            let mut appointment = self.owned_appointment(doctor, appointment_id)?;
            let patient = appointment.patient_id.clone().unwrap_or_default();
            appointment.decline()?;
            self.commit(&appointment, AppointmentStatus::Pending)?;

            info!(appointment_id, patient = %patient, "Booking declined, slot reopened");
            Ok(appointment)
        })
    }

    /// Every slot of the doctor's that has not been completed.
    pub fn personal_schedule(&self, doctor: &Principal) -> EngineResult<Vec<Appointment>> {
        require_role(doctor, &[Role::Doctor])?;
        Ok(self
            .db
            .list_appointments_for_practitioner(&doctor.id)?
            .into_iter()
            .filter(|a| a.status != AppointmentStatus::Completed)
            .collect())
    }

    /// The doctor's confirmed appointments.
    pub fn upcoming_appointments(&self, doctor: &Principal) -> EngineResult<Vec<Appointment>> {
        require_role(doctor, &[Role::Doctor])?;
        Ok(self
            .db
            .list_appointments_for_practitioner(&doctor.id)?
            .into_iter()
            .filter(|a| a.status == AppointmentStatus::Scheduled)
            .collect())
    }

    // =========================================================================
    // Patient operations
    // =========================================================================

    /// Every bookable slot.
    pub fn open_slots(&self) -> EngineResult<Vec<Appointment>> {
        Ok(self.db.list_appointments_by_status(AppointmentStatus::Open)?)
    }

    /// Request a doctor's open slot.
    pub fn book(&self, patient: &Principal, doctor_id: &str, date: &str, time: &str) -> EngineResult<Appointment> {
        require_role(patient, &[Role::Patient])?;
        let key = SlotKey::new(doctor_id, parse_date(date)?, parse_time(time)?);

        self.db.atomically(|_| self.book_slot(patient, &key))
    }

    /// Give up a pending or confirmed booking; the slot reopens.
    pub fn cancel_booking(
        &self,
        patient: &Principal,
        doctor_id: &str,
        date: &str,
        time: &str,
    ) -> EngineResult<Appointment> {
        require_role(patient, &[Role::Patient])?;
        let key = SlotKey::new(doctor_id, parse_date(date)?, parse_time(time)?);

        self.db.atomically(|_| self.release_booking(patient, &key))
    }

    /// Move a booking to another slot.
    ///
    /// Both steps share one transaction: if the new slot cannot be booked the
    /// original booking is left untouched. Returns the newly requested slot.
    pub fn reschedule(
        &self,
        patient: &Principal,
        from: (&str, &str, &str),
        to: (&str, &str, &str),
    ) -> EngineResult<Appointment> {
        require_role(patient, &[Role::Patient])?;
        let from_key = SlotKey::new(from.0, parse_date(from.1)?, parse_time(from.2)?);
        let to_key = SlotKey::new(to.0, parse_date(to.1)?, parse_time(to.2)?);

        self.db.atomically(|_| {
            self.release_booking(patient, &from_key)?;
            let booked = self.book_slot(patient, &to_key)?;
            info!(patient = %patient.id, from = %from_key, to = %to_key, "Booking rescheduled");
            Ok(booked)
        })
    }

    /// The patient's pending and confirmed appointments.
    pub fn my_appointments(&self, patient: &Principal) -> EngineResult<Vec<Appointment>> {
        require_role(patient, &[Role::Patient])?;
        Ok(self
            .db
            .list_appointments_for_patient(&patient.id)?
            .into_iter()
            .filter(|a| {
                matches!(
                    a.status,
                    AppointmentStatus::Pending | AppointmentStatus::Scheduled
                )
            })
            .collect())
    }

    // =========================================================================
    // Administrator operations
    // =========================================================================

    /// Every appointment in store order.
    pub fn all_appointments(&self, admin: &Principal) -> EngineResult<Vec<Appointment>> {
        require_role(admin, &[Role::Administrator])?;
        Ok(self.db.list_appointments()?)
    }

    // =========================================================================
    // Helpers (run inside the caller's transaction)
    // =========================================================================

    fn book_slot(&self, patient: &Principal, key: &SlotKey) -> EngineResult<Appointment> {
        let mut slot = match self.db.find_appointment(key, &[AppointmentStatus::Open])? {
            Some(slot) => slot,
            None => return Err(self.unbookable(key)?),
        };

        slot.request_booking(&patient.id)?;
        self.commit(&slot, AppointmentStatus::Open)?;

        info!(appointment_id = %slot.appointment_id, patient = %patient.id, slot = %key, "Booking requested");
        Ok(slot)
    }

    fn release_booking(&self, patient: &Principal, key: &SlotKey) -> EngineResult<Appointment> {
        let booked = self
            .db
            .find_appointment(key, &[AppointmentStatus::Pending, AppointmentStatus::Scheduled])?
            .filter(|a| a.patient_id.as_deref() == Some(patient.id.as_str()));

        let mut appointment = booked.ok_or_else(|| {
            EngineError::NotFound(format!("No booking for {} at {}", patient.id, key))
        })?;

        let previous = appointment.status;
        appointment.reset_slot()?;
        self.commit(&appointment, previous)?;

        info!(appointment_id = %appointment.appointment_id, patient = %patient.id, "Booking cancelled, slot reopened");
        Ok(appointment)
    }

    /// Explain why no open slot matched `key`.
    fn unbookable(&self, key: &SlotKey) -> EngineResult<EngineError> {
        let live = [
            AppointmentStatus::Pending,
            AppointmentStatus::Scheduled,
            AppointmentStatus::Completed,
        ];
        Ok(match self.db.find_appointment(key, &live)? {
            Some(taken) => {
                debug!(appointment_id = %taken.appointment_id, status = %taken.status, "Slot not bookable");
                EngineError::InvalidState(format!(
                    "Appointment slot at {} is {} and cannot be booked",
                    key, taken.status
                ))
            }
            None => EngineError::NotFound(format!("No appointment slot found at {}", key)),
        })
    }

    /// An appointment on this doctor's calendar.
    fn owned_appointment(&self, doctor: &Principal, appointment_id: &str) -> EngineResult<Appointment> {
        let appointment = self
            .db
            .get_appointment(appointment_id)?
            .ok_or_else(|| EngineError::NotFound(format!("Appointment {}", appointment_id)))?;

        if appointment.practitioner_id != doctor.id {
            return Err(EngineError::Forbidden(format!(
                "Appointment {} belongs to another practitioner",
                appointment_id
            )));
        }
        Ok(appointment)
    }

    /// Write a transition, failing if the stored status moved underneath us.
    fn commit(&self, appointment: &Appointment, expected: AppointmentStatus) -> EngineResult<()> {
        if !self.db.update_appointment(appointment, expected)? {
            return Err(EngineError::InvalidState(format!(
                "Appointment {} is no longer {}",
                appointment.appointment_id, expected
            )));
        }
        Ok(())
    }
}
