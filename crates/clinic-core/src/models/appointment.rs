//! Appointment slots and their lifecycle.
//!
//! ```text
//!            request_booking        approve            complete
//!   OPEN ─────────────────► PENDING ───────► SCHEDULED ───────► COMPLETED
//!    │  ▲                      │                 │
//!    │  └────── decline ───────┘                 │
//!    │  ▲                                        │
//!    │  └──────────── release (patient cancel) ──┘
//!    │
//!    └── cancel ──► CANCELLED
//! ```
//!
//! Every legal move lives in [`AppointmentStatus::next`]; the mutators on
//! [`Appointment`] only consult that table.

use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::slot_time::{self, date_format, time_format};

/// Appointment status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    /// Bookable slot, no patient
    Open,
    /// Patient requested the slot, awaiting the practitioner
    Pending,
    /// Practitioner approved the request
    Scheduled,
    /// Outcome recorded (terminal)
    Completed,
    /// Unbooked slot withdrawn by the practitioner (terminal)
    Cancelled,
}

/// Events that drive the appointment state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotEvent {
    RequestBooking,
    Approve,
    Decline,
    Release,
    Cancel,
    Complete,
}

impl AppointmentStatus {
    /// Transition table: `None` means the event is illegal from this state.
    pub fn next(self, event: SlotEvent) -> Option<AppointmentStatus> {
        use AppointmentStatus::*;
        use SlotEvent::*;

        match (self, event) {
            (Open, RequestBooking) => Some(Pending),
            (Open, Cancel) => Some(Cancelled),
            (Pending, Approve) => Some(Scheduled),
            (Pending, Decline) => Some(Open),
            (Pending, Release) | (Scheduled, Release) => Some(Open),
            (Scheduled, Complete) => Some(Completed),
            _ => None,
        }
    }

    /// Whether a patient must be attached in this state.
    pub fn holds_patient(self) -> bool {
        matches!(
            self,
            AppointmentStatus::Pending | AppointmentStatus::Scheduled | AppointmentStatus::Completed
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Open => "open",
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(AppointmentStatus::Open),
            "pending" => Some(AppointmentStatus::Pending),
            "scheduled" => Some(AppointmentStatus::Scheduled),
            "completed" => Some(AppointmentStatus::Completed),
            "cancelled" => Some(AppointmentStatus::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

/// Rejected state machine move.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Cannot {event:?} appointment {appointment_id} while {from}")]
pub struct InvalidTransition {
    pub appointment_id: String,
    pub from: AppointmentStatus,
    pub event: SlotEvent,
}

/// Identifies a slot on a practitioner's calendar.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub practitioner_id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl SlotKey {
    pub fn new(practitioner_id: impl Into<String>, date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            practitioner_id: practitioner_id.into(),
            date,
            time,
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.practitioner_id,
            slot_time::format_date(&self.date),
            slot_time::format_time(&self.time)
        )
    }
}

/// A bookable slot offered by a practitioner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    /// Unique appointment ID (UUID)
    pub appointment_id: String,
    /// Practitioner (doctor) ID
    pub practitioner_id: String,
    /// Practitioner display name
    pub practitioner_name: String,
    /// Slot date
    #[serde(with = "date_format")]
    pub date: NaiveDate,
    /// Slot start time
    #[serde(with = "time_format")]
    pub time: NaiveTime,
    /// Booked patient; absent while OPEN or CANCELLED
    pub patient_id: Option<String>,
    /// Current status
    pub status: AppointmentStatus,
}

impl Appointment {
    /// Create a new OPEN slot.
    ///
    /// Key uniqueness is the caller's concern.
    pub fn create_slot(
        practitioner_id: String,
        practitioner_name: String,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Self {
        Self {
            appointment_id: uuid::Uuid::new_v4().to_string(),
            practitioner_id,
            practitioner_name,
            date,
            time,
            patient_id: None,
            status: AppointmentStatus::Open,
        }
    }

    /// OPEN → PENDING, attaching the patient.
    pub fn request_booking(&mut self, patient_id: &str) -> Result<(), InvalidTransition> {
        self.transition(SlotEvent::RequestBooking)?;
        self.patient_id = Some(patient_id.to_string());
        Ok(())
    }

    /// PENDING → SCHEDULED.
    pub fn approve(&mut self) -> Result<(), InvalidTransition> {
        self.transition(SlotEvent::Approve)
    }

    /// PENDING → OPEN, detaching the patient.
    pub fn decline(&mut self) -> Result<(), InvalidTransition> {
        self.transition(SlotEvent::Decline)?;
        self.patient_id = None;
        Ok(())
    }

    /// PENDING/SCHEDULED → OPEN so the slot can be booked again.
    pub fn reset_slot(&mut self) -> Result<(), InvalidTransition> {
        self.transition(SlotEvent::Release)?;
        self.patient_id = None;
        Ok(())
    }

    /// OPEN → CANCELLED.
    pub fn cancel_slot(&mut self) -> Result<(), InvalidTransition> {
        self.transition(SlotEvent::Cancel)
    }

    /// SCHEDULED → COMPLETED. Must be paired with exactly one outcome.
    pub fn complete_slot(&mut self) -> Result<(), InvalidTransition> {
        self.transition(SlotEvent::Complete)
    }

    /// Check the patient/status invariant.
    pub fn is_consistent(&self) -> bool {
        self.patient_id.is_some() == self.status.holds_patient()
    }

    fn transition(&mut self, event: SlotEvent) -> Result<(), InvalidTransition> {
        match self.status.next(event) {
            Some(next) => {
                self.status = next;
                Ok(())
            }
            None => Err(InvalidTransition {
                appointment_id: self.appointment_id.clone(),
                from: self.status,
                event,
            }),
        }
    }
}
