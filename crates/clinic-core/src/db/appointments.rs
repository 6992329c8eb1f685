//! Appointment database operations.

use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{Appointment, AppointmentStatus, SlotKey};

/// Storage format for slot dates (sorts chronologically).
const DB_DATE_FORMAT: &str = "%Y-%m-%d";
/// Storage format for slot times.
const DB_TIME_FORMAT: &str = "%H:%M";

const SELECT_APPOINTMENTS: &str = r#"
    SELECT appointment_id, practitioner_id, practitioner_name,
           slot_date, slot_time, patient_id, status
    FROM appointments
"#;

impl Database {
    /// Insert a new appointment.
    pub fn insert_appointment(&self, appointment: &Appointment) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO appointments (
                appointment_id, practitioner_id, practitioner_name,
                slot_date, slot_time, patient_id, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                appointment.appointment_id,
                appointment.practitioner_id,
                appointment.practitioner_name,
                db_date(&appointment.date),
                db_time(&appointment.time),
                appointment.patient_id,
                appointment.status.as_str(),
            ],
        )?;
        Ok(())
    }

    /// Persist a transition, guarded on the status the caller read.
    ///
    /// Returns false when the stored status no longer equals `expected`.
    pub fn update_appointment(
        &self,
        appointment: &Appointment,
        expected: AppointmentStatus,
    ) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE appointments SET
                patient_id = ?2,
                status = ?3
            WHERE appointment_id = ?1 AND status = ?4
            "#,
            params![
                appointment.appointment_id,
                appointment.patient_id,
                appointment.status.as_str(),
                expected.as_str(),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get an appointment by ID.
    pub fn get_appointment(&self, appointment_id: &str) -> DbResult<Option<Appointment>> {
        let sql = format!("{SELECT_APPOINTMENTS} WHERE appointment_id = ?");
        self.conn
            .query_row(&sql, [appointment_id], appointment_row)
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// First appointment at `key` whose status is in `statuses`, in insertion order.
    pub fn find_appointment(
        &self,
        key: &SlotKey,
        statuses: &[AppointmentStatus],
    ) -> DbResult<Option<Appointment>> {
        let sql = format!(
            "{SELECT_APPOINTMENTS} WHERE practitioner_id = ?1 AND slot_date = ?2 AND slot_time = ?3 ORDER BY rowid"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![key.practitioner_id, db_date(&key.date), db_time(&key.time)],
            appointment_row,
        )?;

        for row in rows {
            let appointment: Appointment = row?.try_into()?;
            if statuses.contains(&appointment.status) {
                return Ok(Some(appointment));
            }
        }
        Ok(None)
    }

    /// Whether a non-cancelled appointment already occupies `key`.
    pub fn slot_occupied(&self, key: &SlotKey) -> DbResult<bool> {
        let count: i64 = self.conn.query_row(
            r#"
            SELECT COUNT(*) FROM appointments
            WHERE practitioner_id = ?1 AND slot_date = ?2 AND slot_time = ?3
              AND status <> 'cancelled'
            "#,
            params![key.practitioner_id, db_date(&key.date), db_time(&key.time)],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// List every appointment in insertion order.
    pub fn list_appointments(&self) -> DbResult<Vec<Appointment>> {
        let sql = format!("{SELECT_APPOINTMENTS} ORDER BY rowid");
        self.query_appointments(&sql, [])
    }

    /// List appointments with a given status.
    pub fn list_appointments_by_status(
        &self,
        status: AppointmentStatus,
    ) -> DbResult<Vec<Appointment>> {
        let sql = format!("{SELECT_APPOINTMENTS} WHERE status = ? ORDER BY rowid");
        self.query_appointments(&sql, [status.as_str()])
    }

    /// List a practitioner's appointments.
    pub fn list_appointments_for_practitioner(
        &self,
        practitioner_id: &str,
    ) -> DbResult<Vec<Appointment>> {
        let sql = format!("{SELECT_APPOINTMENTS} WHERE practitioner_id = ? ORDER BY rowid");
        self.query_appointments(&sql, [practitioner_id])
    }

    /// List a patient's appointments.
    pub fn list_appointments_for_patient(&self, patient_id: &str) -> DbResult<Vec<Appointment>> {
        let sql = format!("{SELECT_APPOINTMENTS} WHERE patient_id = ? ORDER BY rowid");
        self.query_appointments(&sql, [patient_id])
    }

    fn query_appointments<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, appointment_row)?;

        let mut appointments = Vec::new();
        for row in rows {
            appointments.push(row?.try_into()?);
        }
        Ok(appointments)
    }
}

/// Intermediate row struct for database mapping.
struct AppointmentRow {
    appointment_id: String,
    practitioner_id: String,
    practitioner_name: String,
    slot_date: String,
    slot_time: String,
    patient_id: Option<String>,
    status: String,
}

fn appointment_row(row: &Row<'_>) -> rusqlite::Result<AppointmentRow> {
    Ok(AppointmentRow {
        appointment_id: row.get(0)?,
        practitioner_id: row.get(1)?,
        practitioner_name: row.get(2)?,
        slot_date: row.get(3)?,
        slot_time: row.get(4)?,
        patient_id: row.get(5)?,
        status: row.get(6)?,
    })
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = DbError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        let date = NaiveDate::parse_from_str(&row.slot_date, DB_DATE_FORMAT)
            .map_err(|_| DbError::Constraint(format!("Bad slot date: {}", row.slot_date)))?;
        let time = NaiveTime::parse_from_str(&row.slot_time, DB_TIME_FORMAT)
            .map_err(|_| DbError::Constraint(format!("Bad slot time: {}", row.slot_time)))?;
        let status = AppointmentStatus::parse(&row.status).ok_or_else(|| {
            DbError::Constraint(format!("Unknown appointment status: {}", row.status))
        })?;

        Ok(Appointment {
            appointment_id: row.appointment_id,
            practitioner_id: row.practitioner_id,
            practitioner_name: row.practitioner_name,
            date,
            time,
            patient_id: row.patient_id,
            status,
        })
    }
}

fn db_date(date: &NaiveDate) -> String {
    date.format(DB_DATE_FORMAT).to_string()
}

fn db_time(time: &NaiveTime) -> String {
    time.format(DB_TIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 25).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn slot(doctor: &str, h: u32, m: u32) -> Appointment {
        Appointment::create_slot(doctor.into(), format!("Dr. {}", doctor), date(), time(h, m))
    }

    #[test]
    fn test_insert_and_get_appointment() {
        let db = Database::open_in_memory().unwrap();
        let appt = slot("D001", 14, 30);
        db.insert_appointment(&appt).unwrap();

        let retrieved = db.get_appointment(&appt.appointment_id).unwrap().unwrap();
        assert_eq!(retrieved, appt);
        assert!(db.get_appointment("missing").unwrap().is_none());
    }

    #[test]
    fn test_update_is_guarded_by_expected_status() {
        let db = Database::open_in_memory().unwrap();
        let mut appt = slot("D001", 14, 30);
        db.insert_appointment(&appt).unwrap();

        appt.request_booking("P1001").unwrap();
        assert!(db.update_appointment(&appt, AppointmentStatus::Open).unwrap());

        // Stale expectation loses
        assert!(!db.update_appointment(&appt, AppointmentStatus::Open).unwrap());

        let stored = db.get_appointment(&appt.appointment_id).unwrap().unwrap();
        assert_eq!(stored.status, AppointmentStatus::Pending);
        assert_eq!(stored.patient_id.as_deref(), Some("P1001"));
    }

    #[test]
    fn test_find_appointment_first_match_wins() {
        let db = Database::open_in_memory().unwrap();
        let mut first = slot("D001", 9, 0);
        first.cancel_slot().unwrap();
        db.insert_appointment(&first).unwrap();
        let second = slot("D001", 9, 0);
        db.insert_appointment(&second).unwrap();

        let key = SlotKey::new("D001", date(), time(9, 0));
        let any = db
            .find_appointment(&key, &[AppointmentStatus::Open, AppointmentStatus::Cancelled])
            .unwrap()
            .unwrap();
        assert_eq!(any.appointment_id, first.appointment_id);

        let open = db
            .find_appointment(&key, &[AppointmentStatus::Open])
            .unwrap()
            .unwrap();
        assert_eq!(open.appointment_id, second.appointment_id);

        assert!(db
            .find_appointment(&key, &[AppointmentStatus::Scheduled])
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_slot_occupied_ignores_cancelled() {
        let db = Database::open_in_memory().unwrap();
        let key = SlotKey::new("D001", date(), time(10, 0));
        assert!(!db.slot_occupied(&key).unwrap());

        let mut appt = slot("D001", 10, 0);
        appt.cancel_slot().unwrap();
        db.insert_appointment(&appt).unwrap();
        assert!(!db.slot_occupied(&key).unwrap());

        db.insert_appointment(&slot("D001", 10, 0)).unwrap();
        assert!(db.slot_occupied(&key).unwrap());
    }

    #[test]
    fn test_list_filters() {
        let db = Database::open_in_memory().unwrap();
        let mut booked = slot("D001", 9, 0);
        booked.request_booking("P1001").unwrap();
        db.insert_appointment(&booked).unwrap();
        db.insert_appointment(&slot("D001", 9, 30)).unwrap();
        db.insert_appointment(&slot("D002", 9, 0)).unwrap();

        assert_eq!(db.list_appointments().unwrap().len(), 3);
        assert_eq!(db.list_appointments_for_practitioner("D001").unwrap().len(), 2);
        assert_eq!(db.list_appointments_for_patient("P1001").unwrap().len(), 1);
        assert_eq!(
            db.list_appointments_by_status(AppointmentStatus::Open)
                .unwrap()
                .len(),
            2
        );
    }
}
