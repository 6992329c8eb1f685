//! Outcome and prescription database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{AppointmentOutcome, Prescription, PrescriptionStatus};

const SELECT_PRESCRIPTIONS: &str = r#"
    SELECT prescription_id, appointment_id, medication, quantity, status
    FROM prescriptions
"#;

impl Database {
    /// Insert a new outcome.
    pub fn insert_outcome(&self, outcome: &AppointmentOutcome) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO appointment_outcomes (
                appointment_id, recorded_at, services, notes, cost
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                outcome.appointment_id,
                outcome.recorded_at,
                outcome.services,
                outcome.notes,
                outcome.cost,
            ],
        )?;
        Ok(())
    }

    /// Get the outcome of an appointment.
    pub fn get_outcome(&self, appointment_id: &str) -> DbResult<Option<AppointmentOutcome>> {
        self.conn
            .query_row(
                r#"
                SELECT appointment_id, recorded_at, services, notes, cost
                FROM appointment_outcomes
                WHERE appointment_id = ?
                "#,
                [appointment_id],
                outcome_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Overwrite the accumulated cost of an outcome.
    pub fn update_outcome_cost(&self, appointment_id: &str, cost: f64) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE appointment_outcomes SET cost = ?2 WHERE appointment_id = ?1",
            params![appointment_id, cost],
        )?;
        Ok(rows_affected > 0)
    }

    /// List every outcome in recording order.
    pub fn list_outcomes(&self) -> DbResult<Vec<AppointmentOutcome>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT appointment_id, recorded_at, services, notes, cost
            FROM appointment_outcomes
            ORDER BY rowid
            "#,
        )?;
        let rows = stmt.query_map([], outcome_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Insert a new prescription.
    pub fn insert_prescription(&self, prescription: &Prescription) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO prescriptions (
                prescription_id, appointment_id, medication, quantity, status
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                prescription.prescription_id,
                prescription.appointment_id,
                prescription.medication,
                prescription.quantity,
                prescription.status.as_str(),
            ],
        )?;
        Ok(())
    }

    /// Get a prescription by ID.
    pub fn get_prescription(&self, prescription_id: &str) -> DbResult<Option<Prescription>> {
        let sql = format!("{SELECT_PRESCRIPTIONS} WHERE prescription_id = ?");
        self.conn
            .query_row(&sql, [prescription_id], prescription_row)
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Flip a pending prescription to dispensed.
    ///
    /// Returns false if it was not pending.
    pub fn mark_prescription_dispensed(&self, prescription_id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE prescriptions SET status = 'dispensed' WHERE prescription_id = ? AND status = 'pending'",
            [prescription_id],
        )?;
        Ok(rows_affected > 0)
    }

    /// List the prescriptions of one appointment.
    pub fn list_prescriptions_for_appointment(
        &self,
        appointment_id: &str,
    ) -> DbResult<Vec<Prescription>> {
        let sql = format!("{SELECT_PRESCRIPTIONS} WHERE appointment_id = ? ORDER BY rowid");
        self.query_prescriptions(&sql, [appointment_id])
    }

    /// List prescriptions with a given status.
    pub fn list_prescriptions_by_status(
        &self,
        status: PrescriptionStatus,
    ) -> DbResult<Vec<Prescription>> {
        let sql = format!("{SELECT_PRESCRIPTIONS} WHERE status = ? ORDER BY rowid");
        self.query_prescriptions(&sql, [status.as_str()])
    }

    /// List every prescription.
    pub fn list_prescriptions(&self) -> DbResult<Vec<Prescription>> {
        let sql = format!("{SELECT_PRESCRIPTIONS} ORDER BY rowid");
        self.query_prescriptions(&sql, [])
    }

    fn query_prescriptions<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> DbResult<Vec<Prescription>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, prescription_row)?;

        let mut prescriptions = Vec::new();
        for row in rows {
            prescriptions.push(row?.try_into()?);
        }
        Ok(prescriptions)
    }
}

fn outcome_row(row: &Row<'_>) -> rusqlite::Result<AppointmentOutcome> {
    Ok(AppointmentOutcome {
        appointment_id: row.get(0)?,
        recorded_at: row.get(1)?,
        services: row.get(2)?,
        notes: row.get(3)?,
        cost: row.get(4)?,
    })
}

/// Intermediate row struct for database mapping.
struct PrescriptionRow {
    prescription_id: String,
    appointment_id: String,
    medication: String,
    quantity: u32,
    status: String,
}

fn prescription_row(row: &Row<'_>) -> rusqlite::Result<PrescriptionRow> {
    Ok(PrescriptionRow {
        prescription_id: row.get(0)?,
        appointment_id: row.get(1)?,
        medication: row.get(2)?,
        quantity: row.get(3)?,
        status: row.get(4)?,
    })
}

impl TryFrom<PrescriptionRow> for Prescription {
    type Error = DbError;

    fn try_from(row: PrescriptionRow) -> Result<Self, Self::Error> {
        let status = PrescriptionStatus::parse(&row.status).ok_or_else(|| {
            DbError::Constraint(format!("Unknown prescription status: {}", row.status))
        })?;

        Ok(Prescription {
            prescription_id: row.prescription_id,
            appointment_id: row.appointment_id,
            medication: row.medication,
            quantity: row.quantity,
            status,
        })
    }
}
