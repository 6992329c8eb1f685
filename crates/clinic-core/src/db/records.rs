//! Medical record database operations.

use rusqlite::{params, Row};

use super::{Database, DbResult};
use crate::models::MedicalRecord;

impl Database {
    /// Append a medical record.
    pub fn insert_medical_record(&self, record: &MedicalRecord) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO medical_records (
                record_id, patient_id, author_id, diagnosis, treatment, recorded_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                record.record_id,
                record.patient_id,
                record.author_id,
                record.diagnosis,
                record.treatment,
                record.recorded_at,
            ],
        )?;
        Ok(())
    }

    /// A patient's history, oldest first.
    pub fn list_medical_records_for_patient(&self, patient_id: &str) -> DbResult<Vec<MedicalRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT record_id, patient_id, author_id, diagnosis, treatment, recorded_at
            FROM medical_records
            WHERE patient_id = ?
            ORDER BY rowid
            "#,
        )?;
        let rows = stmt.query_map([patient_id], record_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Every record, oldest first.
    pub fn list_medical_records(&self) -> DbResult<Vec<MedicalRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT record_id, patient_id, author_id, diagnosis, treatment, recorded_at
            FROM medical_records
            ORDER BY rowid
            "#,
        )?;
        let rows = stmt.query_map([], record_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn record_row(row: &Row<'_>) -> rusqlite::Result<MedicalRecord> {
    Ok(MedicalRecord {
        record_id: row.get(0)?,
        patient_id: row.get(1)?,
        author_id: row.get(2)?,
        diagnosis: row.get(3)?,
        treatment: row.get(4)?,
        recorded_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_are_per_patient() {
        let db = Database::open_in_memory().unwrap();
        db.insert_medical_record(&MedicalRecord::new(
            "P1001".into(),
            "D001".into(),
            "Flu".into(),
            "Rest".into(),
        ))
        .unwrap();
        db.insert_medical_record(&MedicalRecord::new(
            "P1002".into(),
            "D001".into(),
            "Sprain".into(),
            "Ice".into(),
        ))
        .unwrap();

        let records = db.list_medical_records_for_patient("P1001").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].diagnosis, "Flu");
        assert_eq!(db.list_medical_records().unwrap().len(), 2);
    }
}
