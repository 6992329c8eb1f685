//! Medicine ledger database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::Medicine;

impl Database {
    /// Insert a new medicine. Fails if the name is taken.
    pub fn insert_medicine(&self, medicine: &Medicine) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO medicines (name, unit_cost, stock, alert_threshold)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                medicine.name,
                medicine.unit_cost,
                medicine.stock,
                medicine.alert_threshold,
            ],
        )?;
        Ok(())
    }

    /// Write back stock and threshold for an existing medicine.
    pub fn update_medicine(&self, medicine: &Medicine) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE medicines SET
                unit_cost = ?2,
                stock = ?3,
                alert_threshold = ?4
            WHERE name = ?1
            "#,
            params![
                medicine.name,
                medicine.unit_cost,
                medicine.stock,
                medicine.alert_threshold,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a medicine by exact name.
    pub fn get_medicine(&self, name: &str) -> DbResult<Option<Medicine>> {
        self.conn
            .query_row(
                r#"
                SELECT name, unit_cost, stock, alert_threshold
                FROM medicines
                WHERE name = ?
                "#,
                [name],
                medicine_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all medicines by name.
    pub fn list_medicines(&self) -> DbResult<Vec<Medicine>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT name, unit_cost, stock, alert_threshold
            FROM medicines
            ORDER BY name
            "#,
        )?;

        let rows = stmt.query_map([], medicine_row)?;
        let mut medicines = Vec::new();
        for row in rows {
            medicines.push(row?);
        }
        Ok(medicines)
    }

    /// All medicine names, for suggestions.
    pub fn medicine_names(&self) -> DbResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT name FROM medicines ORDER BY name")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<Vec<String>, _>>().map_err(Into::into)
    }
}

fn medicine_row(row: &Row<'_>) -> rusqlite::Result<Medicine> {
    Ok(Medicine {
        name: row.get(0)?,
        unit_cost: row.get(1)?,
        stock: row.get(2)?,
        alert_threshold: row.get(3)?,
    })
}
