//! Replenishment request database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{ReplenishmentRequest, ReplenishmentStatus};

const SELECT_REQUESTS: &str = r#"
    SELECT request_id, pharmacist_id, medicine_name, amount, requested_at, status
    FROM replenishment_requests
"#;

impl Database {
    /// Insert a new replenishment request.
    pub fn insert_replenishment_request(&self, request: &ReplenishmentRequest) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO replenishment_requests (
                request_id, pharmacist_id, medicine_name, amount, requested_at, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                request.request_id,
                request.pharmacist_id,
                request.medicine_name,
                request.amount,
                request.requested_at,
                request.status.as_str(),
            ],
        )?;
        Ok(())
    }

    /// Get a request by ID.
    pub fn get_replenishment_request(
        &self,
        request_id: &str,
    ) -> DbResult<Option<ReplenishmentRequest>> {
        let sql = format!("{SELECT_REQUESTS} WHERE request_id = ?");
        self.conn
            .query_row(&sql, [request_id], request_row)
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Flip a pending request to approved. Returns false if it was not pending.
    pub fn mark_replenishment_approved(&self, request_id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE replenishment_requests SET status = 'approved' WHERE request_id = ? AND status = 'pending'",
            [request_id],
        )?;
        Ok(rows_affected > 0)
    }

    /// List requests with a given status, oldest first.
    pub fn list_replenishment_requests_by_status(
        &self,
        status: ReplenishmentStatus,
    ) -> DbResult<Vec<ReplenishmentRequest>> {
        let sql = format!("{SELECT_REQUESTS} WHERE status = ? ORDER BY rowid");
        self.query_requests(&sql, [status.as_str()])
    }

    /// List every request, oldest first.
    pub fn list_replenishment_requests(&self) -> DbResult<Vec<ReplenishmentRequest>> {
        let sql = format!("{SELECT_REQUESTS} ORDER BY rowid");
        self.query_requests(&sql, [])
    }

    fn query_requests<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> DbResult<Vec<ReplenishmentRequest>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, request_row)?;

        let mut requests = Vec::new();
        for row in rows {
            requests.push(row?.try_into()?);
        }
        Ok(requests)
    }
}

/// Intermediate row struct for database mapping.
struct RequestRow {
    request_id: String,
    pharmacist_id: String,
    medicine_name: String,
    amount: i64,
    requested_at: String,
    status: String,
}

fn request_row(row: &Row<'_>) -> rusqlite::Result<RequestRow> {
    Ok(RequestRow {
        request_id: row.get(0)?,
        pharmacist_id: row.get(1)?,
        medicine_name: row.get(2)?,
        amount: row.get(3)?,
        requested_at: row.get(4)?,
        status: row.get(5)?,
    })
}

impl TryFrom<RequestRow> for ReplenishmentRequest {
    type Error = DbError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        let status = ReplenishmentStatus::parse(&row.status).ok_or_else(|| {
            DbError::Constraint(format!("Unknown replenishment status: {}", row.status))
        })?;

        Ok(ReplenishmentRequest {
            request_id: row.request_id,
            pharmacist_id: row.pharmacist_id,
            medicine_name: row.medicine_name,
            amount: row.amount,
            requested_at: row.requested_at,
            status,
        })
    }
}
