//! SQLite schema definition.

/// Complete database schema for the clinic engine.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Appointments (slots and their lifecycle)
-- ============================================================================

CREATE TABLE IF NOT EXISTS appointments (
    appointment_id TEXT PRIMARY KEY,
    practitioner_id TEXT NOT NULL,
    practitioner_name TEXT NOT NULL,
    slot_date TEXT NOT NULL,                     -- YYYY-MM-DD
    slot_time TEXT NOT NULL,                     -- HH:MM
    patient_id TEXT,                             -- NULL while open or cancelled
    status TEXT NOT NULL DEFAULT 'open'
        CHECK (status IN ('open', 'pending', 'scheduled', 'completed', 'cancelled')),
    CHECK ((patient_id IS NULL) = (status IN ('open', 'cancelled')))
);

-- At most one live slot per practitioner/date/time
CREATE UNIQUE INDEX IF NOT EXISTS idx_appointments_live_slot
    ON appointments(practitioner_id, slot_date, slot_time)
    WHERE status <> 'cancelled';

CREATE INDEX IF NOT EXISTS idx_appointments_practitioner ON appointments(practitioner_id);
CREATE INDEX IF NOT EXISTS idx_appointments_patient ON appointments(patient_id);
CREATE INDEX IF NOT EXISTS idx_appointments_status ON appointments(status);

-- ============================================================================
-- Outcomes (1:1 with completed appointments)
-- ============================================================================

CREATE TABLE IF NOT EXISTS appointment_outcomes (
    appointment_id TEXT PRIMARY KEY REFERENCES appointments(appointment_id),
    recorded_at TEXT NOT NULL,
    services TEXT NOT NULL DEFAULT '',
    notes TEXT NOT NULL DEFAULT '',
    cost REAL NOT NULL
);

-- ============================================================================
-- Medicines (ledger keyed by name)
-- ============================================================================

CREATE TABLE IF NOT EXISTS medicines (
    name TEXT PRIMARY KEY,
    unit_cost REAL NOT NULL,
    stock INTEGER NOT NULL,                      -- may go negative
    alert_threshold INTEGER NOT NULL
);

-- ============================================================================
-- Prescriptions
-- ============================================================================

CREATE TABLE IF NOT EXISTS prescriptions (
    prescription_id TEXT PRIMARY KEY,
    appointment_id TEXT NOT NULL REFERENCES appointment_outcomes(appointment_id),
    medication TEXT NOT NULL REFERENCES medicines(name),
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'dispensed'))
);

CREATE INDEX IF NOT EXISTS idx_prescriptions_appointment ON prescriptions(appointment_id);
CREATE INDEX IF NOT EXISTS idx_prescriptions_status ON prescriptions(status);

-- ============================================================================
-- Replenishment Requests
-- ============================================================================

CREATE TABLE IF NOT EXISTS replenishment_requests (
    request_id TEXT PRIMARY KEY,
    pharmacist_id TEXT NOT NULL,
    medicine_name TEXT NOT NULL REFERENCES medicines(name),
    amount INTEGER NOT NULL,
    requested_at TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'approved'))
);

CREATE INDEX IF NOT EXISTS idx_replenishment_status ON replenishment_requests(status);

-- ============================================================================
-- Medical Records
-- ============================================================================

CREATE TABLE IF NOT EXISTS medical_records (
    record_id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL,
    author_id TEXT NOT NULL,
    diagnosis TEXT NOT NULL,
    treatment TEXT NOT NULL,
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_records_patient ON medical_records(patient_id);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_live_slot_uniqueness() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let insert = "INSERT INTO appointments (appointment_id, practitioner_id, practitioner_name, slot_date, slot_time, status) VALUES (?, 'D001', 'Dr. Tan', '2024-12-25', '14:30', ?)";

        conn.execute(insert, ["a1", "cancelled"]).unwrap();
        // Cancelled slots do not occupy the key
        conn.execute(insert, ["a2", "open"]).unwrap();
        // A second live slot does
        assert!(conn.execute(insert, ["a3", "open"]).is_err());
    }

    #[test]
    fn test_patient_presence_check() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        // Pending without a patient should fail
        let result = conn.execute(
            "INSERT INTO appointments (appointment_id, practitioner_id, practitioner_name, slot_date, slot_time, status) VALUES ('a1', 'D001', 'Dr. Tan', '2024-12-25', '14:30', 'pending')",
            [],
        );
        assert!(result.is_err());

        // Open with a patient should fail
        let result = conn.execute(
            "INSERT INTO appointments (appointment_id, practitioner_id, practitioner_name, slot_date, slot_time, patient_id, status) VALUES ('a1', 'D001', 'Dr. Tan', '2024-12-25', '14:30', 'P1', 'open')",
            [],
        );
        assert!(result.is_err());
    }
}
