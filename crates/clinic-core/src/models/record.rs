//! Medical history entries.

use serde::{Deserialize, Serialize};

/// One diagnosis/treatment entry in a patient's history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicalRecord {
    pub record_id: String,
    pub patient_id: String,
    /// Doctor who wrote the entry
    pub author_id: String,
    pub diagnosis: String,
    pub treatment: String,
    pub recorded_at: String,
}

impl MedicalRecord {
    pub fn new(patient_id: String, author_id: String, diagnosis: String, treatment: String) -> Self {
        Self {
            record_id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            author_id,
            diagnosis,
            treatment,
            recorded_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
