//! Replenishment request models.

use serde::{Deserialize, Serialize};

/// Replenishment request status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReplenishmentStatus {
    Pending,
    Approved,
}

impl ReplenishmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReplenishmentStatus::Pending => "pending",
            ReplenishmentStatus::Approved => "approved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ReplenishmentStatus::Pending),
            "approved" => Some(ReplenishmentStatus::Approved),
            _ => None,
        }
    }
}

/// A pharmacist's request to restock a low medicine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReplenishmentRequest {
    /// Unique request ID (UUID)
    pub request_id: String,
    /// Requesting pharmacist
    pub pharmacist_id: String,
    /// Medicine to restock
    pub medicine_name: String,
    /// Units requested
    pub amount: i64,
    /// When the request was filed (RFC 3339)
    pub requested_at: String,
    pub status: ReplenishmentStatus,
}

impl ReplenishmentRequest {
    /// Create a new pending request.
    pub fn new(pharmacist_id: String, medicine_name: String, amount: i64) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            pharmacist_id,
            medicine_name,
            amount,
            requested_at: chrono::Utc::now().to_rfc3339(),
            status: ReplenishmentStatus::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ReplenishmentStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_request_is_pending() {
        let req = ReplenishmentRequest::new("PH001".into(), "Paracetamol".into(), 50);
        assert!(req.is_pending());
        assert_eq!(req.amount, 50);
        assert_eq!(req.request_id.len(), 36);
    }
}
