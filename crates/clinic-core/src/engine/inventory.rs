//! Medicine ledger administration and the replenishment workflow.

use serde::{Deserialize, Serialize};
use strsim::{jaro_winkler, normalized_levenshtein};
use tracing::{info, warn};

use crate::db::Database;
use crate::models::{
    Medicine, MedicineStock, Principal, ReplenishmentRequest, ReplenishmentStatus, Role,
};

use super::{require_role, EngineError, EngineResult};

/// Minimum similarity for a name suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.7;

/// Result of approving a replenishment request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReplenishmentReceipt {
    pub request: ReplenishmentRequest,
    /// Medicine after the stock increase
    pub medicine: Medicine,
}

pub struct Inventory<'a> {
    db: &'a Database,
}

impl<'a> Inventory<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Every medicine with its low-stock flag, by name.
    pub fn inventory(&self, principal: &Principal) -> EngineResult<Vec<MedicineStock>> {
        require_role(principal, &[Role::Pharmacist, Role::Administrator])?;
        Ok(self
            .db
            .list_medicines()?
            .into_iter()
            .map(MedicineStock::from)
            .collect())
    }

    /// Add a medicine to the ledger.
    pub fn add_medicine(
        &self,
        admin: &Principal,
        name: &str,
        unit_cost: f64,
        stock: i64,
        alert_threshold: i64,
    ) -> EngineResult<Medicine> {
        require_role(admin, &[Role::Administrator])?;

        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::Validation("Medicine name is empty".into()));
        }
        if !unit_cost.is_finite() || unit_cost < 0.0 {
            return Err(EngineError::Validation(format!(
                "Unit cost must be a non-negative amount, got {}",
                unit_cost
            )));
        }
        if alert_threshold < 0 {
            return Err(EngineError::Validation(format!(
                "Alert threshold must be non-negative, got {}",
                alert_threshold
            )));
        }

        let medicine = Medicine::new(name.to_string(), unit_cost, stock, alert_threshold);
        self.db.insert_medicine(&medicine).map_err(|e| {
            if e.is_constraint_violation() {
                EngineError::Conflict(format!("Medicine {} already exists", name))
            } else {
                e.into()
            }
        })?;

        info!(medicine = %medicine.name, unit_cost, stock, alert_threshold, "Medicine added");
        Ok(medicine)
    }

    /// Change the level at or below which a medicine counts as low.
    pub fn set_alert_threshold(&self, admin: &Principal, name: &str, level: i64) -> EngineResult<Medicine> {
        require_role(admin, &[Role::Administrator])?;
        if level < 0 {
            return Err(EngineError::Validation(format!(
                "Alert threshold must be non-negative, got {}",
                level
            )));
        }

        self.db.atomically(|db| {
            let mut medicine = self.require_medicine(name)?;
            let previous = medicine.alert_threshold;
            medicine.set_alert_threshold(level);
            db.update_medicine(&medicine)?;

            info!(medicine = %medicine.name, previous, level, "Alert threshold updated");
            Ok(medicine)
        })
    }

    /// File a restock request for a medicine at or below its threshold.
    pub fn file_request(&self, pharmacist: &Principal, name: &str, amount: i64) -> EngineResult<ReplenishmentRequest> {
        require_role(pharmacist, &[Role::Pharmacist])?;
        if amount <= 0 {
            return Err(EngineError::Validation(format!(
                "Replenishment amount must be positive, got {}",
                amount
            )));
        }

        self.db.atomically(|db| {
            let medicine = self.require_medicine(name)?;
            if !medicine.check_low_stock() {
                warn!(
                    medicine = %medicine.name,
                    stock = medicine.stock,
                    threshold = medicine.alert_threshold,
                    "Replenishment refused, stock above threshold"
                );
                return Err(EngineError::Validation(format!(
                    "{} stock ({}) is above its alert threshold ({})",
                    medicine.name, medicine.stock, medicine.alert_threshold
                )));
            }

            let request = ReplenishmentRequest::new(pharmacist.id.clone(), medicine.name.clone(), amount);
            db.insert_replenishment_request(&request)?;

            info!(request_id = %request.request_id, medicine = %request.medicine_name, amount, "Replenishment requested");
            Ok(request)
        })
    }

    /// Requests awaiting approval, oldest first.
    pub fn pending_replenishments(&self, admin: &Principal) -> EngineResult<Vec<ReplenishmentRequest>> {
        require_role(admin, &[Role::Administrator])?;
        Ok(self
            .db
            .list_replenishment_requests_by_status(ReplenishmentStatus::Pending)?)
    }

    /// Approve a pending request and add its amount to stock.
    pub fn approve_replenishment(&self, admin: &Principal, request_id: &str) -> EngineResult<ReplenishmentReceipt> {
        require_role(admin, &[Role::Administrator])?;

        self.db.atomically(|db| {
            let mut request = db.get_replenishment_request(request_id)?.ok_or_else(|| {
                EngineError::NotFound(format!("Replenishment request {}", request_id))
            })?;
            if !request.is_pending() {
                return Err(EngineError::InvalidState(format!(
                    "Replenishment request {} is already approved",
                    request_id
                )));
            }

            let mut medicine = self.require_medicine(&request.medicine_name)?;
            medicine.replenish(request.amount)?;
            db.update_medicine(&medicine)?;

            if !db.mark_replenishment_approved(request_id)? {
                return Err(EngineError::InvalidState(format!(
                    "Replenishment request {} is no longer pending",
                    request_id
                )));
            }
            request.status = ReplenishmentStatus::Approved;

            info!(
                request_id,
                medicine = %medicine.name,
                amount = request.amount,
                stock = medicine.stock,
                "Replenishment approved"
            );
            Ok(ReplenishmentReceipt { request, medicine })
        })
    }

    fn require_medicine(&self, name: &str) -> EngineResult<Medicine> {
        if let Some(medicine) = self.db.get_medicine(name)? {
            return Ok(medicine);
        }
        let names = self.db.medicine_names()?;
        Err(EngineError::NotFound(match closest_medicine(name, &names) {
            Some(hint) => format!("Medicine {} (did you mean {}?)", name, hint),
            None => format!("Medicine {}", name),
        }))
    }
}

/// The known medicine name most similar to `name`, if any is close enough.
pub fn closest_medicine(name: &str, known: &[String]) -> Option<String> {
    let needle = name.to_lowercase();
    known
        .iter()
        .map(|candidate| (candidate, similarity(&needle, &candidate.to_lowercase())))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(candidate, _)| candidate.clone())
}

// Jaro-Winkler favours shared prefixes, Levenshtein overall edits.
fn similarity(a: &str, b: &str) -> f64 {
    jaro_winkler(a, b) * 0.6 + normalized_levenshtein(a, b) * 0.4
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::*;

    #[test]
    fn test_inventory_flags_low_stock() {
        let db = setup_db();
        let stock = Inventory::new(&db).inventory(&admin()).unwrap();

        let names: Vec<_> = stock.iter().map(|s| s.medicine.name.as_str()).collect();
        assert_eq!(names, ["Amoxicillin", "Ibuprofen", "Paracetamol"]);
        assert!(stock[0].low_stock);
        assert!(!stock[1].low_stock);
        assert!(Inventory::new(&db).inventory(&patient()).is_err());
    }

    #[test]
    fn test_add_medicine() {
        let db = setup_db();
        let inventory = Inventory::new(&db);

        let added = inventory.add_medicine(&admin(), " Cetirizine ", 0.75, 40, 5).unwrap();
        assert_eq!(added.name, "Cetirizine");
        assert!(db.get_medicine("Cetirizine").unwrap().is_some());

        assert!(matches!(
            inventory.add_medicine(&admin(), "Cetirizine", 0.75, 40, 5),
            Err(EngineError::Conflict(_))
        ));
        assert!(matches!(
            inventory.add_medicine(&admin(), "Loratadine", -1.0, 40, 5),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            inventory.add_medicine(&pharmacist(), "Loratadine", 1.0, 40, 5),
            Err(EngineError::Forbidden(_))
        ));
    }

    #[test]
    fn test_set_alert_threshold() {
        let db = setup_db();
        let inventory = Inventory::new(&db);

        let updated = inventory.set_alert_threshold(&admin(), "Ibuprofen", 60).unwrap();
        assert!(updated.check_low_stock());
        assert_eq!(db.get_medicine("Ibuprofen").unwrap().unwrap().alert_threshold, 60);

        assert!(matches!(
            inventory.set_alert_threshold(&admin(), "Ibuprofen", -1),
            Err(EngineError::Validation(_))
        ));
        let err = inventory.set_alert_threshold(&admin(), "Ibuprofin", 5).unwrap_err();
        assert!(matches!(err, EngineError::NotFound(ref msg) if msg.contains("Ibuprofen")));
    }

    #[test]
    fn test_file_request_requires_low_stock() {
        let db = setup_db();
        let inventory = Inventory::new(&db);

        // Paracetamol: 100 on hand, threshold 20
        assert!(matches!(
            inventory.file_request(&pharmacist(), "Paracetamol", 50),
            Err(EngineError::Validation(_))
        ));
        assert!(db.list_replenishment_requests().unwrap().is_empty());

        let request = inventory.file_request(&pharmacist(), "Amoxicillin", 30).unwrap();
        assert_eq!(request.status, ReplenishmentStatus::Pending);
        assert_eq!(request.pharmacist_id, "PH001");

        assert!(matches!(
            inventory.file_request(&pharmacist(), "Amoxicillin", 0),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            inventory.file_request(&pharmacist(), "Unobtainium", 5),
            Err(EngineError::NotFound(_))
        ));
    }

    #[test]
    fn test_approve_replenishment() {
        let db = setup_db();
        let inventory = Inventory::new(&db);
        let request = inventory.file_request(&pharmacist(), "Amoxicillin", 30).unwrap();
        assert_eq!(inventory.pending_replenishments(&admin()).unwrap().len(), 1);

        let receipt = inventory.approve_replenishment(&admin(), &request.request_id).unwrap();
        assert_eq!(receipt.medicine.stock, 35);
        assert_eq!(receipt.request.status, ReplenishmentStatus::Approved);
        assert!(inventory.pending_replenishments(&admin()).unwrap().is_empty());

        // Approval is one-shot
        assert!(matches!(
            inventory.approve_replenishment(&admin(), &request.request_id),
            Err(EngineError::InvalidState(_))
        ));
        assert_eq!(db.get_medicine("Amoxicillin").unwrap().unwrap().stock, 35);
        assert_eq!(db.get_medicine("Paracetamol").unwrap().unwrap().stock, 100);
    }

    #[test]
    fn test_approve_replenishment_overflow_is_rejected() {
        let db = setup_db();
        let inventory = Inventory::new(&db);
        let request = inventory
            .file_request(&pharmacist(), "Amoxicillin", i64::MAX)
            .unwrap();

        let err = inventory
            .approve_replenishment(&admin(), &request.request_id)
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));

        // Nothing written; the request can still be seen and the store still works
        assert_eq!(db.get_medicine("Amoxicillin").unwrap().unwrap().stock, 5);
        assert_eq!(inventory.pending_replenishments(&admin()).unwrap().len(), 1);
        assert_eq!(inventory.inventory(&admin()).unwrap().len(), 3);
    }

    #[test]
    fn test_closest_medicine() {
        let known = vec!["Amoxicillin".to_string(), "Paracetamol".to_string()];
        assert_eq!(closest_medicine("paracetmol", &known).as_deref(), Some("Paracetamol"));
        assert_eq!(closest_medicine("Zz", &known), None);
    }
}
