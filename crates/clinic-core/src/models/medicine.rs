//! Medicine ledger models.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stock adjustment that would leave the ledger outside the `i64` range.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Adjusting {medicine} stock {stock} by {delta} overflows")]
pub struct StockOverflow {
    pub medicine: String,
    pub stock: i64,
    pub delta: i64,
}

/// A stocked medicine, keyed by its unique name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Medicine {
    /// Unique medicine name
    pub name: String,
    /// Cost per dispensed unit
    pub unit_cost: f64,
    /// Units on hand; may go negative when dispensing outruns stock
    pub stock: i64,
    /// Stock level at or below which a restock may be requested
    pub alert_threshold: i64,
}

impl Medicine {
    /// Create a new medicine entry.
    pub fn new(name: String, unit_cost: f64, stock: i64, alert_threshold: i64) -> Self {
        Self {
            name,
            unit_cost,
            stock,
            alert_threshold,
        }
    }

    /// Increase stock. Stock is left untouched on overflow.
    pub fn replenish(&mut self, amount: i64) -> Result<(), StockOverflow> {
        let stock = self
            .stock
            .checked_add(amount)
            .ok_or_else(|| self.overflow(amount))?;
        self.stock = stock;
        Ok(())
    }

    /// Decrease stock. No floor is applied, but the result must fit in `i64`.
    pub fn decrease(&mut self, amount: i64) -> Result<(), StockOverflow> {
        let stock = self
            .stock
            .checked_sub(amount)
            .ok_or_else(|| self.overflow(amount.saturating_neg()))?;
        self.stock = stock;
        Ok(())
    }

    fn overflow(&self, delta: i64) -> StockOverflow {
        StockOverflow {
            medicine: self.name.clone(),
            stock: self.stock,
            delta,
        }
    }

    /// True when stock has fallen to the alert threshold or below.
    pub fn check_low_stock(&self) -> bool {
        self.stock <= self.alert_threshold
    }

    pub fn set_alert_threshold(&mut self, level: i64) {
        self.alert_threshold = level;
    }

    /// Cost of dispensing `quantity` units.
    pub fn cost_of(&self, quantity: u32) -> f64 {
        self.unit_cost * f64::from(quantity)
    }
}

/// Inventory line: a medicine plus its low-stock flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicineStock {
    pub medicine: Medicine,
    pub low_stock: bool,
}

impl From<Medicine> for MedicineStock {
    fn from(medicine: Medicine) -> Self {
        let low_stock = medicine.check_low_stock();
        Self { medicine, low_stock }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_stock_is_inclusive() {
        let mut med = Medicine::new("Paracetamol".into(), 0.5, 10, 10);
        assert!(med.check_low_stock());

        med.replenish(1).unwrap();
        assert!(!med.check_low_stock());

        med.set_alert_threshold(11);
        assert!(med.check_low_stock());
    }

    #[test]
    fn test_decrease_allows_negative_stock() {
        let mut med = Medicine::new("Ibuprofen".into(), 1.0, 3, 1);
        med.decrease(5).unwrap();
        assert_eq!(med.stock, -2);
        assert!(med.check_low_stock());
    }

    #[test]
    fn test_stock_overflow_leaves_stock_unchanged() {
        let mut med = Medicine::new("Amoxicillin".into(), 2.0, 5, 10);
        let err = med.replenish(i64::MAX).unwrap_err();
        assert_eq!(err.stock, 5);
        assert_eq!(err.delta, i64::MAX);
        assert_eq!(med.stock, 5);

        let mut med = Medicine::new("Ibuprofen".into(), 1.0, i64::MIN + 1, 0);
        assert!(med.decrease(2).is_err());
        assert_eq!(med.stock, i64::MIN + 1);
        med.decrease(1).unwrap();
        assert_eq!(med.stock, i64::MIN);
    }

    #[test]
    fn test_cost_of() {
        let med = Medicine::new("Paracetamol".into(), 0.5, 100, 10);
        assert_eq!(med.cost_of(2), 1.0);
        assert_eq!(med.cost_of(0), 0.0);
    }
}
