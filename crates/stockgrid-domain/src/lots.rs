use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    pub expiry_date: String,
    pub available_quantity: u32,
}

/// Availability snapshot keyed by product name. A missing key means "not yet
/// loaded", not "no stock". Entries are only ever replaced wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LotIndex {
    by_product: HashMap<String, Vec<Lot>>,
}

impl LotIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, product: &str) -> bool {
        self.by_product.contains_key(product)
    }

    pub fn replace(&mut self, product: impl Into<String>, mut lots: Vec<Lot>) {
        lots.sort_by(|a, b| a.expiry_date.cmp(&b.expiry_date));
        self.by_product.insert(product.into(), lots);
    }

    pub fn lots_for(&self, product: &str) -> Option<&[Lot]> {
        self.by_product.get(product).map(Vec::as_slice)
    }

    pub fn has_lot(&self, product: &str, expiry_date: &str) -> bool {
        self.lots_for(product)
            .is_some_and(|lots| lots.iter().any(|lot| lot.expiry_date == expiry_date))
    }

    pub fn available_quantity_for(&self, product: &str, expiry_date: &str) -> u32 {
        self.lots_for(product)
            .and_then(|lots| lots.iter().find(|lot| lot.expiry_date == expiry_date))
            .map_or(0, |lot| lot.available_quantity)
    }

    pub fn clear(&mut self) {
        self.by_product.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lot(expiry_date: &str, available_quantity: u32) -> Lot {
        Lot {
            expiry_date: expiry_date.to_owned(),
            available_quantity,
        }
    }

    #[test]
    fn unknown_product_or_expiry_reports_zero_availability() {
        let mut index = LotIndex::new();
        index.replace("Widget", vec![lot("2025-01-01", 5)]);

        assert_eq!(index.available_quantity_for("Widget", "2025-01-01"), 5);
        assert_eq!(index.available_quantity_for("Widget", "2025-06-01"), 0);
        assert_eq!(index.available_quantity_for("Gadget", "2025-01-01"), 0);
        assert!(!index.contains("Gadget"));
    }

    #[test]
    fn replace_is_wholesale_not_a_merge() {
        let mut index = LotIndex::new();
        index.replace(
            "Widget",
            vec![lot("2025-01-01", 5), lot("2025-06-01", 3)],
        );
        index.replace("Widget", vec![lot("2025-06-01", 2)]);

        assert!(!index.has_lot("Widget", "2025-01-01"));
        assert_eq!(index.available_quantity_for("Widget", "2025-06-01"), 2);
    }

    #[test]
    fn lots_are_ordered_by_expiry_date() {
        let mut index = LotIndex::new();
        index.replace(
            "Widget",
            vec![lot("2026-03-01", 1), lot("2025-01-01", 2), lot("2025-06-01", 3)],
        );

        let expiries: Vec<&str> = index
            .lots_for("Widget")
            .expect("widget lots")
            .iter()
            .map(|lot| lot.expiry_date.as_str())
            .collect();
        assert_eq!(expiries, vec!["2025-01-01", "2025-06-01", "2026-03-01"]);
    }
}
