use crate::line_items::{LineItem, RowError};
use crate::lots::LotIndex;

/// Per-flow validation rules, selected once per editor instance. Picking the
/// wrong variant for a flow is a caller error, not something detected here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowPolicy {
    Intake,
    Removal,
    Loan { adjust_stock: bool },
}

impl RowPolicy {
    pub fn is_removal(self) -> bool {
        matches!(self, Self::Removal)
    }

    pub fn is_complete(self, row: &LineItem) -> bool {
        match self {
            Self::Intake => {
                !row.product.is_empty()
                    && row.quantity.is_some_and(|quantity| quantity > 0)
                    && row.expiry_date.is_some()
            }
            Self::Removal => {
                !row.product.is_empty()
                    && row.expiry_date.is_some()
                    && row.quantity.is_some_and(|quantity| quantity > 0)
                    && row.error.is_none()
            }
            Self::Loan { adjust_stock } => {
                if row.product.is_empty() || row.quantity.is_none() {
                    return false;
                }
                !adjust_stock || row.expiry_date.is_some()
            }
        }
    }

    /// Caps the quantity at the current availability of the row's lot.
    /// Identity for every flow except removal. Zero availability clears the
    /// quantity rather than pinning it at zero.
    pub fn clamp(self, row: &mut LineItem, index: &LotIndex) {
        if !self.is_removal() {
            return;
        }
        let Some(quantity) = row.quantity else {
            return;
        };
        let available = row
            .expiry_date
            .as_deref()
            .map_or(0, |expiry| index.available_quantity_for(&row.product, expiry));
        row.quantity = if available == 0 {
            None
        } else {
            Some(quantity.min(i64::from(available)))
        };
    }

    /// Re-checks one row against a fresh availability snapshot, overwriting
    /// the user's quantity where the snapshot demands it.
    pub fn revalidate(self, row: &mut LineItem, index: &LotIndex) {
        if !self.is_removal() {
            return;
        }
        match row.expiry_date.as_deref() {
            None => {
                row.error = Some(RowError::MissingDate);
            }
            Some(expiry) if !index.has_lot(&row.product, expiry) => {
                row.error = Some(RowError::NoLotAtDate);
                row.quantity = None;
            }
            Some(_) => {
                row.error = None;
                self.clamp(row, index);
            }
        }
    }

    pub fn describe_error(self, rows: &[LineItem]) -> String {
        let requirements = match self {
            Self::Intake | Self::Loan { adjust_stock: true } => {
                "a product, a quantity above zero, and an expiry date are required"
            }
            Self::Removal => {
                "a product, an in-stock expiry date, and a quantity within the available stock are required"
            }
            Self::Loan { adjust_stock: false } => "a product and a quantity are required",
        };

        match rows.iter().position(|row| !self.is_complete(row)) {
            Some(index) => format!("row {} is incomplete: {requirements}", index + 1),
            None => format!("incomplete rows: {requirements}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_items::{LineItemCollection, RowId};
    use crate::lots::Lot;

    fn row(product: &str, quantity: Option<i64>, expiry_date: Option<&str>) -> LineItem {
        LineItem {
            id: RowId::new("row-1"),
            product: product.to_owned(),
            quantity,
            expiry_date: expiry_date.map(str::to_owned),
            error: None,
        }
    }

    fn widget_index(available: u32) -> LotIndex {
        let mut index = LotIndex::new();
        index.replace(
            "Widget",
            vec![Lot {
                expiry_date: "2025-01-01".to_owned(),
                available_quantity: available,
            }],
        );
        index
    }

    #[test]
    fn intake_requires_product_positive_quantity_and_date() {
        let policy = RowPolicy::Intake;
        assert!(policy.is_complete(&row("Widget", Some(3), Some("2025-01-01"))));
        assert!(!policy.is_complete(&row("", Some(3), Some("2025-01-01"))));
        assert!(!policy.is_complete(&row("Widget", Some(0), Some("2025-01-01"))));
        assert!(!policy.is_complete(&row("Widget", None, Some("2025-01-01"))));
        assert!(!policy.is_complete(&row("Widget", Some(3), None)));
    }

    #[test]
    fn removal_rejects_rows_carrying_a_validation_error() {
        let policy = RowPolicy::Removal;
        let mut item = row("Widget", Some(2), Some("2025-01-01"));
        assert!(policy.is_complete(&item));

        item.error = Some(RowError::NoLotAtDate);
        assert!(!policy.is_complete(&item));
    }

    #[test]
    fn loan_expiry_is_conditional_on_adjust_stock() {
        let with_stock = RowPolicy::Loan { adjust_stock: true };
        let record_only = RowPolicy::Loan { adjust_stock: false };
        let item = row("Widget", Some(2), None);

        assert!(!with_stock.is_complete(&item));
        assert!(record_only.is_complete(&item));
    }

    #[test]
    fn clamp_caps_at_availability_and_clears_on_zero() {
        let policy = RowPolicy::Removal;

        let mut item = row("Widget", Some(9), Some("2025-01-01"));
        policy.clamp(&mut item, &widget_index(5));
        assert_eq!(item.quantity, Some(5));

        let mut item = row("Widget", Some(9), Some("2025-01-01"));
        policy.clamp(&mut item, &widget_index(0));
        assert_eq!(item.quantity, None);

        let mut item = row("Widget", Some(9), Some("2025-01-01"));
        RowPolicy::Intake.clamp(&mut item, &widget_index(5));
        assert_eq!(item.quantity, Some(9));
    }

    #[test]
    fn revalidate_flags_missing_date_without_touching_quantity() {
        let policy = RowPolicy::Removal;
        let mut item = row("Widget", Some(4), None);

        policy.revalidate(&mut item, &widget_index(5));

        assert_eq!(item.error, Some(RowError::MissingDate));
        assert_eq!(item.error.map(RowError::message), Some("pick a date"));
        assert_eq!(item.quantity, Some(4));
    }

    #[test]
    fn revalidate_clears_quantity_when_the_lot_is_gone() {
        let policy = RowPolicy::Removal;
        let mut item = row("Widget", Some(4), Some("2030-12-31"));

        policy.revalidate(&mut item, &widget_index(5));

        assert_eq!(item.error, Some(RowError::NoLotAtDate));
        assert_eq!(
            item.error.map(RowError::message),
            Some("no stock at that date")
        );
        assert_eq!(item.quantity, None);
    }

    #[test]
    fn revalidate_clears_error_and_clamps_known_lots() {
        let policy = RowPolicy::Removal;
        let mut item = row("Widget", Some(9), Some("2025-01-01"));
        item.error = Some(RowError::NoLotAtDate);

        policy.revalidate(&mut item, &widget_index(5));

        assert_eq!(item.error, None);
        assert_eq!(item.quantity, Some(5));
    }

    #[test]
    fn describe_error_names_the_first_incomplete_row() {
        let mut collection = LineItemCollection::new();
        let first = collection.rows()[0].id.clone();
        collection.set_row(&first, |row| {
            row.product = "Widget".to_owned();
            row.quantity = Some(2);
            row.expiry_date = Some("2025-01-01".to_owned());
        });
        let second = collection.rows()[1].id.clone();
        collection.set_row(&second, |row| row.product = "Gadget".to_owned());

        let message = RowPolicy::Intake.describe_error(collection.non_ghost_rows());
        assert!(message.starts_with("row 2 is incomplete"), "{message}");
    }
}
