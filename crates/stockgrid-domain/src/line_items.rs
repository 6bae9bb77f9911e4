use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }
    };
}

string_id!(RowId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowError {
    MissingDate,
    NoLotAtDate,
}

impl RowError {
    pub fn message(self) -> &'static str {
        match self {
            Self::MissingDate => "pick a date",
            Self::NoLotAtDate => "no stock at that date",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: RowId,
    pub product: String,
    pub quantity: Option<i64>,
    pub expiry_date: Option<String>,
    pub error: Option<RowError>,
}

impl LineItem {
    fn blank(id: RowId) -> Self {
        Self {
            id,
            product: String::new(),
            quantity: None,
            expiry_date: None,
            error: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.product.is_empty() && self.quantity.is_none() && self.expiry_date.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItemCollection {
    rows: Vec<LineItem>,
    next_row: u64,
}

impl LineItemCollection {
    pub fn new() -> Self {
        let mut collection = Self {
            rows: Vec::new(),
            next_row: 0,
        };
        let blank = collection.make_blank();
        collection.rows.push(blank);
        collection
    }

    fn make_blank(&mut self) -> LineItem {
        self.next_row += 1;
        LineItem::blank(RowId::new(format!("row-{}", self.next_row)))
    }

    pub fn rows(&self) -> &[LineItem] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, id: &RowId) -> Option<&LineItem> {
        self.rows.iter().find(|row| &row.id == id)
    }

    /// Applies `updater` to the row with that identity, then re-asserts the
    /// trailing-blank invariant. Unknown ids are ignored. Never removes rows.
    pub fn set_row(&mut self, id: &RowId, updater: impl FnOnce(&mut LineItem)) {
        if let Some(row) = self.rows.iter_mut().find(|row| &row.id == id) {
            let id = row.id.clone();
            updater(row);
            // row identity is stable across edits
            row.id = id;
        }
        self.ensure_trailing_blank();
    }

    pub fn remove_row(&mut self, id: &RowId) {
        self.rows.retain(|row| &row.id != id);
        if self.rows.is_empty() {
            let blank = self.make_blank();
            self.rows.push(blank);
        }
        self.ensure_trailing_blank();
    }

    pub fn reset(&mut self) {
        self.rows.clear();
        let blank = self.make_blank();
        self.rows.push(blank);
    }

    fn ensure_trailing_blank(&mut self) {
        let needs_blank = self.rows.last().is_none_or(|last| !last.is_empty());
        if needs_blank {
            let blank = self.make_blank();
            self.rows.push(blank);
        }
    }

    /// Every row except a trailing empty one; the perpetual blank tail never
    /// counts as data.
    pub fn non_ghost_rows(&self) -> &[LineItem] {
        match self.rows.last() {
            Some(last) if last.is_empty() => &self.rows[..self.rows.len() - 1],
            _ => &self.rows,
        }
    }

    pub fn row_order(&self) -> Vec<RowId> {
        self.rows.iter().map(|row| row.id.clone()).collect()
    }

    pub fn referenced_products(&self) -> BTreeSet<String> {
        self.rows
            .iter()
            .filter(|row| !row.product.is_empty())
            .map(|row| row.product.clone())
            .collect()
    }
}

impl Default for LineItemCollection {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_id(collection: &LineItemCollection) -> RowId {
        collection.rows()[0].id.clone()
    }

    #[test]
    fn starts_with_a_single_blank_row() {
        let collection = LineItemCollection::new();
        assert_eq!(collection.len(), 1);
        assert!(collection.rows()[0].is_empty());
        assert!(collection.non_ghost_rows().is_empty());
    }

    #[test]
    fn editing_the_tail_row_appends_a_fresh_blank() {
        let mut collection = LineItemCollection::new();
        let id = first_id(&collection);

        collection.set_row(&id, |row| row.product = "Widget".to_owned());

        assert_eq!(collection.len(), 2);
        assert_eq!(collection.rows()[0].product, "Widget");
        assert!(collection.rows()[1].is_empty());
        assert_eq!(collection.non_ghost_rows().len(), 1);
    }

    #[test]
    fn blanking_the_tail_row_does_not_stack_ghosts() {
        let mut collection = LineItemCollection::new();
        let id = first_id(&collection);

        collection.set_row(&id, |row| row.product = "Widget".to_owned());
        collection.set_row(&id, |row| row.product.clear());

        assert_eq!(collection.len(), 2);
        assert!(collection.rows().iter().all(LineItem::is_empty));
    }

    #[test]
    fn blanked_middle_row_is_inert() {
        let mut collection = LineItemCollection::new();
        let first = first_id(&collection);
        collection.set_row(&first, |row| row.product = "Widget".to_owned());
        let second = collection.rows()[1].id.clone();
        collection.set_row(&second, |row| row.product = "Gadget".to_owned());

        collection.set_row(&first, |row| row.product.clear());

        assert_eq!(collection.len(), 3);
        assert!(collection.rows()[0].is_empty());
        assert_eq!(collection.non_ghost_rows().len(), 2);
    }

    #[test]
    fn removing_the_last_row_synthesizes_a_blank() {
        let mut collection = LineItemCollection::new();
        let id = first_id(&collection);
        collection.set_row(&id, |row| row.product = "Widget".to_owned());

        let ghost = collection.rows()[1].id.clone();
        collection.remove_row(&id);
        collection.remove_row(&ghost);

        assert_eq!(collection.len(), 1);
        assert!(collection.rows()[0].is_empty());
    }

    #[test]
    fn updater_cannot_change_row_identity() {
        let mut collection = LineItemCollection::new();
        let id = first_id(&collection);

        collection.set_row(&id, |row| row.id = RowId::new("hijacked"));

        assert_eq!(collection.rows()[0].id, id);
    }

    #[test]
    fn invariant_holds_across_arbitrary_edit_sequences() {
        let mut collection = LineItemCollection::new();

        for step in 0..40u32 {
            let order = collection.row_order();
            let target = order[(step as usize * 7) % order.len()].clone();
            match step % 4 {
                0 => collection.set_row(&target, |row| row.product = format!("p{step}")),
                1 => collection.set_row(&target, |row| row.quantity = Some(i64::from(step))),
                2 => collection.set_row(&target, |row| row.product.clear()),
                _ => collection.remove_row(&target),
            }

            assert!(!collection.is_empty());
            let rows = collection.rows();
            if rows.len() >= 2 && !rows[rows.len() - 2].is_empty() {
                assert!(rows[rows.len() - 1].is_empty());
            }
        }
    }

    #[test]
    fn referenced_products_are_distinct_and_skip_blanks() {
        let mut collection = LineItemCollection::new();
        let first = first_id(&collection);
        collection.set_row(&first, |row| row.product = "Widget".to_owned());
        let second = collection.rows()[1].id.clone();
        collection.set_row(&second, |row| row.product = "Widget".to_owned());
        let third = collection.rows()[2].id.clone();
        collection.set_row(&third, |row| row.product = "Gadget".to_owned());

        let products: Vec<String> = collection.referenced_products().into_iter().collect();
        assert_eq!(products, vec!["Gadget".to_owned(), "Widget".to_owned()]);
    }
}
