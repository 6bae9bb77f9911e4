use std::collections::HashMap;

use stockgrid_domain::RowId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Product,
    Expiry,
    Quantity,
}

impl Column {
    pub const ORDERED: [Column; 3] = [Column::Product, Column::Expiry, Column::Quantity];

    pub fn next(self) -> Option<Column> {
        match self {
            Self::Product => Some(Self::Expiry),
            Self::Expiry => Some(Self::Quantity),
            Self::Quantity => None,
        }
    }
}

pub trait FocusTarget: Send {
    fn focus(&self);
}

/// Focus handles keyed by stable row identity and semantic column, so
/// registrations survive row insertion and removal. Positional adjacency is
/// rebuilt from the live row order only at the moment of `advance`.
#[derive(Default)]
pub struct FocusRegistry {
    handles: HashMap<(RowId, Column), Box<dyn FocusTarget>>,
}

impl FocusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, row: RowId, column: Column, target: Box<dyn FocusTarget>) {
        self.handles.insert((row, column), target);
    }

    pub fn unregister_row(&mut self, row: &RowId) {
        self.handles.retain(|(candidate, _), _| candidate != row);
    }

    pub fn clear(&mut self) {
        self.handles.clear();
    }

    pub fn is_registered(&self, row: &RowId, column: Column) -> bool {
        self.handles.contains_key(&(row.clone(), column))
    }

    /// Moves focus to the next column of the same row, else to the first
    /// column of the next row in `order`, else does nothing. Both an Enter
    /// keypress and a field's own value-accepted event funnel through here so
    /// advancement behaves identically regardless of input modality.
    pub fn advance(&self, order: &[RowId], row: &RowId, column: Column) -> bool {
        if let Some(next) = column.next() {
            if let Some(target) = self.handles.get(&(row.clone(), next)) {
                target.focus();
                return true;
            }
        }

        let Some(position) = order.iter().position(|candidate| candidate == row) else {
            return false;
        };
        let Some(next_row) = order.get(position + 1) else {
            return false;
        };
        match self.handles.get(&(next_row.clone(), Column::Product)) {
            Some(target) => {
                target.focus();
                true
            }
            None => false,
        }
    }
}
