use std::collections::{BTreeSet, HashMap};

use stockgrid_domain::{LineItemCollection, Lot, LotIndex, RowPolicy};

use crate::adapters::StockDirectory;
use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadTicket {
    generation: u64,
}

#[derive(Debug, Default)]
pub struct LotAvailabilityCache {
    index: LotIndex,
    reload_generation: u64,
}

impl LotAvailabilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(&self) -> &LotIndex {
        &self.index
    }

    pub fn available_quantity_for(&self, product: &str, expiry_date: &str) -> u32 {
        self.index.available_quantity_for(product, expiry_date)
    }

    pub async fn ensure_loaded(
        &mut self,
        directory: &dyn StockDirectory,
        product: &str,
    ) -> Result<(), CoreError> {
        if product.is_empty() || self.index.contains(product) {
            return Ok(());
        }
        let lots = directory.list_lots(product).await?;
        self.index.replace(product, lots);
        Ok(())
    }

    /// Issues the token for a new reload. Only the most recently issued
    /// token is accepted by `apply_reload`, so overlapping reloads settle on
    /// the latest-issued snapshot regardless of response arrival order.
    pub fn begin_reload(&mut self) -> ReloadTicket {
        self.reload_generation += 1;
        ReloadTicket {
            generation: self.reload_generation,
        }
    }

    pub async fn fetch_snapshot(
        directory: &dyn StockDirectory,
        products: &BTreeSet<String>,
    ) -> Result<HashMap<String, Vec<Lot>>, CoreError> {
        let mut snapshot = HashMap::new();
        for product in products {
            snapshot.insert(product.clone(), directory.list_lots(product).await?);
        }
        Ok(snapshot)
    }

    /// Replaces each fetched product's lots wholesale, then revalidates every
    /// row referencing one of them. Returns false if the snapshot was stale.
    pub fn apply_reload(
        &mut self,
        ticket: ReloadTicket,
        snapshot: HashMap<String, Vec<Lot>>,
        collection: &mut LineItemCollection,
        policy: RowPolicy,
    ) -> bool {
        if ticket.generation != self.reload_generation {
            tracing::debug!(
                generation = ticket.generation,
                latest = self.reload_generation,
                "discarding stale lot reload"
            );
            return false;
        }

        let reloaded: BTreeSet<String> = snapshot.keys().cloned().collect();
        for (product, lots) in snapshot {
            self.index.replace(product, lots);
        }

        for id in collection.row_order() {
            let Some(row) = collection.row(&id) else {
                continue;
            };
            if !reloaded.contains(&row.product) {
                continue;
            }
            let before = row.quantity;
            collection.set_row(&id, |row| policy.revalidate(row, &self.index));
            let after = collection.row(&id).and_then(|row| row.quantity);
            if after != before {
                tracing::debug!(
                    row = id.as_str(),
                    ?before,
                    ?after,
                    "quantity adjusted to fresh availability"
                );
            }
        }
        true
    }

    pub async fn reload_all(
        &mut self,
        directory: &dyn StockDirectory,
        collection: &mut LineItemCollection,
        policy: RowPolicy,
    ) -> Result<bool, CoreError> {
        let products = collection.referenced_products();
        let ticket = self.begin_reload();
        let snapshot = Self::fetch_snapshot(directory, &products).await?;
        Ok(self.apply_reload(ticket, snapshot, collection, policy))
    }

    pub fn invalidate_all(&mut self) {
        self.index.clear();
    }
}
