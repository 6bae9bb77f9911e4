use std::collections::{BTreeSet, HashMap};

use stockgrid_domain::{
    LineItem, LineItemCollection, LoanHeader, LoanHeaderConfig, Lot, RowId, RowPolicy,
};
use tokio::sync::mpsc;

use crate::adapters::{StockDirectory, TransactionGateway};
use crate::cache::{LotAvailabilityCache, ReloadTicket};
use crate::error::{CoreError, SubmitError};
use crate::focus::{Column, FocusRegistry};
use crate::pipeline::SubmissionPipeline;

const SUBMITTED_EVENT_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmittedNotice;

/// One grid editor instance, wired for a single flow. Single-owner,
/// single-writer: every mutation happens through `&mut self` from whichever
/// host event currently holds control.
pub struct EntrySession {
    policy: RowPolicy,
    collection: LineItemCollection,
    cache: LotAvailabilityCache,
    focus: FocusRegistry,
    pipeline: SubmissionPipeline,
    products: Vec<String>,
    header: Option<LoanHeader>,
    loan_config: LoanHeaderConfig,
    submitted_sender: mpsc::Sender<SubmittedNotice>,
    submitted_receiver: Option<mpsc::Receiver<SubmittedNotice>>,
}

impl EntrySession {
    pub fn intake() -> Self {
        Self::with_policy(RowPolicy::Intake, None, LoanHeaderConfig::default())
    }

    pub fn removal() -> Self {
        Self::with_policy(RowPolicy::Removal, None, LoanHeaderConfig::default())
    }

    pub fn loan(config: LoanHeaderConfig) -> Self {
        Self::with_policy(
            RowPolicy::Loan {
                adjust_stock: config.adjust_stock,
            },
            Some(LoanHeader::fresh(&config)),
            config,
        )
    }

    fn with_policy(
        policy: RowPolicy,
        header: Option<LoanHeader>,
        loan_config: LoanHeaderConfig,
    ) -> Self {
        let (submitted_sender, submitted_receiver) =
            mpsc::channel(SUBMITTED_EVENT_CHANNEL_CAPACITY);
        Self {
            policy,
            collection: LineItemCollection::new(),
            cache: LotAvailabilityCache::new(),
            focus: FocusRegistry::new(),
            pipeline: SubmissionPipeline::new(),
            products: Vec::new(),
            header,
            loan_config,
            submitted_sender,
            submitted_receiver: Some(submitted_receiver),
        }
    }

    // The loan header owns the live adjust-stock flag; the policy follows it
    // per submission.
    fn current_policy(&self) -> RowPolicy {
        match (self.policy, &self.header) {
            (RowPolicy::Loan { .. }, Some(header)) => RowPolicy::Loan {
                adjust_stock: header.adjust_stock,
            },
            (policy, _) => policy,
        }
    }

    pub fn rows(&self) -> &[LineItem] {
        self.collection.rows()
    }

    pub fn collection(&self) -> &LineItemCollection {
        &self.collection
    }

    pub fn cache(&self) -> &LotAvailabilityCache {
        &self.cache
    }

    pub fn products(&self) -> &[String] {
        &self.products
    }

    pub fn header(&self) -> Option<&LoanHeader> {
        self.header.as_ref()
    }

    pub fn header_mut(&mut self) -> Option<&mut LoanHeader> {
        self.header.as_mut()
    }

    pub fn focus_mut(&mut self) -> &mut FocusRegistry {
        &mut self.focus
    }

    pub fn is_submitting(&self) -> bool {
        self.pipeline.is_submitting()
    }

    pub fn take_submitted_receiver(&mut self) -> Option<mpsc::Receiver<SubmittedNotice>> {
        self.submitted_receiver.take()
    }

    pub async fn load_products(&mut self, directory: &dyn StockDirectory) -> Result<(), CoreError> {
        let mut products = match self.policy {
            RowPolicy::Removal => directory.list_products_with_stock().await?,
            _ => directory.list_all_products().await?,
        };
        sort_products(&mut products);
        self.products = products;
        Ok(())
    }

    pub async fn set_product(
        &mut self,
        directory: &dyn StockDirectory,
        id: &RowId,
        name: impl Into<String>,
    ) -> Result<(), CoreError> {
        let name = name.into();
        let policy = self.current_policy();
        if policy.is_removal() {
            self.cache.ensure_loaded(directory, &name).await?;
        }

        let index = self.cache.index();
        self.collection.set_row(id, |row| {
            row.product = name;
            if policy.is_removal() {
                // a date carried over from the previous product may not exist here
                if let Some(expiry) = row.expiry_date.as_deref() {
                    if !index.has_lot(&row.product, expiry) {
                        row.expiry_date = None;
                    }
                }
                row.error = None;
                policy.clamp(row, index);
            }
        });

        // choosing a product advances focus exactly like pressing Enter
        self.advance_focus(id, Column::Product);
        Ok(())
    }

    pub fn set_expiry(&mut self, id: &RowId, value: Option<String>) {
        let policy = self.current_policy();
        let index = self.cache.index();
        self.collection.set_row(id, |row| {
            row.expiry_date = value;
            policy.revalidate(row, index);
        });
    }

    pub fn set_quantity(&mut self, id: &RowId, value: Option<i64>) {
        let policy = self.current_policy();
        let index = self.cache.index();
        self.collection.set_row(id, |row| {
            row.quantity = value.filter(|quantity| *quantity >= 0);
            policy.clamp(row, index);
        });
    }

    pub fn remove_row(&mut self, id: &RowId) {
        self.collection.remove_row(id);
        self.focus.unregister_row(id);
    }

    pub fn reset(&mut self) {
        self.collection.reset();
        self.focus.clear();
    }

    pub fn advance_focus(&self, id: &RowId, column: Column) -> bool {
        self.focus.advance(&self.collection.row_order(), id, column)
    }

    pub fn available_hint(&self, id: &RowId) -> u32 {
        let Some(row) = self.collection.row(id) else {
            return 0;
        };
        let Some(expiry) = row.expiry_date.as_deref() else {
            return 0;
        };
        self.cache.available_quantity_for(&row.product, expiry)
    }

    /// The external "something changed elsewhere" signal: refetch every
    /// referenced product and revalidate all rows.
    pub async fn inventory_changed(
        &mut self,
        directory: &dyn StockDirectory,
    ) -> Result<bool, CoreError> {
        let policy = self.current_policy();
        self.cache
            .reload_all(directory, &mut self.collection, policy)
            .await
    }

    pub fn reload_products(&self) -> BTreeSet<String> {
        self.collection.referenced_products()
    }

    pub fn begin_reload(&mut self) -> ReloadTicket {
        self.cache.begin_reload()
    }

    pub fn apply_reload(
        &mut self,
        ticket: ReloadTicket,
        snapshot: HashMap<String, Vec<Lot>>,
    ) -> bool {
        let policy = self.current_policy();
        self.cache
            .apply_reload(ticket, snapshot, &mut self.collection, policy)
    }

    pub async fn submit(
        &mut self,
        gateway: &dyn TransactionGateway,
        directory: &dyn StockDirectory,
    ) -> Result<(), SubmitError> {
        let policy = self.current_policy();
        let outcome = self
            .pipeline
            .submit(
                &mut self.collection,
                policy,
                &self.cache,
                gateway,
                self.header.as_ref(),
            )
            .await;

        match outcome {
            Ok(()) => {
                self.focus.clear();
                if let Some(header) = &mut self.header {
                    *header = LoanHeader::fresh(&self.loan_config);
                }
                if policy.is_removal() {
                    // the submission itself changed availability
                    self.cache.invalidate_all();
                    match directory.list_products_with_stock().await {
                        Ok(mut products) => {
                            sort_products(&mut products);
                            self.products = products;
                        }
                        Err(error) => {
                            tracing::warn!(
                                error = %error,
                                "product universe refresh after removal failed"
                            );
                        }
                    }
                }
                let _ = self.submitted_sender.try_send(SubmittedNotice);
                Ok(())
            }
            Err(error) => {
                if !error.is_local() {
                    tracing::warn!(error = %error, "transaction submission rejected");
                }
                Err(error)
            }
        }
    }
}

fn sort_products(products: &mut [String]) {
    products.sort_by_key(|name| name.to_lowercase());
}
