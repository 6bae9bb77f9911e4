use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use stockgrid_domain::Lot;

use crate::adapters::{LoanRequest, StockDirectory, StockLine, TransactionGateway};
use crate::error::CoreError;

/// Scriptable collaborator double implementing both boundary traits.
/// Records every call so tests can assert what reached the record store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    lots: Mutex<HashMap<String, Vec<Lot>>>,
    all_products: Mutex<Vec<String>>,
    list_lots_calls: Mutex<Vec<String>>,
    directory_list_calls: Mutex<u64>,
    intake_batches: Mutex<Vec<Vec<StockLine>>>,
    removal_batches: Mutex<Vec<Vec<StockLine>>>,
    loan_requests: Mutex<Vec<LoanRequest>>,
    next_submit_failure: Mutex<Option<String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_lots(&self, product: &str, lots: Vec<Lot>) {
        self.lots
            .lock()
            .expect("lots lock")
            .insert(product.to_owned(), lots);
    }

    pub fn clear_lots(&self, product: &str) {
        self.lots
            .lock()
            .expect("lots lock")
            .insert(product.to_owned(), Vec::new());
    }

    pub fn set_all_products(&self, products: &[&str]) {
        *self.all_products.lock().expect("products lock") =
            products.iter().map(|name| (*name).to_owned()).collect();
    }

    pub fn fail_next_submit(&self, message: &str) {
        *self.next_submit_failure.lock().expect("failure lock") = Some(message.to_owned());
    }

    pub fn list_lots_calls(&self) -> Vec<String> {
        self.list_lots_calls.lock().expect("calls lock").clone()
    }

    pub fn directory_list_calls(&self) -> u64 {
        *self.directory_list_calls.lock().expect("calls lock")
    }

    pub fn intake_batches(&self) -> Vec<Vec<StockLine>> {
        self.intake_batches.lock().expect("intake lock").clone()
    }

    pub fn removal_batches(&self) -> Vec<Vec<StockLine>> {
        self.removal_batches.lock().expect("removal lock").clone()
    }

    pub fn loan_requests(&self) -> Vec<LoanRequest> {
        self.loan_requests.lock().expect("loan lock").clone()
    }

    pub fn submission_count(&self) -> usize {
        self.intake_batches().len() + self.removal_batches().len() + self.loan_requests().len()
    }

    fn take_failure(&self) -> Option<CoreError> {
        self.next_submit_failure
            .lock()
            .expect("failure lock")
            .take()
            .map(CoreError::Rejected)
    }
}

#[async_trait]
impl StockDirectory for InMemoryStore {
    async fn list_lots(&self, product: &str) -> Result<Vec<Lot>, CoreError> {
        self.list_lots_calls
            .lock()
            .expect("calls lock")
            .push(product.to_owned());
        Ok(self
            .lots
            .lock()
            .expect("lots lock")
            .get(product)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_products_with_stock(&self) -> Result<Vec<String>, CoreError> {
        *self.directory_list_calls.lock().expect("calls lock") += 1;
        let lots = self.lots.lock().expect("lots lock");
        Ok(lots
            .iter()
            .filter(|(_, lots)| lots.iter().any(|lot| lot.available_quantity > 0))
            .map(|(product, _)| product.clone())
            .collect())
    }

    async fn list_all_products(&self) -> Result<Vec<String>, CoreError> {
        *self.directory_list_calls.lock().expect("calls lock") += 1;
        Ok(self.all_products.lock().expect("products lock").clone())
    }
}

#[async_trait]
impl TransactionGateway for InMemoryStore {
    async fn submit_intake(&self, lines: Vec<StockLine>) -> Result<(), CoreError> {
        if let Some(failure) = self.take_failure() {
            return Err(failure);
        }
        self.intake_batches.lock().expect("intake lock").push(lines);
        Ok(())
    }

    async fn submit_removal(&self, lines: Vec<StockLine>) -> Result<(), CoreError> {
        if let Some(failure) = self.take_failure() {
            return Err(failure);
        }
        self.removal_batches
            .lock()
            .expect("removal lock")
            .push(lines);
        Ok(())
    }

    async fn submit_loan(&self, request: LoanRequest) -> Result<(), CoreError> {
        if let Some(failure) = self.take_failure() {
            return Err(failure);
        }
        self.loan_requests.lock().expect("loan lock").push(request);
        Ok(())
    }
}
