use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stockgrid_domain::{LoanHeader, Lot};

use crate::error::CoreError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLine {
    pub product: String,
    pub expiry_date: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanLine {
    pub product: String,
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRequest {
    pub header: LoanHeader,
    pub lines: Vec<LoanLine>,
}

#[async_trait]
pub trait StockDirectory: Send + Sync {
    async fn list_lots(&self, product: &str) -> Result<Vec<Lot>, CoreError>;
    async fn list_products_with_stock(&self) -> Result<Vec<String>, CoreError>;
    async fn list_all_products(&self) -> Result<Vec<String>, CoreError>;
}

#[async_trait]
pub trait TransactionGateway: Send + Sync {
    async fn submit_intake(&self, lines: Vec<StockLine>) -> Result<(), CoreError>;
    async fn submit_removal(&self, lines: Vec<StockLine>) -> Result<(), CoreError>;
    async fn submit_loan(&self, request: LoanRequest) -> Result<(), CoreError>;
}
