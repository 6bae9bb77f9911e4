use stockgrid_domain::{LineItem, LineItemCollection, LoanHeader, RowPolicy};

use crate::adapters::{LoanLine, LoanRequest, StockLine, TransactionGateway};
use crate::cache::LotAvailabilityCache;
use crate::error::SubmitError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitState {
    Idle,
    Submitting,
}

#[derive(Debug)]
pub struct SubmissionPipeline {
    state: SubmitState,
}

enum SubmitRequest {
    Intake(Vec<StockLine>),
    Removal(Vec<StockLine>),
    Loan(LoanRequest),
}

impl SubmissionPipeline {
    pub fn new() -> Self {
        Self {
            state: SubmitState::Idle,
        }
    }

    pub fn state(&self) -> SubmitState {
        self.state
    }

    pub fn is_submitting(&self) -> bool {
        self.state == SubmitState::Submitting
    }

    /// Split-phase gate for hosts that dispatch the gateway future
    /// themselves; `submit` uses the same gate internally.
    pub fn begin_submit(&mut self) -> Result<(), SubmitError> {
        if self.is_submitting() {
            return Err(SubmitError::AlreadySubmitting);
        }
        self.state = SubmitState::Submitting;
        Ok(())
    }

    pub fn finish_submit(&mut self) {
        self.state = SubmitState::Idle;
    }

    pub async fn submit(
        &mut self,
        collection: &mut LineItemCollection,
        policy: RowPolicy,
        cache: &LotAvailabilityCache,
        gateway: &dyn TransactionGateway,
        header: Option<&LoanHeader>,
    ) -> Result<(), SubmitError> {
        if self.is_submitting() {
            return Err(SubmitError::AlreadySubmitting);
        }

        let request = validate(collection, policy, cache, header)?;

        self.state = SubmitState::Submitting;
        let outcome = match request {
            SubmitRequest::Intake(lines) => gateway.submit_intake(lines).await,
            SubmitRequest::Removal(lines) => gateway.submit_removal(lines).await,
            SubmitRequest::Loan(request) => gateway.submit_loan(request).await,
        };
        self.state = SubmitState::Idle;

        match outcome {
            Ok(()) => {
                collection.reset();
                Ok(())
            }
            // surfaced verbatim; rows stay put so the user can correct and retry
            Err(error) => Err(SubmitError::Gateway(error)),
        }
    }
}

impl Default for SubmissionPipeline {
    fn default() -> Self {
        Self::new()
    }
}

fn validate(
    collection: &LineItemCollection,
    policy: RowPolicy,
    cache: &LotAvailabilityCache,
    header: Option<&LoanHeader>,
) -> Result<SubmitRequest, SubmitError> {
    let loan_header = match policy {
        RowPolicy::Loan { .. } => {
            let header = header.ok_or_else(|| {
                SubmitError::HeaderIncomplete("loan header is required".to_owned())
            })?;
            header
                .validate()
                .map_err(|message| SubmitError::HeaderIncomplete(message.to_owned()))?;
            let mut header = header.clone();
            header.counterparty = header.counterparty.trim().to_owned();
            Some(header)
        }
        _ => None,
    };

    let rows = collection.non_ghost_rows();
    if rows.is_empty() {
        return Err(SubmitError::NoRows);
    }
    if rows.iter().any(|row| !policy.is_complete(row)) {
        return Err(SubmitError::Incomplete(policy.describe_error(rows)));
    }

    if policy.is_removal() {
        // last defense against staleness between the most recent reload and
        // the submit action
        for row in rows {
            let (Some(expiry_date), Some(quantity)) = (row.expiry_date.as_deref(), row.quantity)
            else {
                continue;
            };
            let available = cache.available_quantity_for(&row.product, expiry_date);
            if quantity < 1 || quantity > i64::from(available) {
                return Err(SubmitError::Unavailable {
                    product: row.product.clone(),
                    expiry_date: expiry_date.to_owned(),
                    available,
                });
            }
        }
    }

    Ok(match (policy, loan_header) {
        (RowPolicy::Loan { adjust_stock }, Some(header)) => SubmitRequest::Loan(LoanRequest {
            header,
            lines: loan_lines(rows, adjust_stock),
        }),
        (RowPolicy::Loan { .. }, None) => {
            return Err(SubmitError::HeaderIncomplete(
                "loan header is required".to_owned(),
            ));
        }
        (RowPolicy::Removal, _) => SubmitRequest::Removal(stock_lines(rows)),
        (RowPolicy::Intake, _) => SubmitRequest::Intake(stock_lines(rows)),
    })
}

fn stock_lines(rows: &[LineItem]) -> Vec<StockLine> {
    rows.iter()
        .map(|row| StockLine {
            product: row.product.clone(),
            expiry_date: row.expiry_date.clone().unwrap_or_default(),
            quantity: row.quantity.unwrap_or_default(),
        })
        .collect()
}

fn loan_lines(rows: &[LineItem], adjust_stock: bool) -> Vec<LoanLine> {
    rows.iter()
        .map(|row| LoanLine {
            product: row.product.clone(),
            quantity: row.quantity.unwrap_or_default(),
            expiry_date: if adjust_stock {
                row.expiry_date.clone()
            } else {
                None
            },
        })
        .collect()
}
