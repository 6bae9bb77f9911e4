mod adapters;
mod cache;
mod error;
mod focus;
mod pipeline;
mod session;
pub mod test_support;

pub use adapters::{LoanLine, LoanRequest, StockDirectory, StockLine, TransactionGateway};
pub use cache::{LotAvailabilityCache, ReloadTicket};
pub use error::{CoreError, SubmitError};
pub use focus::{Column, FocusRegistry, FocusTarget};
pub use pipeline::{SubmissionPipeline, SubmitState};
pub use session::{EntrySession, SubmittedNotice};
