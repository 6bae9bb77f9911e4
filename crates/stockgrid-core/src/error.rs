use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),
    #[error("{0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("need at least one row")]
    NoRows,
    #[error("{0}")]
    Incomplete(String),
    #[error("{0}")]
    HeaderIncomplete(String),
    #[error("quantity exceeds stock: {product} {expiry_date} (available {available})")]
    Unavailable {
        product: String,
        expiry_date: String,
        available: u32,
    },
    #[error("a submission is already in flight")]
    AlreadySubmitting,
    #[error(transparent)]
    Gateway(#[from] CoreError),
}

impl SubmitError {
    /// Local failures are detected before any collaborator call; gateway
    /// failures come back from the collaborator itself. Both preserve the
    /// editor state untouched.
    pub fn is_local(&self) -> bool {
        !matches!(self, Self::Gateway(_))
    }
}
