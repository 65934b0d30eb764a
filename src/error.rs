use thiserror::Error;

/// Errors surfaced by the builder, the filter chain and the DAO
#[derive(Debug, Error)]
pub enum DaoError {
    /// A fluent filter method was called out of sequence
    #[error("filter chain out of order: {0}")]
    ChainOrder(String),

    /// An insert batch was empty, or its records disagree on columns
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Whatever the executor reported, untouched
    #[error(transparent)]
    Execution(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, DaoError>;

impl DaoError {
    pub(crate) fn chain_order(message: impl Into<String>) -> Self {
        DaoError::ChainOrder(message.into())
    }

    pub(crate) fn schema_mismatch(message: impl Into<String>) -> Self {
        DaoError::SchemaMismatch(message.into())
    }
}
