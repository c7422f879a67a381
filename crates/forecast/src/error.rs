use thiserror::Error;

use stockwatch_core::CompanyId;

/// Failure reading from the storage collaborator.
///
/// The forecaster never retries; retry policy belongs to the storage layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("data source unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("malformed row: {0}")]
    Decode(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ForecastError {
    /// The company id does not resolve; no alerts can be computed for it.
    #[error("company {0} not found")]
    CompanyNotFound(CompanyId),

    #[error(transparent)]
    DataSource(#[from] RepositoryError),
}
