//! Repository Module
//!
//! CRUD and aggregation queries over the SQLite schema. Repositories are
//! free async functions taking `&SqlitePool` (or a transaction handle);
//! cross-entity workflows that need atomicity live in `services`.

pub mod advance;
pub mod cash_balance;
pub mod category;
pub mod employee;
pub mod entry;
pub mod receipt;
pub mod shift_report;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepoError::Duplicate(db.message().to_string())
            }
            _ => RepoError::Database(err.to_string()),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Validate a monetary amount (minor units) is strictly positive.
pub(crate) fn validate_positive_amount(amount: i64, field_name: &str) -> RepoResult<()> {
    if amount <= 0 {
        return Err(RepoError::Validation(format!(
            "{field_name} must be positive: {amount}"
        )));
    }
    Ok(())
}
