//! Errors raised at the engine's operation boundaries.
//!
//! - [`QueryError`]: a read failed; the caller keeps its prior state.
//! - [`WriteError`]: a mutation was rejected; drafts stay put for correction.
//! - [`CascadeError`]: a dependent-field lookup failed; the prior valid set stays.
//! - [`ExportError`]: export precondition violated or rendering failed.
//! - [`FilterError`]: a filter edit would break a criteria invariant.
//!
//! All of them are `Clone` so view state can keep the last failure around for
//! display.
use chrono::NaiveDate;
use thiserror::Error;

use crate::TransactionType;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("ledger service unreachable: {0}")]
    Transport(String),
    #[error("\"{0}\" not found")]
    NotFound(String),
    #[error("ledger service error: {0}")]
    Server(String),
    #[error("inconsistent response: {0}")]
    Inconsistent(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WriteError {
    #[error("invalid transaction: {0}")]
    Validation(String),
    #[error("\"{0}\" not found")]
    NotFound(String),
    #[error("nothing to confirm")]
    NothingPending,
    #[error(transparent)]
    Query(#[from] QueryError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CascadeError {
    #[error("failed to load categories: {0}")]
    Lookup(#[from] QueryError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    #[error("report not ready: {0}")]
    NotReady(String),
    #[error("report is inconsistent: {0}")]
    Inconsistent(String),
    #[error("failed to render document: {0}")]
    Render(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("select a transaction type before choosing a category")]
    CategoryWithoutType,
    #[error("category \"{category}\" does not apply to {kind} transactions")]
    CategoryTypeMismatch {
        category: String,
        kind: TransactionType,
    },
    #[error("categories for the selected type are not available yet")]
    CategoriesUnavailable,
    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}
