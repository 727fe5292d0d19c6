//! Error types for placeholder resolution.
//!
//! Every error is raised synchronously at the point of leaf resolution and
//! carries the offending placeholder or expression text. None are recovered
//! internally: any error aborts the run and leaves the dataset partially
//! mutated. Callers should treat a failure as "fix the seed configuration and
//! rerun", not as something to retry.

use thiserror::Error;

/// Errors that can occur while resolving placeholders in a dataset.
#[derive(Error, Debug)]
pub enum SeedError {
    /// A placeholder referenced a table name absent from the dataset.
    #[error("{0}: table not found. (seedkit)")]
    TableNotFound(String),

    /// A placeholder required a row from a table or reduced view with no rows.
    #[error("{0}: table has no records. (seedkit)")]
    EmptyTable(String),

    /// The mode segment of a placeholder was not `random`, `next` or `curr`.
    #[error("{0}: invalid sampling mode. (seedkit)")]
    InvalidMode(String),

    /// A `curr` reference ran before any `next` for the same table within the
    /// current record.
    #[error("{0}: no prior \"next\". (seedkit)")]
    NoPriorNext(String),

    /// The `where` segment named a field missing from the current record.
    #[error("{0}: \"where\" field not on record. (seedkit)")]
    MissingWhereField(String),

    /// An expression failed to parse or evaluate. Carries both the original
    /// error text and the expression source.
    #[error("{expr}: {message} (seedkit)")]
    Expression {
        /// The expression source text, leader stripped.
        expr: String,
        /// The underlying parse or evaluation failure.
        message: String,
    },

    /// Lazy resolution of a `where` base table re-entered a table that is
    /// already being resolved.
    #[error("{0}: circular table reference. (seedkit)")]
    CircularReference(String),

    /// The foreign-key and expression leaders are not disjoint, so a leaf
    /// could match both resolvers.
    #[error("placeholder leaders {0:?} and {1:?} overlap. (seedkit)")]
    LeaderOverlap(String, String),
}

/// Result type for placeholder resolution.
pub type SeedResult<T> = Result<T, SeedError>;
