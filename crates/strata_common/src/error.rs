use thiserror::Error;

use crate::types::ColumnId;

/// Convenience alias for `Result<T, StrataError>`.
pub type StrataResult<T> = Result<T, StrataError>;

/// Top-level error type that all crate-specific errors convert into.
#[derive(Error, Debug)]
pub enum StrataError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Tuning error: {0}")]
    Tuning(#[from] TuningError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Catalog / storage surface errors. These cover the stale-catalog window
/// between observation and application: a table or index named by a tuning
/// operation may have disappeared by the time the operation is applied.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Column {column} not found in table {table}")]
    ColumnNotFound { table: String, column: ColumnId },

    #[error("No matching index on table {table} for columns {columns:?}")]
    IndexNotFound { table: String, columns: Vec<ColumnId> },

    #[error("Index already exists on table {table} for columns {columns:?}")]
    IndexAlreadyExists { table: String, columns: Vec<ColumnId> },

    #[error("Index build failed on table {table}: {reason}")]
    BuildFailed { table: String, reason: String },
}

/// Tuning-round errors. None of these are fatal to the host process: the
/// driver reports and carries on (or retries next round).
#[derive(Error, Debug)]
pub enum TuningError {
    /// Plan shape the inspector cannot analyze, e.g. a physical plan with
    /// an MVCC validate gate between scan and table. The offending plan is
    /// dropped and the round continues.
    #[error("Unsupported plan shape: {0}")]
    UnsupportedPlan(String),

    /// The plan cache does not expose a priority-ordered iteration. The
    /// round aborts; the next round retries.
    #[error("Unsupported plan cache: {0}")]
    UnsupportedCache(String),

    #[error("Tuning round exceeded its deadline during {phase}")]
    RoundTimeout { phase: &'static str },

    #[error("Tuning round cancelled")]
    Cancelled,
}

impl StrataError {
    /// True when the error only affects the current round and the tuner
    /// should simply run again on the next tick.
    pub fn is_round_local(&self) -> bool {
        match self {
            StrataError::Tuning(_) => true,
            StrataError::Catalog(_) => true,
            StrataError::Internal(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_conversions() {
        let e: StrataError = CatalogError::TableNotFound("t".into()).into();
        assert!(matches!(e, StrataError::Catalog(_)));
        let e: StrataError = TuningError::Cancelled.into();
        assert!(matches!(e, StrataError::Tuning(TuningError::Cancelled)));
    }

    #[test]
    fn test_round_local_classification() {
        assert!(StrataError::from(TuningError::RoundTimeout { phase: "apply" }).is_round_local());
        assert!(StrataError::from(CatalogError::TableNotFound("t".into())).is_round_local());
        assert!(!StrataError::Internal("bug".into()).is_round_local());
    }

    #[test]
    fn test_display_carries_context() {
        let e = StrataError::from(CatalogError::ColumnNotFound {
            table: "orders".into(),
            column: ColumnId(3),
        });
        let s = e.to_string();
        assert!(s.contains("orders"));
        assert!(s.contains('3'));
    }
}
