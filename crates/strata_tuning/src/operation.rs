use std::fmt;

use strata_storage::index::IndexKind;

use crate::column_ref::ColumnRef;

/// An idempotent description of a single storage-layer mutation. Consumed
/// exactly once by the driver; re-applying an operation to a system already
/// in the target state changes nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuningOperation {
    CreateIndex { column_ref: ColumnRef, kind: IndexKind },
    DropIndex { column_ref: ColumnRef, kind: IndexKind },
    NoOp,
}

impl TuningOperation {
    pub fn is_noop(&self) -> bool {
        matches!(self, TuningOperation::NoOp)
    }

    pub fn is_create(&self) -> bool {
        matches!(self, TuningOperation::CreateIndex { .. })
    }

    pub fn is_drop(&self) -> bool {
        matches!(self, TuningOperation::DropIndex { .. })
    }
}

impl fmt::Display for TuningOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuningOperation::CreateIndex { column_ref, kind } => {
                write!(f, "Create[{} on {}]", kind, column_ref)
            }
            TuningOperation::DropIndex { column_ref, kind } => {
                write!(f, "Drop[{} on {}]", kind, column_ref)
            }
            TuningOperation::NoOp => write!(f, "NoOp"),
        }
    }
}

/// What happened when the driver applied one operation. A `Failed` or
/// `Skipped` operation never aborts the remainder of the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationOutcome {
    /// The storage layer performed the mutation.
    Applied,
    /// The catalog moved underneath the round (table, column or index is
    /// gone or already present); nothing to do.
    Skipped,
    /// The storage layer reported an error.
    Failed,
}

impl fmt::Display for OperationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationOutcome::Applied => write!(f, "applied"),
            OperationOutcome::Skipped => write!(f, "skipped"),
            OperationOutcome::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_common::types::ColumnId;

    #[test]
    fn test_kind_predicates() {
        let create = TuningOperation::CreateIndex {
            column_ref: ColumnRef::single("t", ColumnId(0)),
            kind: IndexKind::GroupKey,
        };
        assert!(create.is_create() && !create.is_drop() && !create.is_noop());
        assert!(TuningOperation::NoOp.is_noop());
    }

    #[test]
    fn test_display() {
        let drop = TuningOperation::DropIndex {
            column_ref: ColumnRef::single("t", ColumnId(2)),
            kind: IndexKind::AdaptiveRadix,
        };
        assert_eq!(drop.to_string(), "Drop[adaptive_radix on t.(2)]");
    }
}
