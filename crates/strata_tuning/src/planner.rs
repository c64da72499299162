//! Operation ordering.
//!
//! The selector's output mirrors its walk: keeps and rejections surface as
//! NoOps, and creates may precede the drops that pay for them in a later
//! exchange. The planner produces the sequence actually applied: NoOps are
//! filtered, and every drop runs before any create, so the budget holds at
//! each point mid-application, not just at the end.

use crate::operation::TuningOperation;

#[derive(Debug, Default)]
pub struct OperationPlanner;

impl OperationPlanner {
    pub fn new() -> Self {
        Self
    }

    /// Order `operations` for application: drops first, then creates, each
    /// group keeping its selector-emitted relative order.
    pub fn plan(&self, operations: Vec<TuningOperation>) -> Vec<TuningOperation> {
        let mut drops = Vec::new();
        let mut creates = Vec::new();
        for op in operations {
            match op {
                TuningOperation::DropIndex { .. } => drops.push(op),
                TuningOperation::CreateIndex { .. } => creates.push(op),
                TuningOperation::NoOp => {}
            }
        }
        drops.extend(creates);
        drops
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column_ref::ColumnRef;
    use strata_common::types::ColumnId;
    use strata_storage::index::IndexKind;

    fn create(table: &str) -> TuningOperation {
        TuningOperation::CreateIndex {
            column_ref: ColumnRef::single(table, ColumnId(0)),
            kind: IndexKind::GroupKey,
        }
    }

    fn drop_op(table: &str) -> TuningOperation {
        TuningOperation::DropIndex {
            column_ref: ColumnRef::single(table, ColumnId(0)),
            kind: IndexKind::GroupKey,
        }
    }

    #[test]
    fn test_noops_filtered() {
        let planner = OperationPlanner::new();
        let planned = planner.plan(vec![TuningOperation::NoOp, TuningOperation::NoOp]);
        assert!(planned.is_empty());
    }

    #[test]
    fn test_drops_precede_creates() {
        let planner = OperationPlanner::new();
        let planned = planner.plan(vec![
            create("a"),
            TuningOperation::NoOp,
            drop_op("b"),
            create("c"),
            drop_op("d"),
        ]);
        assert_eq!(
            planned,
            vec![drop_op("b"), drop_op("d"), create("a"), create("c")]
        );
    }

    #[test]
    fn test_relative_order_preserved() {
        let planner = OperationPlanner::new();
        let planned = planner.plan(vec![drop_op("x"), drop_op("y"), create("z")]);
        assert_eq!(planned, vec![drop_op("x"), drop_op("y"), create("z")]);
    }
}
