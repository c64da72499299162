//! Workload observation: walking cached plans for indexable accesses.
//!
//! The inspector performs a breadth-first walk over a plan tree and emits
//! one `AccessRecord` per scan predicate that resolves to a stored-table
//! column. Logical plans are the preferred shape; physical plans work as a
//! fallback unless they carry an MVCC validate gate, in which case the
//! whole plan is rejected as unanalyzable.

use std::collections::VecDeque;
use std::sync::Arc;

use strata_common::error::{StrataResult, TuningError};
use strata_plan::cache::PlanHandle;
use strata_plan::logical::{LogicalNode, PredicateOperand};
use strata_plan::physical::PhysicalNode;

use crate::access::AccessRecord;
use crate::column_ref::ColumnRef;

pub struct PlanInspector;

impl PlanInspector {
    /// Walk `plan` and append records to `out`, weighting each by
    /// `query_frequency`. Unanalyzable plans return an error and
    /// contribute nothing.
    pub fn inspect(
        plan: &PlanHandle,
        query_frequency: u64,
        out: &mut Vec<AccessRecord>,
    ) -> StrataResult<()> {
        match plan {
            PlanHandle::Logical(root) => {
                Self::inspect_logical(root, query_frequency, out);
                Ok(())
            }
            PlanHandle::Physical(root) => Self::inspect_physical(root, query_frequency, out),
        }
    }

    /// Logical mode. A predicate node is a scan that an index could speed
    /// up; its column reference is followed to the node producing it, and a
    /// record is emitted only when that origin is a stored table. Joins are
    /// traversed but emit nothing.
    pub fn inspect_logical(
        root: &Arc<LogicalNode>,
        query_frequency: u64,
        out: &mut Vec<AccessRecord>,
    ) {
        let mut queue: VecDeque<&Arc<LogicalNode>> = VecDeque::new();
        queue.push_back(root);
        while let Some(node) = queue.pop_front() {
            for input in node.inputs() {
                queue.push_back(input);
            }
            if let LogicalNode::Predicate {
                column,
                condition,
                operand,
                ..
            } = node.as_ref()
            {
                let Some((table_name, column_id)) = column.resolve_stored() else {
                    // Derived columns (join outputs, expressions) are not
                    // index sites.
                    continue;
                };
                let PredicateOperand::Literal(value) = operand else {
                    // Parameters and column comparands carry no
                    // selectivity information.
                    continue;
                };
                out.push(AccessRecord::new(
                    ColumnRef::single(table_name, column_id),
                    *condition,
                    value.clone(),
                    query_frequency,
                ));
            }
        }
    }

    /// Physical mode. A table scan whose immediate input is a get-table
    /// node yields a record. A validate gate in that position means the
    /// plan ran under MVCC and column provenance cannot be trusted; the
    /// plan is rejected so callers can fall back to logical plans.
    pub fn inspect_physical(
        root: &Arc<PhysicalNode>,
        query_frequency: u64,
        out: &mut Vec<AccessRecord>,
    ) -> StrataResult<()> {
        let mut records = Vec::new();
        let mut queue: VecDeque<&Arc<PhysicalNode>> = VecDeque::new();
        queue.push_back(root);
        while let Some(node) = queue.pop_front() {
            for input in node.inputs() {
                queue.push_back(input);
            }
            if let PhysicalNode::TableScan {
                input,
                column_id,
                condition,
                operand,
            } = node.as_ref()
            {
                match input.as_ref() {
                    PhysicalNode::Validate { .. } => {
                        return Err(TuningError::UnsupportedPlan(
                            "table scan over an MVCC validate gate; re-run without MVCC \
                             or supply logical plans"
                                .into(),
                        )
                        .into());
                    }
                    PhysicalNode::GetTable { table_name } => {
                        if let PredicateOperand::Literal(value) = operand {
                            records.push(AccessRecord::new(
                                ColumnRef::single(table_name.clone(), *column_id),
                                *condition,
                                value.clone(),
                                query_frequency,
                            ));
                        }
                    }
                    _ => {}
                }
            }
        }
        out.append(&mut records);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_common::datum::Datum;
    use strata_common::types::{ColumnId, PredicateCondition};
    use strata_plan::logical::LogicalColumn;

    #[test]
    fn test_logical_predicate_over_stored_table() {
        let table = LogicalNode::stored_table("t");
        let plan = LogicalNode::predicate(
            table.clone(),
            LogicalColumn::new(table, ColumnId(0)),
            PredicateCondition::Equals,
            PredicateOperand::Literal(Datum::Int32(4)),
        );
        let mut out = Vec::new();
        PlanInspector::inspect_logical(&plan, 3, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].column_ref, ColumnRef::single("t", ColumnId(0)));
        assert_eq!(out[0].condition, PredicateCondition::Equals);
        assert_eq!(out[0].query_frequency, 3);
    }

    #[test]
    fn test_logical_predicate_through_projection() {
        // The predicate sits above a projection but its column reference
        // still points at the stored table, so it resolves.
        let table = LogicalNode::stored_table("t");
        let proj = LogicalNode::projection(table.clone());
        let plan = LogicalNode::limit(LogicalNode::predicate(
            proj,
            LogicalColumn::new(table, ColumnId(1)),
            PredicateCondition::LessThan,
            PredicateOperand::Literal(Datum::Int32(10)),
        ));
        let mut out = Vec::new();
        PlanInspector::inspect_logical(&plan, 1, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].column_ref.column_ids, vec![ColumnId(1)]);
    }

    #[test]
    fn test_logical_join_traversed_without_records() {
        let left = LogicalNode::stored_table("l");
        let right = LogicalNode::stored_table("r");
        let pred = LogicalNode::predicate(
            left.clone(),
            LogicalColumn::new(left.clone(), ColumnId(0)),
            PredicateCondition::Equals,
            PredicateOperand::Literal(Datum::Int32(1)),
        );
        let plan = LogicalNode::join(pred, right);
        let mut out = Vec::new();
        PlanInspector::inspect_logical(&plan, 2, &mut out);
        // Only the predicate below the join emits; the join itself does not.
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].column_ref.table_name, "l");
    }

    #[test]
    fn test_logical_placeholder_operand_ignored() {
        let table = LogicalNode::stored_table("t");
        let plan = LogicalNode::predicate(
            table.clone(),
            LogicalColumn::new(table, ColumnId(0)),
            PredicateCondition::Equals,
            PredicateOperand::Placeholder(0),
        );
        let mut out = Vec::new();
        PlanInspector::inspect_logical(&plan, 1, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_logical_unresolved_column_ignored() {
        let table = LogicalNode::stored_table("t");
        let proj = LogicalNode::projection(table.clone());
        // Column originates at the projection, not the stored table.
        let plan = LogicalNode::predicate(
            table,
            LogicalColumn::new(proj, ColumnId(0)),
            PredicateCondition::Equals,
            PredicateOperand::Literal(Datum::Int32(1)),
        );
        let mut out = Vec::new();
        PlanInspector::inspect_logical(&plan, 1, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_physical_scan_over_get_table() {
        let plan = PhysicalNode::table_scan(
            PhysicalNode::get_table("t"),
            ColumnId(2),
            PredicateCondition::GreaterThan,
            PredicateOperand::Literal(Datum::Int32(7)),
        );
        let mut out = Vec::new();
        PlanInspector::inspect_physical(&plan, 5, &mut out).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].column_ref, ColumnRef::single("t", ColumnId(2)));
        assert_eq!(out[0].query_frequency, 5);
    }

    #[test]
    fn test_physical_validate_gate_rejects_plan() {
        let plan = PhysicalNode::table_scan(
            PhysicalNode::validate(PhysicalNode::get_table("t")),
            ColumnId(0),
            PredicateCondition::Equals,
            PredicateOperand::Literal(Datum::Int32(1)),
        );
        let mut out = Vec::new();
        let err = PlanInspector::inspect_physical(&plan, 1, &mut out).unwrap_err();
        assert!(err.to_string().contains("Unsupported plan shape"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_physical_rejection_emits_no_partial_records() {
        // An analyzable scan deeper in the same plan must not leak records
        // when another scan hits the validate gate.
        let inner = PhysicalNode::table_scan(
            PhysicalNode::get_table("a"),
            ColumnId(0),
            PredicateCondition::Equals,
            PredicateOperand::Literal(Datum::Int32(1)),
        );
        let plan = PhysicalNode::table_scan(
            PhysicalNode::validate(inner),
            ColumnId(1),
            PredicateCondition::Equals,
            PredicateOperand::Literal(Datum::Int32(2)),
        );
        let mut out = Vec::new();
        assert!(PlanInspector::inspect_physical(&plan, 1, &mut out).is_err());
        assert!(out.is_empty());
    }
}
