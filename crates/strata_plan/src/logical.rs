//! Logical plan representation.
//!
//! A `LogicalNode` tree is what the optimizer caches for a query. The tuner
//! walks it looking for predicate nodes whose column reference resolves to a
//! stored table; everything else is traversed transparently.

use std::sync::Arc;

use strata_common::datum::Datum;
use strata_common::types::{ColumnId, PredicateCondition};

/// Right-hand side of a scan predicate. Only literals are analyzable for
/// tuning; placeholders and column comparands carry no selectivity
/// information and are ignored by the inspector.
#[derive(Debug, Clone)]
pub enum PredicateOperand {
    Literal(Datum),
    /// Prepared-statement parameter, value unknown at cache time.
    Placeholder(u16),
    /// Column-to-column comparison.
    Column(ColumnId),
}

/// A column reference inside a plan, pointing back at the node that
/// produces the column. For predicates over base data this is a
/// `StoredTable` node together with the column's original id in that table.
#[derive(Debug, Clone)]
pub struct LogicalColumn {
    pub origin: Arc<LogicalNode>,
    pub column_id: ColumnId,
}

impl LogicalColumn {
    pub fn new(origin: Arc<LogicalNode>, column_id: ColumnId) -> Self {
        Self { origin, column_id }
    }

    /// Resolve to `(table_name, column_id)` when the origin is a stored
    /// table. Columns produced by joins, projections over expressions etc.
    /// resolve to `None`.
    pub fn resolve_stored(&self) -> Option<(&str, ColumnId)> {
        match self.origin.as_ref() {
            LogicalNode::StoredTable { table_name } => {
                Some((table_name.as_str(), self.column_id))
            }
            _ => None,
        }
    }
}

/// A logical relational operator tree. Only the node kinds the tuner cares
/// about carry payloads; the rest exist so realistic cached plans can be
/// traversed through.
#[derive(Debug, Clone)]
pub enum LogicalNode {
    /// Leaf: a base table reference.
    StoredTable { table_name: String },

    /// Selection over one column.
    Predicate {
        input: Arc<LogicalNode>,
        column: LogicalColumn,
        condition: PredicateCondition,
        operand: PredicateOperand,
        /// Upper bound for `Between`; unused otherwise.
        operand_upper: Option<PredicateOperand>,
    },

    /// Binary join. Traversed but never a candidate source.
    Join {
        left: Arc<LogicalNode>,
        right: Arc<LogicalNode>,
    },

    /// Transparent unary operators.
    Projection { input: Arc<LogicalNode> },
    Sort { input: Arc<LogicalNode> },
    Limit { input: Arc<LogicalNode> },
}

impl LogicalNode {
    pub fn stored_table(table_name: impl Into<String>) -> Arc<Self> {
        Arc::new(LogicalNode::StoredTable {
            table_name: table_name.into(),
        })
    }

    pub fn predicate(
        input: Arc<Self>,
        column: LogicalColumn,
        condition: PredicateCondition,
        operand: PredicateOperand,
    ) -> Arc<Self> {
        Arc::new(LogicalNode::Predicate {
            input,
            column,
            condition,
            operand,
            operand_upper: None,
        })
    }

    pub fn between(
        input: Arc<Self>,
        column: LogicalColumn,
        lower: PredicateOperand,
        upper: PredicateOperand,
    ) -> Arc<Self> {
        Arc::new(LogicalNode::Predicate {
            input,
            column,
            condition: PredicateCondition::Between,
            operand: lower,
            operand_upper: Some(upper),
        })
    }

    pub fn join(left: Arc<Self>, right: Arc<Self>) -> Arc<Self> {
        Arc::new(LogicalNode::Join { left, right })
    }

    pub fn projection(input: Arc<Self>) -> Arc<Self> {
        Arc::new(LogicalNode::Projection { input })
    }

    pub fn sort(input: Arc<Self>) -> Arc<Self> {
        Arc::new(LogicalNode::Sort { input })
    }

    pub fn limit(input: Arc<Self>) -> Arc<Self> {
        Arc::new(LogicalNode::Limit { input })
    }

    /// Child nodes for traversal.
    pub fn inputs(&self) -> Vec<&Arc<LogicalNode>> {
        match self {
            LogicalNode::StoredTable { .. } => vec![],
            LogicalNode::Predicate { input, .. }
            | LogicalNode::Projection { input }
            | LogicalNode::Sort { input }
            | LogicalNode::Limit { input } => vec![input],
            LogicalNode::Join { left, right } => vec![left, right],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_stored_column() {
        let table = LogicalNode::stored_table("orders");
        let col = LogicalColumn::new(table.clone(), ColumnId(2));
        assert_eq!(col.resolve_stored(), Some(("orders", ColumnId(2))));
    }

    #[test]
    fn test_resolve_non_stored_origin() {
        let table = LogicalNode::stored_table("orders");
        let proj = LogicalNode::projection(table);
        let col = LogicalColumn::new(proj, ColumnId(0));
        assert!(col.resolve_stored().is_none());
    }

    #[test]
    fn test_inputs_shape() {
        let t1 = LogicalNode::stored_table("a");
        let t2 = LogicalNode::stored_table("b");
        let join = LogicalNode::join(t1.clone(), t2);
        assert_eq!(join.inputs().len(), 2);
        assert!(t1.inputs().is_empty());

        let col = LogicalColumn::new(t1.clone(), ColumnId(0));
        let pred = LogicalNode::predicate(
            t1,
            col,
            PredicateCondition::Equals,
            PredicateOperand::Literal(Datum::Int32(1)),
        );
        assert_eq!(pred.inputs().len(), 1);
    }
}
