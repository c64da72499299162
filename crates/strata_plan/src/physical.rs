//! Physical operator tree, the fallback plan shape in the cache.
//!
//! Physical plans are less convenient for tuning than logical plans: column
//! provenance must be read off the scan's immediate input. Plans that ran
//! under MVCC carry a `Validate` gate between scan and table; those cannot
//! be analyzed and are rejected by the inspector.

use std::sync::Arc;

use strata_common::types::{ColumnId, PredicateCondition};

pub use crate::logical::PredicateOperand;

/// A physical operator tree as produced by the translator and cached after
/// execution.
#[derive(Debug, Clone)]
pub enum PhysicalNode {
    /// Leaf: materializes a stored table.
    GetTable { table_name: String },

    /// MVCC visibility filter between a table and its consumers.
    Validate { input: Arc<PhysicalNode> },

    /// Single-column scan.
    TableScan {
        input: Arc<PhysicalNode>,
        column_id: ColumnId,
        condition: PredicateCondition,
        operand: PredicateOperand,
    },

    /// Transparent unary operators.
    Projection { input: Arc<PhysicalNode> },
    Limit { input: Arc<PhysicalNode> },
}

impl PhysicalNode {
    pub fn get_table(table_name: impl Into<String>) -> Arc<Self> {
        Arc::new(PhysicalNode::GetTable {
            table_name: table_name.into(),
        })
    }

    pub fn validate(input: Arc<Self>) -> Arc<Self> {
        Arc::new(PhysicalNode::Validate { input })
    }

    pub fn table_scan(
        input: Arc<Self>,
        column_id: ColumnId,
        condition: PredicateCondition,
        operand: PredicateOperand,
    ) -> Arc<Self> {
        Arc::new(PhysicalNode::TableScan {
            input,
            column_id,
            condition,
            operand,
        })
    }

    pub fn projection(input: Arc<Self>) -> Arc<Self> {
        Arc::new(PhysicalNode::Projection { input })
    }

    pub fn limit(input: Arc<Self>) -> Arc<Self> {
        Arc::new(PhysicalNode::Limit { input })
    }

    /// Child nodes for traversal.
    pub fn inputs(&self) -> Vec<&Arc<PhysicalNode>> {
        match self {
            PhysicalNode::GetTable { .. } => vec![],
            PhysicalNode::Validate { input }
            | PhysicalNode::TableScan { input, .. }
            | PhysicalNode::Projection { input }
            | PhysicalNode::Limit { input } => vec![input],
        }
    }
}
