use strata_common::datum::Datum;
use strata_common::types::PredicateCondition;

use crate::column_ref::ColumnRef;

/// One plan node where an index could be used: a scan predicate over a
/// stored-table column, weighted by how often the query ran.
///
/// Records are accumulated per evaluation round and discarded afterwards.
#[derive(Debug, Clone)]
pub struct AccessRecord {
    pub column_ref: ColumnRef,
    pub condition: PredicateCondition,
    pub compare_value: Datum,
    pub query_frequency: u64,
}

impl AccessRecord {
    pub fn new(
        column_ref: ColumnRef,
        condition: PredicateCondition,
        compare_value: Datum,
        query_frequency: u64,
    ) -> Self {
        Self {
            column_ref,
            condition,
            compare_value,
            query_frequency,
        }
    }
}
