use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a column within a table schema.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct ColumnId(pub u16);

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Column data types known to the tuning layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Boolean,
    Int32,
    Int64,
    Float64,
    Text,
    Timestamp,
    Date,
}

impl DataType {
    /// In-memory width of one value in bytes. `Text` has no fixed width;
    /// callers fall back to the column's measured average width.
    pub fn fixed_width_bytes(&self) -> Option<u32> {
        match self {
            DataType::Boolean => Some(1),
            DataType::Int32 | DataType::Date => Some(4),
            DataType::Int64 | DataType::Float64 | DataType::Timestamp => Some(8),
            DataType::Text => None,
        }
    }
}

/// Comparison condition of a scan predicate, as observed in cached plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredicateCondition {
    Equals,
    NotEquals,
    LessThan,
    LessThanEquals,
    GreaterThan,
    GreaterThanEquals,
    Between,
    Like,
    In,
}

impl PredicateCondition {
    /// Conditions answered by a point lookup.
    pub fn is_equality(&self) -> bool {
        matches!(self, PredicateCondition::Equals)
    }

    /// Conditions answered by an ordered range scan.
    pub fn is_range(&self) -> bool {
        matches!(
            self,
            PredicateCondition::LessThan
                | PredicateCondition::LessThanEquals
                | PredicateCondition::GreaterThan
                | PredicateCondition::GreaterThanEquals
                | PredicateCondition::Between
        )
    }
}

impl fmt::Display for PredicateCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
