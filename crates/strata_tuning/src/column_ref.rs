use std::fmt;

use strata_common::types::ColumnId;

/// References a set of columns by table name and their ordered ids in that
/// table. One `ColumnRef` names one (potential or existing) index site.
///
/// Equality and ordering are lexicographic over `(table_name, column_ids)`,
/// which gives every tuning round a stable, deterministic iteration order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColumnRef {
    pub table_name: String,
    pub column_ids: Vec<ColumnId>,
}

impl ColumnRef {
    pub fn single(table_name: impl Into<String>, column_id: ColumnId) -> Self {
        Self {
            table_name: table_name.into(),
            column_ids: vec![column_id],
        }
    }

    pub fn multi(table_name: impl Into<String>, column_ids: Vec<ColumnId>) -> Self {
        Self {
            table_name: table_name.into(),
            column_ids,
        }
    }

    pub fn is_multi_column(&self) -> bool {
        self.column_ids.len() > 1
    }

    /// True when `self` covers a strict prefix of `other` on the same table
    /// (or vice versa). A composite index subsumes lookups on its prefix,
    /// so such pairs are mutually invalidating choices.
    pub fn is_prefix_related(&self, other: &ColumnRef) -> bool {
        if self.table_name != other.table_name || self.column_ids == other.column_ids {
            return false;
        }
        let shorter = self.column_ids.len().min(other.column_ids.len());
        self.column_ids[..shorter] == other.column_ids[..shorter]
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.(", self.table_name)?;
        for (i, id) in self.column_ids.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", id)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality() {
        assert_eq!(
            ColumnRef::single("t", ColumnId(1)),
            ColumnRef::multi("t", vec![ColumnId(1)])
        );
        assert_ne!(
            ColumnRef::single("t", ColumnId(1)),
            ColumnRef::single("t", ColumnId(2))
        );
        assert_ne!(
            ColumnRef::single("t", ColumnId(1)),
            ColumnRef::single("u", ColumnId(1))
        );
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let a = ColumnRef::single("a", ColumnId(9));
        let b = ColumnRef::single("b", ColumnId(0));
        assert!(a < b);

        let short = ColumnRef::single("t", ColumnId(1));
        let long = ColumnRef::multi("t", vec![ColumnId(1), ColumnId(2)]);
        assert!(short < long);
    }

    #[test]
    fn test_prefix_relation() {
        let single = ColumnRef::single("t", ColumnId(1));
        let composite = ColumnRef::multi("t", vec![ColumnId(1), ColumnId(2)]);
        let unrelated = ColumnRef::single("t", ColumnId(2));
        let other_table = ColumnRef::multi("u", vec![ColumnId(1), ColumnId(2)]);

        assert!(single.is_prefix_related(&composite));
        assert!(composite.is_prefix_related(&single));
        assert!(!single.is_prefix_related(&unrelated));
        assert!(!single.is_prefix_related(&other_table));
        assert!(!single.is_prefix_related(&single.clone()));
    }

    #[test]
    fn test_display() {
        let r = ColumnRef::multi("orders", vec![ColumnId(0), ColumnId(3)]);
        assert_eq!(r.to_string(), "orders.(0,3)");
    }
}
