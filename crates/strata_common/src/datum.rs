use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::types::DataType;

/// A single scalar value as it appears in scan predicates.
///
/// This is the subset of the engine's value model that reaches the tuning
/// layer: predicate literals are carried along with access records so that
/// selectivity can be estimated against column min/max bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Datum {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    Text(String),
    /// Microseconds since Unix epoch.
    Timestamp(i64),
    /// Days since Unix epoch (1970-01-01).
    Date(i32),
}

impl Datum {
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Datum::Null => None,
            Datum::Boolean(_) => Some(DataType::Boolean),
            Datum::Int32(_) => Some(DataType::Int32),
            Datum::Int64(_) => Some(DataType::Int64),
            Datum::Float64(_) => Some(DataType::Float64),
            Datum::Text(_) => Some(DataType::Text),
            Datum::Timestamp(_) => Some(DataType::Timestamp),
            Datum::Date(_) => Some(DataType::Date),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    /// Project onto the real line for range interpolation. Text and Null
    /// have no numeric projection.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Datum::Boolean(v) => Some(if *v { 1.0 } else { 0.0 }),
            Datum::Int32(v) => Some(*v as f64),
            Datum::Int64(v) => Some(*v as f64),
            Datum::Float64(v) => Some(*v),
            Datum::Timestamp(v) => Some(*v as f64),
            Datum::Date(v) => Some(*v as f64),
            Datum::Null | Datum::Text(_) => None,
        }
    }

    /// Approximate in-memory width in bytes.
    pub fn width_bytes(&self) -> u32 {
        match self {
            Datum::Null => 0,
            Datum::Boolean(_) => 1,
            Datum::Int32(_) | Datum::Date(_) => 4,
            Datum::Int64(_) | Datum::Float64(_) | Datum::Timestamp(_) => 8,
            Datum::Text(s) => s.len() as u32,
        }
    }
}

/// Compare two datums of the same type. Returns `None` for incomparable
/// pairs (mixed types, Null). Float comparison is bitwise-total via
/// `partial_cmp` falling back to bit equality for NaN.
pub fn datum_cmp(a: &Datum, b: &Datum) -> Option<Ordering> {
    match (a, b) {
        (Datum::Boolean(x), Datum::Boolean(y)) => Some(x.cmp(y)),
        (Datum::Int32(x), Datum::Int32(y)) => Some(x.cmp(y)),
        (Datum::Int64(x), Datum::Int64(y)) => Some(x.cmp(y)),
        (Datum::Float64(x), Datum::Float64(y)) => {
            x.partial_cmp(y).or(Some(x.to_bits().cmp(&y.to_bits())))
        }
        (Datum::Text(x), Datum::Text(y)) => Some(x.cmp(y)),
        (Datum::Timestamp(x), Datum::Timestamp(y)) => Some(x.cmp(y)),
        (Datum::Date(x), Datum::Date(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Same-type equality; NaN == NaN (bitwise), Null == Null.
pub fn datum_eq(a: &Datum, b: &Datum) -> bool {
    match (a, b) {
        (Datum::Null, Datum::Null) => true,
        (Datum::Float64(x), Datum::Float64(y)) => x.to_bits() == y.to_bits(),
        _ => datum_cmp(a, b) == Some(Ordering::Equal),
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Null => write!(f, "NULL"),
            Datum::Boolean(v) => write!(f, "{}", v),
            Datum::Int32(v) => write!(f, "{}", v),
            Datum::Int64(v) => write!(f, "{}", v),
            Datum::Float64(v) => write!(f, "{}", v),
            Datum::Text(v) => write!(f, "'{}'", v),
            Datum::Timestamp(v) => write!(f, "ts:{}", v),
            Datum::Date(v) => write!(f, "date:{}", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmp_same_type() {
        assert_eq!(
            datum_cmp(&Datum::Int32(1), &Datum::Int32(2)),
            Some(Ordering::Less)
        );
        assert_eq!(
            datum_cmp(&Datum::Text("a".into()), &Datum::Text("a".into())),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn test_cmp_mixed_type_is_none() {
        assert_eq!(datum_cmp(&Datum::Int32(1), &Datum::Int64(1)), None);
        assert_eq!(datum_cmp(&Datum::Null, &Datum::Int32(1)), None);
    }

    #[test]
    fn test_eq_nan_and_null() {
        assert!(datum_eq(&Datum::Float64(f64::NAN), &Datum::Float64(f64::NAN)));
        assert!(datum_eq(&Datum::Null, &Datum::Null));
        assert!(!datum_eq(&Datum::Null, &Datum::Int32(0)));
    }

    #[test]
    fn test_f64_projection() {
        assert_eq!(Datum::Int32(5).as_f64(), Some(5.0));
        assert_eq!(Datum::Date(10).as_f64(), Some(10.0));
        assert_eq!(Datum::Text("x".into()).as_f64(), None);
    }

    #[test]
    fn test_width() {
        assert_eq!(Datum::Int64(0).width_bytes(), 8);
        assert_eq!(Datum::Text("abcd".into()).width_bytes(), 4);
    }
}
