//! Plain statistics snapshots and predicate match estimation.
//!
//! Statistics are captured once at the start of a tuning round and treated
//! as immutable values from then on. Estimation is single-column and
//! condition-aware: equality uses the distinct count, ranges interpolate
//! between min and max, LIKE/IN fall back to configured constants.

use strata_common::datum::{datum_cmp, Datum};
use strata_common::types::{ColumnId, DataType, PredicateCondition};

/// Snapshot of one column's statistics.
#[derive(Debug, Clone)]
pub struct ColumnStatsSnapshot {
    pub name: String,
    pub data_type: DataType,
    /// Approximate number of distinct non-null values.
    pub distinct_count: u64,
    pub min: Option<Datum>,
    pub max: Option<Datum>,
    /// Fixed type width, or measured average width for Text.
    pub width_bytes: u32,
    /// True when `distinct_count` is exact rather than sketched.
    pub exact: bool,
}

/// Snapshot of one table's statistics.
#[derive(Debug, Clone)]
pub struct TableStatsSnapshot {
    pub row_count: u64,
    pub chunk_count: u32,
    pub columns: Vec<ColumnStatsSnapshot>,
}

/// Result of estimating a predicate against a table snapshot: the expected
/// number of matching rows and how reliable that figure is.
#[derive(Debug, Clone, Copy)]
pub struct PredicateEstimate {
    pub match_rows: f64,
    pub confidence: f32,
}

/// Fallback match fraction when a range cannot be interpolated.
const RANGE_FALLBACK_FRACTION: f64 = 1.0 / 3.0;
/// Fallback match fraction for equality with no distinct count.
const EQ_FALLBACK_FRACTION: f64 = 0.1;

impl TableStatsSnapshot {
    pub fn column(&self, column_id: ColumnId) -> Option<&ColumnStatsSnapshot> {
        self.columns.get(column_id.0 as usize)
    }

    /// Rows expected to match `column <condition> literal`, with a
    /// confidence reflecting how much the estimate leaned on heuristics.
    pub fn predicate_match_rows(
        &self,
        column_id: ColumnId,
        condition: PredicateCondition,
        literal: &Datum,
        like_selectivity: f32,
        in_selectivity: f32,
    ) -> PredicateEstimate {
        let rows = self.row_count as f64;
        let Some(stats) = self.column(column_id) else {
            return PredicateEstimate {
                match_rows: rows * RANGE_FALLBACK_FRACTION,
                confidence: 0.0,
            };
        };

        let stats_confidence: f32 = if stats.exact { 1.0 } else { 0.8 };

        let estimate = match condition {
            PredicateCondition::Equals => {
                if stats.distinct_count > 0 {
                    PredicateEstimate {
                        match_rows: rows / stats.distinct_count as f64,
                        confidence: stats_confidence,
                    }
                } else {
                    PredicateEstimate {
                        match_rows: rows * EQ_FALLBACK_FRACTION,
                        confidence: 0.3,
                    }
                }
            }
            PredicateCondition::NotEquals => {
                if stats.distinct_count > 0 {
                    PredicateEstimate {
                        match_rows: rows - rows / stats.distinct_count as f64,
                        confidence: stats_confidence,
                    }
                } else {
                    PredicateEstimate {
                        match_rows: rows * (1.0 - EQ_FALLBACK_FRACTION),
                        confidence: 0.3,
                    }
                }
            }
            PredicateCondition::LessThan
            | PredicateCondition::LessThanEquals
            | PredicateCondition::GreaterThan
            | PredicateCondition::GreaterThanEquals
            | PredicateCondition::Between => {
                match range_fraction(stats, condition, literal) {
                    Some(fraction) => PredicateEstimate {
                        match_rows: rows * fraction,
                        confidence: stats_confidence * 0.9,
                    },
                    None => PredicateEstimate {
                        match_rows: rows * RANGE_FALLBACK_FRACTION,
                        confidence: 0.5,
                    },
                }
            }
            PredicateCondition::Like => PredicateEstimate {
                match_rows: rows * like_selectivity as f64,
                confidence: like_confidence(literal),
            },
            PredicateCondition::In => PredicateEstimate {
                match_rows: rows * in_selectivity as f64,
                confidence: 0.6,
            },
        };

        PredicateEstimate {
            match_rows: estimate.match_rows.clamp(0.0, rows),
            confidence: estimate.confidence.clamp(0.0, 1.0),
        }
    }

    /// Sum of value widths across a set of columns, for composite key
    /// sizing. Unknown columns contribute nothing.
    pub fn value_bytes(&self, column_ids: &[ColumnId]) -> u32 {
        column_ids
            .iter()
            .filter_map(|id| self.column(*id))
            .map(|c| c.width_bytes)
            .sum()
    }
}

/// Fraction of rows in `[min, max]` matched by a range condition, by linear
/// interpolation on the numeric projections. `None` when the column bounds
/// or the literal have no numeric projection.
fn range_fraction(
    stats: &ColumnStatsSnapshot,
    condition: PredicateCondition,
    literal: &Datum,
) -> Option<f64> {
    let min = stats.min.as_ref()?;
    let max = stats.max.as_ref()?;
    // Out-of-domain literals clamp to empty / full range below.
    if datum_cmp(min, max).is_none() {
        return None;
    }
    let lo = min.as_f64()?;
    let hi = max.as_f64()?;
    let v = literal.as_f64()?;
    if hi <= lo {
        // Single-valued column: condition either matches all rows or none.
        let matches = match condition {
            PredicateCondition::LessThan => v > lo,
            PredicateCondition::LessThanEquals => v >= lo,
            PredicateCondition::GreaterThan => v < lo,
            PredicateCondition::GreaterThanEquals | PredicateCondition::Between => v <= lo,
            _ => return None,
        };
        return Some(if matches { 1.0 } else { 0.0 });
    }
    let pos = ((v - lo) / (hi - lo)).clamp(0.0, 1.0);
    let fraction = match condition {
        PredicateCondition::LessThan | PredicateCondition::LessThanEquals => pos,
        // Only the lower bound of a BETWEEN is recorded; estimate like a
        // greater-or-equal scan from that bound.
        PredicateCondition::GreaterThan
        | PredicateCondition::GreaterThanEquals
        | PredicateCondition::Between => 1.0 - pos,
        _ => return None,
    };
    Some(fraction)
}

/// LIKE patterns without a constant prefix cannot use an ordered index
/// effectively; they are still recorded but with low confidence.
fn like_confidence(literal: &Datum) -> f32 {
    match literal {
        Datum::Text(pattern) => {
            if pattern.starts_with('%') || pattern.starts_with('_') {
                0.3
            } else {
                0.5
            }
        }
        _ => 0.3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> TableStatsSnapshot {
        TableStatsSnapshot {
            row_count: 1000,
            chunk_count: 10,
            columns: vec![
                ColumnStatsSnapshot {
                    name: "a".into(),
                    data_type: DataType::Int32,
                    distinct_count: 100,
                    min: Some(Datum::Int32(0)),
                    max: Some(Datum::Int32(1000)),
                    width_bytes: 4,
                    exact: true,
                },
                ColumnStatsSnapshot {
                    name: "s".into(),
                    data_type: DataType::Text,
                    distinct_count: 50,
                    min: None,
                    max: None,
                    width_bytes: 16,
                    exact: false,
                },
            ],
        }
    }

    #[test]
    fn test_equality_uses_distinct_count() {
        let est = snapshot().predicate_match_rows(
            ColumnId(0),
            PredicateCondition::Equals,
            &Datum::Int32(5),
            0.2,
            0.1,
        );
        assert!((est.match_rows - 10.0).abs() < 1e-9);
        assert_eq!(est.confidence, 1.0);
    }

    #[test]
    fn test_range_interpolates_between_min_max() {
        let est = snapshot().predicate_match_rows(
            ColumnId(0),
            PredicateCondition::LessThan,
            &Datum::Int32(250),
            0.2,
            0.1,
        );
        assert!((est.match_rows - 250.0).abs() < 1e-9);
        assert!(est.confidence > 0.8);
    }

    #[test]
    fn test_range_clamps_out_of_domain_literal() {
        let est = snapshot().predicate_match_rows(
            ColumnId(0),
            PredicateCondition::GreaterThan,
            &Datum::Int32(-50),
            0.2,
            0.1,
        );
        assert!((est.match_rows - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_range_on_text_falls_back() {
        let est = snapshot().predicate_match_rows(
            ColumnId(1),
            PredicateCondition::LessThan,
            &Datum::Text("m".into()),
            0.2,
            0.1,
        );
        assert!((est.match_rows - 1000.0 / 3.0).abs() < 1e-6);
        assert_eq!(est.confidence, 0.5);
    }

    #[test]
    fn test_like_prefix_vs_wildcard_confidence() {
        let stats = snapshot();
        let prefixed = stats.predicate_match_rows(
            ColumnId(1),
            PredicateCondition::Like,
            &Datum::Text("abc%".into()),
            0.2,
            0.1,
        );
        let wildcard = stats.predicate_match_rows(
            ColumnId(1),
            PredicateCondition::Like,
            &Datum::Text("%abc".into()),
            0.2,
            0.1,
        );
        assert!((prefixed.match_rows - 200.0).abs() < 1e-6);
        assert!(prefixed.confidence > wildcard.confidence);
    }

    #[test]
    fn test_in_uses_configured_selectivity() {
        let est = snapshot().predicate_match_rows(
            ColumnId(1),
            PredicateCondition::In,
            &Datum::Text("x".into()),
            0.2,
            0.05,
        );
        assert!((est.match_rows - 50.0).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_column_zero_confidence() {
        let est = snapshot().predicate_match_rows(
            ColumnId(9),
            PredicateCondition::Equals,
            &Datum::Int32(1),
            0.2,
            0.1,
        );
        assert_eq!(est.confidence, 0.0);
    }

    #[test]
    fn test_value_bytes_sums_widths() {
        let stats = snapshot();
        assert_eq!(stats.value_bytes(&[ColumnId(0), ColumnId(1)]), 20);
        assert_eq!(stats.value_bytes(&[ColumnId(7)]), 0);
    }
}
