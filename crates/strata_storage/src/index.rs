//! Secondary index kinds and their memory model.
//!
//! Index kinds are distinguished here only by their memory-prediction
//! function and suitability rules; the concrete per-chunk index structures
//! live in the storage engine proper.

use serde::{Deserialize, Serialize};
use std::fmt;

use strata_common::types::ColumnId;

/// Kind of a per-chunk secondary index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexKind {
    /// Dictionary-position index over a single column.
    GroupKey,
    /// Group-key index over concatenated keys of several columns.
    CompositeGroupKey,
    /// Adaptive radix tree over a single column.
    AdaptiveRadix,
}

impl IndexKind {
    /// Predict the memory consumption in bytes of one chunk's index,
    /// assuming values are uniformly distributed across chunks.
    ///
    /// The models mirror the on-heap layout of each structure:
    /// - `GroupKey`: one u32 position per row plus a (distinct + 1) u32
    ///   offset array into the dictionary.
    /// - `CompositeGroupKey`: additionally materializes the concatenated
    ///   keys themselves (distinct × key width).
    /// - `AdaptiveRadix`: per-distinct-key node overhead plus one pointer
    ///   per row in the leaf position lists.
    pub fn predict_memory_consumption(
        &self,
        chunk_rows: u64,
        chunk_distinct: u64,
        value_bytes: u32,
    ) -> u64 {
        const OFFSET_BYTES: u64 = 4;
        const ART_NODE_OVERHEAD: u64 = 28;
        const ART_LEAF_PTR: u64 = 8;
        match self {
            IndexKind::GroupKey => {
                chunk_rows * OFFSET_BYTES + (chunk_distinct + 1) * OFFSET_BYTES
            }
            IndexKind::CompositeGroupKey => {
                chunk_rows * OFFSET_BYTES
                    + (chunk_distinct + 1) * OFFSET_BYTES
                    + chunk_distinct * value_bytes as u64
            }
            IndexKind::AdaptiveRadix => {
                chunk_distinct * (value_bytes as u64 + ART_NODE_OVERHEAD)
                    + chunk_rows * ART_LEAF_PTR
            }
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::GroupKey => write!(f, "group_key"),
            IndexKind::CompositeGroupKey => write!(f, "composite_group_key"),
            IndexKind::AdaptiveRadix => write!(f, "adaptive_radix"),
        }
    }
}

/// A live index as reported by the catalog, with its measured footprint
/// summed over all chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledIndex {
    pub column_ids: Vec<ColumnId>,
    pub kind: IndexKind,
    pub memory_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_key_prediction_scales_with_rows() {
        let small = IndexKind::GroupKey.predict_memory_consumption(100, 10, 4);
        let large = IndexKind::GroupKey.predict_memory_consumption(1000, 10, 4);
        assert!(large > small);
        assert_eq!(small, 100 * 4 + 11 * 4);
    }

    #[test]
    fn test_composite_includes_key_bytes() {
        let single = IndexKind::GroupKey.predict_memory_consumption(100, 10, 12);
        let composite = IndexKind::CompositeGroupKey.predict_memory_consumption(100, 10, 12);
        assert_eq!(composite, single + 10 * 12);
    }

    #[test]
    fn test_art_dominated_by_node_overhead_for_distinct_heavy_columns() {
        let gk = IndexKind::GroupKey.predict_memory_consumption(1000, 1000, 8);
        let art = IndexKind::AdaptiveRadix.predict_memory_consumption(1000, 1000, 8);
        assert!(art > gk);
    }
}
