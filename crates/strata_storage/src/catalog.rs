//! Catalog and storage control surface.
//!
//! The tuner is handed a `StorageControl` capability at construction; it
//! never reaches through process-wide state. The surface is read-mostly:
//! only `create_index` / `drop_index` mutate, and the engine serializes
//! those against DDL with a per-table exclusive lock.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use strata_common::datum::Datum;
use strata_common::error::{CatalogError, StrataResult};
use strata_common::types::{ColumnId, DataType};

use crate::index::{IndexKind, InstalledIndex};
use crate::stats::{ColumnStatsSnapshot, TableStatsSnapshot};

/// Control surface the tuner consumes. Implementations must be safe to
/// call from the tuner's background thread while DML runs concurrently.
pub trait StorageControl: Send + Sync {
    /// All table names, in a stable order.
    fn list_tables(&self) -> Vec<String>;

    /// Live indexes of one table with their measured footprints.
    fn list_indexes(&self, table: &str) -> StrataResult<Vec<InstalledIndex>>;

    /// Statistics snapshot for one table.
    fn table_statistics(&self, table: &str) -> StrataResult<TableStatsSnapshot>;

    /// Build an index of `kind` over `column_ids` on every chunk of
    /// `table`. Blocks until the build completes.
    fn create_index(
        &self,
        table: &str,
        column_ids: &[ColumnId],
        kind: IndexKind,
    ) -> StrataResult<()>;

    /// Remove the index matching `column_ids` and `kind` from every chunk.
    fn drop_index(
        &self,
        table: &str,
        column_ids: &[ColumnId],
        kind: IndexKind,
    ) -> StrataResult<()>;

    /// Predicted per-chunk footprint of a hypothetical index, assuming
    /// uniformly distributed values.
    fn predict_memory_consumption(
        &self,
        kind: IndexKind,
        chunk_rows: u64,
        chunk_distinct: u64,
        value_bytes: u32,
    ) -> u64 {
        kind.predict_memory_consumption(chunk_rows, chunk_distinct, value_bytes)
    }
}

/// Column definition for seeding a `MemoryStorage` table.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
    pub distinct_count: u64,
    pub min: Option<Datum>,
    pub max: Option<Datum>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: DataType, distinct_count: u64) -> Self {
        Self {
            name: name.into(),
            data_type,
            distinct_count,
            min: None,
            max: None,
        }
    }

    pub fn with_bounds(mut self, min: Datum, max: Datum) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }
}

/// Table definition for seeding a `MemoryStorage`.
#[derive(Debug, Clone)]
pub struct TableDef {
    pub name: String,
    pub row_count: u64,
    pub chunk_count: u32,
    pub columns: Vec<ColumnDef>,
}

struct TableEntry {
    stats: TableStatsSnapshot,
    indexes: Vec<InstalledIndex>,
}

/// In-memory catalog and index registry. Serves as the composition root's
/// storage adapter in tests and playground setups; the production engine
/// implements `StorageControl` over its chunk store.
pub struct MemoryStorage {
    tables: RwLock<BTreeMap<String, TableEntry>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn add_table(&self, def: TableDef) {
        let columns = def
            .columns
            .into_iter()
            .map(|c| {
                let width_bytes = c.data_type.fixed_width_bytes().unwrap_or(16);
                ColumnStatsSnapshot {
                    name: c.name,
                    data_type: c.data_type,
                    distinct_count: c.distinct_count,
                    min: c.min,
                    max: c.max,
                    width_bytes,
                    exact: true,
                }
            })
            .collect();
        let entry = TableEntry {
            stats: TableStatsSnapshot {
                row_count: def.row_count,
                chunk_count: def.chunk_count.max(1),
                columns,
            },
            indexes: Vec::new(),
        };
        self.tables.write().insert(def.name, entry);
    }

    pub fn drop_table(&self, name: &str) {
        self.tables.write().remove(name);
    }

    /// Seed an already-installed index with an explicitly reported
    /// footprint, bypassing the build path.
    pub fn add_installed_index(
        &self,
        table: &str,
        column_ids: Vec<ColumnId>,
        kind: IndexKind,
        memory_bytes: u64,
    ) -> StrataResult<()> {
        let mut tables = self.tables.write();
        let entry = tables
            .get_mut(table)
            .ok_or_else(|| CatalogError::TableNotFound(table.to_string()))?;
        entry.indexes.push(InstalledIndex {
            column_ids,
            kind,
            memory_bytes,
        });
        Ok(())
    }

    /// Total measured index footprint across all tables.
    pub fn total_index_bytes(&self) -> u64 {
        self.tables
            .read()
            .values()
            .flat_map(|t| t.indexes.iter())
            .map(|i| i.memory_bytes)
            .sum()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageControl for MemoryStorage {
    fn list_tables(&self) -> Vec<String> {
        self.tables.read().keys().cloned().collect()
    }

    fn list_indexes(&self, table: &str) -> StrataResult<Vec<InstalledIndex>> {
        let tables = self.tables.read();
        let entry = tables
            .get(table)
            .ok_or_else(|| CatalogError::TableNotFound(table.to_string()))?;
        Ok(entry.indexes.clone())
    }

    fn table_statistics(&self, table: &str) -> StrataResult<TableStatsSnapshot> {
        let tables = self.tables.read();
        let entry = tables
            .get(table)
            .ok_or_else(|| CatalogError::TableNotFound(table.to_string()))?;
        Ok(entry.stats.clone())
    }

    fn create_index(
        &self,
        table: &str,
        column_ids: &[ColumnId],
        kind: IndexKind,
    ) -> StrataResult<()> {
        let mut tables = self.tables.write();
        let entry = tables
            .get_mut(table)
            .ok_or_else(|| CatalogError::TableNotFound(table.to_string()))?;
        for id in column_ids {
            if entry.stats.column(*id).is_none() {
                return Err(CatalogError::ColumnNotFound {
                    table: table.to_string(),
                    column: *id,
                }
                .into());
            }
        }
        if entry
            .indexes
            .iter()
            .any(|i| i.column_ids == column_ids && i.kind == kind)
        {
            return Err(CatalogError::IndexAlreadyExists {
                table: table.to_string(),
                columns: column_ids.to_vec(),
            }
            .into());
        }

        // Build cost model: per-chunk prediction over uniformly split rows
        // and distinct values, matching what the evaluator estimated.
        let stats = &entry.stats;
        let chunk_count = stats.chunk_count.max(1) as u64;
        let chunk_rows = stats.row_count / chunk_count;
        let distinct: u64 = column_ids
            .iter()
            .filter_map(|id| stats.column(*id))
            .map(|c| c.distinct_count)
            .max()
            .unwrap_or(0);
        let chunk_distinct = distinct / chunk_count;
        let value_bytes = stats.value_bytes(column_ids);
        let memory_bytes =
            kind.predict_memory_consumption(chunk_rows, chunk_distinct, value_bytes) * chunk_count;

        entry.indexes.push(InstalledIndex {
            column_ids: column_ids.to_vec(),
            kind,
            memory_bytes,
        });
        Ok(())
    }

    fn drop_index(
        &self,
        table: &str,
        column_ids: &[ColumnId],
        kind: IndexKind,
    ) -> StrataResult<()> {
        let mut tables = self.tables.write();
        let entry = tables
            .get_mut(table)
            .ok_or_else(|| CatalogError::TableNotFound(table.to_string()))?;
        let before = entry.indexes.len();
        entry
            .indexes
            .retain(|i| !(i.column_ids == column_ids && i.kind == kind));
        if entry.indexes.len() == before {
            return Err(CatalogError::IndexNotFound {
                table: table.to_string(),
                columns: column_ids.to_vec(),
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage_with_table() -> MemoryStorage {
        let storage = MemoryStorage::new();
        storage.add_table(TableDef {
            name: "t".into(),
            row_count: 1000,
            chunk_count: 10,
            columns: vec![
                ColumnDef::new("a", DataType::Int32, 100)
                    .with_bounds(Datum::Int32(0), Datum::Int32(999)),
                ColumnDef::new("b", DataType::Int64, 1000),
            ],
        });
        storage
    }

    #[test]
    fn test_list_tables_sorted() {
        let storage = storage_with_table();
        storage.add_table(TableDef {
            name: "a_table".into(),
            row_count: 1,
            chunk_count: 1,
            columns: vec![ColumnDef::new("x", DataType::Int32, 1)],
        });
        assert_eq!(storage.list_tables(), vec!["a_table", "t"]);
    }

    #[test]
    fn test_create_and_list_index() {
        let storage = storage_with_table();
        storage
            .create_index("t", &[ColumnId(0)], IndexKind::GroupKey)
            .unwrap();
        let indexes = storage.list_indexes("t").unwrap();
        assert_eq!(indexes.len(), 1);
        assert_eq!(indexes[0].kind, IndexKind::GroupKey);
        // 10 chunks of 100 rows / 10 distinct each.
        let per_chunk = IndexKind::GroupKey.predict_memory_consumption(100, 10, 4);
        assert_eq!(indexes[0].memory_bytes, per_chunk * 10);
    }

    #[test]
    fn test_duplicate_create_rejected() {
        let storage = storage_with_table();
        storage
            .create_index("t", &[ColumnId(0)], IndexKind::GroupKey)
            .unwrap();
        let err = storage
            .create_index("t", &[ColumnId(0)], IndexKind::GroupKey)
            .unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_create_unknown_column_rejected() {
        let storage = storage_with_table();
        let err = storage
            .create_index("t", &[ColumnId(9)], IndexKind::GroupKey)
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_drop_missing_index_errors() {
        let storage = storage_with_table();
        let err = storage
            .drop_index("t", &[ColumnId(0)], IndexKind::GroupKey)
            .unwrap_err();
        assert!(err.to_string().contains("No matching index"));
    }

    #[test]
    fn test_drop_roundtrip() {
        let storage = storage_with_table();
        storage
            .create_index("t", &[ColumnId(0)], IndexKind::GroupKey)
            .unwrap();
        storage
            .drop_index("t", &[ColumnId(0)], IndexKind::GroupKey)
            .unwrap();
        assert!(storage.list_indexes("t").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_table_errors() {
        let storage = MemoryStorage::new();
        assert!(storage.table_statistics("nope").is_err());
        assert!(storage.list_indexes("nope").is_err());
    }

    #[test]
    fn test_total_index_bytes() {
        let storage = storage_with_table();
        storage
            .add_installed_index("t", vec![ColumnId(1)], IndexKind::GroupKey, 2048)
            .unwrap();
        assert_eq!(storage.total_index_bytes(), 2048);
    }
}
