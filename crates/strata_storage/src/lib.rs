//! Storage surfaces consumed by the index tuner: index kinds and their
//! memory model, per-table statistics snapshots, and the catalog / control
//! surface through which tuning operations are applied.

pub mod catalog;
pub mod index;
pub mod stats;
