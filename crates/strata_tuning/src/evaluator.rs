//! Index choice generation and scoring.
//!
//! The evaluator runs one round in five phases: reset accumulators, walk
//! the plan cache, aggregate access records into candidate sites, emit
//! choices for installed indexes, emit choices for the remaining
//! candidates. Desirability is "saved work": the rows that would not be
//! scanned if the index existed, summed over the observed workload. Cost is
//! the index footprint, measured for installed indexes and predicted per
//! chunk (assuming uniform value distribution) for hypothetical ones.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, warn};

use strata_common::config::TuningConfig;
use strata_common::error::StrataResult;
use strata_plan::cache::PlanCache;
use strata_storage::catalog::StorageControl;
use strata_storage::index::IndexKind;
use strata_storage::stats::TableStatsSnapshot;

use crate::access::AccessRecord;
use crate::choice::{ChoiceSet, IndexChoice, TuningChoice};
use crate::column_ref::ColumnRef;
use crate::inspector::PlanInspector;

/// Produces tuning choices for one round. Implementations append to the
/// shared choice arena; a driver may run several evaluators per round.
pub trait TuningEvaluator: Send {
    fn evaluate(&mut self, choices: &mut ChoiceSet) -> StrataResult<()>;
}

/// How the evaluator picks a kind for a hypothetical index.
#[derive(Debug, Clone, Copy)]
pub enum KindPolicy {
    /// Always group-key (composite for multi-column refs).
    AlwaysGroupKey,
    /// Group-key for selective columns, adaptive radix below the given
    /// distinct/rows ratio.
    SelectivityAware { min_distinct_ratio: f64 },
}

impl Default for KindPolicy {
    fn default() -> Self {
        KindPolicy::AlwaysGroupKey
    }
}

/// Default single-column index evaluator.
pub struct IndexEvaluator {
    storage: Arc<dyn StorageControl>,
    plan_cache: Arc<dyn PlanCache>,
    config: TuningConfig,
    kind_policy: KindPolicy,

    // Per-round accumulators, cleared by `setup()`.
    access_records: Vec<AccessRecord>,
    saved_work: BTreeMap<ColumnRef, f64>,
    record_confidence: BTreeMap<ColumnRef, f32>,
    new_candidates: BTreeSet<ColumnRef>,
    stats_cache: BTreeMap<String, TableStatsSnapshot>,
}

impl IndexEvaluator {
    pub fn new(
        storage: Arc<dyn StorageControl>,
        plan_cache: Arc<dyn PlanCache>,
        config: TuningConfig,
    ) -> Self {
        Self {
            storage,
            plan_cache,
            config,
            kind_policy: KindPolicy::default(),
            access_records: Vec::new(),
            saved_work: BTreeMap::new(),
            record_confidence: BTreeMap::new(),
            new_candidates: BTreeSet::new(),
            stats_cache: BTreeMap::new(),
        }
    }

    pub fn with_kind_policy(mut self, policy: KindPolicy) -> Self {
        self.kind_policy = policy;
        self
    }

    fn setup(&mut self) {
        self.access_records.clear();
        self.saved_work.clear();
        self.record_confidence.clear();
        self.new_candidates.clear();
        self.stats_cache.clear();
    }

    /// Enumerate the cache in priority order and collect access records.
    /// Plans the inspector rejects are skipped; the round continues.
    fn inspect_cache(&mut self) {
        let entries = self.plan_cache.ordered_entries();
        if entries.is_empty() {
            debug!("plan cache is empty; no workload to observe");
        }
        for entry in entries {
            debug!(
                key = %entry.key,
                frequency = entry.frequency,
                priority = entry.priority,
                "inspecting cached plan"
            );
            if let Err(e) =
                PlanInspector::inspect(&entry.plan, entry.frequency, &mut self.access_records)
            {
                warn!(key = %entry.key, error = %e, "skipping unanalyzable cached plan");
            }
        }
    }

    /// Fold records into per-site saved work. Records over tables or
    /// columns missing from the catalog snapshot are dropped here, which
    /// keeps every surviving site resolvable for the rest of the round.
    fn aggregate(&mut self) {
        let records = std::mem::take(&mut self.access_records);
        for record in &records {
            if !self.cache_stats_for(&record.column_ref.table_name) {
                debug!(column_ref = %record.column_ref, "dropping record for unknown table");
                continue;
            }
            let stats = &self.stats_cache[&record.column_ref.table_name];
            let known_columns = record
                .column_ref
                .column_ids
                .iter()
                .all(|id| stats.column(*id).is_some());
            if !known_columns {
                debug!(column_ref = %record.column_ref, "dropping record for unknown column");
                continue;
            }
            self.new_candidates.insert(record.column_ref.clone());
            self.process_access_record(record);
        }
        self.access_records = records;
    }

    /// Accumulate one record's contribution:
    /// `(total_rows − match_rows) × query_frequency`.
    fn process_access_record(&mut self, record: &AccessRecord) {
        let stats = &self.stats_cache[&record.column_ref.table_name];
        let estimate = stats.predicate_match_rows(
            record.column_ref.column_ids[0],
            record.condition,
            &record.compare_value,
            self.config.selectivity_like,
            self.config.selectivity_in_default,
        );
        let unscanned = (stats.row_count as f64 - estimate.match_rows).max(0.0);
        let contribution = unscanned * record.query_frequency as f64;
        *self.saved_work.entry(record.column_ref.clone()).or_insert(0.0) += contribution;
        let confidence = self
            .record_confidence
            .entry(record.column_ref.clone())
            .or_insert(1.0);
        *confidence = confidence.min(estimate.confidence);
    }

    /// One choice per installed index, with its measured footprint. An
    /// installed index also pays a maintenance debit (one full-table write
    /// sweep over the observation window), so an index no query used comes
    /// out with negative saved work and becomes a drop candidate.
    fn add_existing(&mut self, choices: &mut ChoiceSet, seen: &mut BTreeSet<ColumnRef>) {
        for table_name in self.storage.list_tables() {
            if !self.cache_stats_for(&table_name) {
                continue;
            }
            let installed = match self.storage.list_indexes(&table_name) {
                Ok(indexes) => indexes,
                Err(e) => {
                    warn!(table = %table_name, error = %e, "cannot list indexes");
                    continue;
                }
            };
            let row_count = self.stats_cache[&table_name].row_count;
            for index in installed {
                let column_ref = ColumnRef::multi(table_name.clone(), index.column_ids.clone());
                if !seen.insert(column_ref.clone()) {
                    warn!(column_ref = %column_ref, "duplicate index site; keeping first choice");
                    continue;
                }
                self.new_candidates.remove(&column_ref);
                let observed = self.saved_work.get(&column_ref).copied().unwrap_or(0.0);
                let confidence = self
                    .record_confidence
                    .get(&column_ref)
                    .copied()
                    .unwrap_or(1.0);
                choices.push(TuningChoice::Index(IndexChoice {
                    column_ref,
                    exists: true,
                    kind: index.kind,
                    memory_cost_bytes: index.memory_bytes,
                    saved_work: (observed - row_count as f64) as f32,
                    confidence,
                }));
            }
        }
    }

    /// One choice per remaining candidate site, with a proposed kind and a
    /// predicted footprint.
    fn add_new(&mut self, choices: &mut ChoiceSet, seen: &mut BTreeSet<ColumnRef>) {
        let candidates = std::mem::take(&mut self.new_candidates);
        for column_ref in &candidates {
            if !seen.insert(column_ref.clone()) {
                continue;
            }
            let stats = &self.stats_cache[&column_ref.table_name];
            let kind = self.propose_kind(column_ref, stats);
            let memory_cost_bytes = self.predict_memory_cost(column_ref, stats, kind);
            let saved_work = self.saved_work.get(column_ref).copied().unwrap_or(0.0) as f32;
            let confidence = self
                .record_confidence
                .get(column_ref)
                .copied()
                .unwrap_or(0.0);
            choices.push(TuningChoice::Index(IndexChoice {
                column_ref: column_ref.clone(),
                exists: false,
                kind,
                memory_cost_bytes,
                saved_work,
                confidence,
            }));
        }
        self.new_candidates = candidates;
    }

    fn propose_kind(&self, column_ref: &ColumnRef, stats: &TableStatsSnapshot) -> IndexKind {
        if column_ref.is_multi_column() {
            return IndexKind::CompositeGroupKey;
        }
        match self.kind_policy {
            KindPolicy::AlwaysGroupKey => IndexKind::GroupKey,
            KindPolicy::SelectivityAware { min_distinct_ratio } => {
                let distinct = stats
                    .column(column_ref.column_ids[0])
                    .map(|c| c.distinct_count)
                    .unwrap_or(0);
                let ratio = if stats.row_count > 0 {
                    distinct as f64 / stats.row_count as f64
                } else {
                    1.0
                };
                if ratio < min_distinct_ratio {
                    IndexKind::AdaptiveRadix
                } else {
                    IndexKind::GroupKey
                }
            }
        }
    }

    /// Per-chunk prediction summed over chunks, splitting rows and distinct
    /// values uniformly.
    fn predict_memory_cost(
        &self,
        column_ref: &ColumnRef,
        stats: &TableStatsSnapshot,
        kind: IndexKind,
    ) -> u64 {
        let chunk_count = stats.chunk_count.max(1) as u64;
        let chunk_rows = stats.row_count / chunk_count;
        let distinct = column_ref
            .column_ids
            .iter()
            .filter_map(|id| stats.column(*id))
            .map(|c| c.distinct_count)
            .max()
            .unwrap_or(0);
        let chunk_distinct = distinct / chunk_count;
        let value_bytes = stats.value_bytes(&column_ref.column_ids);
        self.storage
            .predict_memory_consumption(kind, chunk_rows, chunk_distinct, value_bytes)
            * chunk_count
    }

    /// Choices on prefix-related sites of the same table are mutually
    /// exclusive (a composite index subsumes lookups on its prefix). The
    /// closure is completed symmetrically over the whole arena.
    fn link_invalidations(&self, choices: &mut ChoiceSet, first: usize) {
        let len = choices.len();
        for i in first..len {
            for j in (i + 1)..len {
                let related = choices
                    .get(i)
                    .column_ref()
                    .is_prefix_related(choices.get(j).column_ref());
                if related {
                    choices.add_invalidation(i, j);
                }
            }
        }
    }

    /// Snapshot a table's statistics once per round. Returns false when the
    /// table is not in the catalog.
    fn cache_stats_for(&mut self, table_name: &str) -> bool {
        if self.stats_cache.contains_key(table_name) {
            return true;
        }
        match self.storage.table_statistics(table_name) {
            Ok(stats) => {
                self.stats_cache.insert(table_name.to_string(), stats);
                true
            }
            Err(_) => false,
        }
    }
}

impl TuningEvaluator for IndexEvaluator {
    fn evaluate(&mut self, choices: &mut ChoiceSet) -> StrataResult<()> {
        self.setup();
        self.inspect_cache();
        self.aggregate();

        let first = choices.len();
        let mut seen = BTreeSet::new();
        self.add_existing(choices, &mut seen);
        self.add_new(choices, &mut seen);
        self.link_invalidations(choices, first);

        debug!(choices = choices.len() - first, "evaluation round complete");
        Ok(())
    }
}
