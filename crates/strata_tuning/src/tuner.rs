//! The tuning round driver.
//!
//! A round is the atomic sequence evaluate → select → plan → apply. The
//! driver owns the evaluators and the selector, applies the planned
//! operations through the storage control surface, and reports per-round
//! metrics. Nothing in a round is fatal: individual operations may fail or
//! be skipped without aborting the remainder, a deadline lets the current
//! operation finish and discards the rest, and cancellation is honored
//! between operations.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use strata_common::cancel::CancelToken;
use strata_common::config::TuningConfig;
use strata_common::error::{CatalogError, StrataError, StrataResult};
use strata_plan::cache::PlanCache;
use strata_storage::catalog::StorageControl;

use crate::choice::ChoiceSet;
use crate::evaluator::{IndexEvaluator, TuningEvaluator};
use crate::operation::{OperationOutcome, TuningOperation};
use crate::planner::OperationPlanner;
use crate::selector::{GreedySelector, TuningSelector};

/// How a round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundStatus {
    Completed,
    /// The deadline expired during the named phase; the in-progress
    /// operation completed, the remainder was discarded.
    Timeout { phase: &'static str },
    /// Cancellation was requested; no further operations were applied.
    Cancelled,
}

/// Per-round observability counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundMetrics {
    pub choices_considered: usize,
    pub choices_accepted: usize,
    pub choices_evicted: usize,
    /// Measured change of total index memory across the round.
    pub bytes_delta: i64,
    pub duration_ms: u64,
    pub operations_failed: u64,
}

/// Everything a round produced.
#[derive(Debug)]
pub struct RoundReport {
    pub status: RoundStatus,
    pub metrics: RoundMetrics,
    pub outcomes: Vec<(TuningOperation, OperationOutcome)>,
}

/// Drives tuning rounds against an injected storage surface and plan cache.
pub struct Tuner {
    evaluators: Vec<Box<dyn TuningEvaluator>>,
    selector: Box<dyn TuningSelector>,
    planner: OperationPlanner,
    storage: Arc<dyn StorageControl>,
    plan_cache: Arc<dyn PlanCache>,
    config: TuningConfig,
    cancel: CancelToken,
}

impl Tuner {
    /// Build a tuner with the default single-column index evaluator and
    /// the greedy selector.
    pub fn new(
        storage: Arc<dyn StorageControl>,
        plan_cache: Arc<dyn PlanCache>,
        config: TuningConfig,
    ) -> Self {
        let evaluator = IndexEvaluator::new(storage.clone(), plan_cache.clone(), config.clone());
        let selector = GreedySelector::new(config.confidence_penalty_lambda);
        Self {
            evaluators: vec![Box::new(evaluator)],
            selector: Box::new(selector),
            planner: OperationPlanner::new(),
            storage,
            plan_cache,
            config,
            cancel: CancelToken::new(),
        }
    }

    /// Replace the selector. The same invariants (budget safety, monotone
    /// benefit, invalidation respect) are expected of any implementation.
    pub fn with_selector(mut self, selector: Box<dyn TuningSelector>) -> Self {
        self.selector = selector;
        self
    }

    /// Add a further evaluator; all evaluators append into one choice
    /// arena per round.
    pub fn add_evaluator(&mut self, evaluator: Box<dyn TuningEvaluator>) {
        self.evaluators.push(evaluator);
    }

    /// Token for cancelling in-flight rounds from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &TuningConfig {
        &self.config
    }

    /// Run one full tuning round.
    pub fn execute_round(&mut self) -> StrataResult<RoundReport> {
        let start = Instant::now();
        let deadline = (self.config.round_deadline_ms > 0)
            .then(|| start + Duration::from_millis(self.config.round_deadline_ms));
        info!(budget_bytes = self.config.memory_budget_bytes, "begin tuning round");

        // ── Evaluate ────────────────────────────────────────────────
        let mut choices = ChoiceSet::new();
        for evaluator in &mut self.evaluators {
            evaluator.evaluate(&mut choices)?;
        }
        self.log_choices(&choices);
        if let Some(report) = self.interrupted(deadline, "evaluate", &choices, start) {
            return Ok(report);
        }

        // ── Select ──────────────────────────────────────────────────
        let operations = self
            .selector
            .select(&choices, self.config.memory_budget_bytes);
        if let Some(report) = self.interrupted(deadline, "select", &choices, start) {
            return Ok(report);
        }

        // ── Plan ────────────────────────────────────────────────────
        let planned = self.planner.plan(operations);
        for op in &planned {
            debug!(operation = %op, "planned operation");
        }

        // ── Apply ───────────────────────────────────────────────────
        let bytes_before = self.measured_index_bytes();
        let mut status = RoundStatus::Completed;
        let mut outcomes = Vec::with_capacity(planned.len());
        let accepted = planned.iter().filter(|op| op.is_create()).count();
        let evicted = planned.iter().filter(|op| op.is_drop()).count();

        for op in planned {
            if self.cancel.is_cancelled() {
                info!("tuning round cancelled; discarding remaining operations");
                status = RoundStatus::Cancelled;
                break;
            }
            if deadline.is_some_and(|d| Instant::now() > d) {
                info!("tuning round deadline expired; discarding remaining operations");
                status = RoundStatus::Timeout { phase: "apply" };
                break;
            }
            let outcome = self.apply_operation(&op);
            debug!(operation = %op, outcome = %outcome, "applied operation");
            outcomes.push((op, outcome));
        }

        // Re-query the catalog after the batch: operations may have been
        // skipped or failed, so the measured footprint is the truth.
        let bytes_after = self.measured_index_bytes();
        if outcomes
            .iter()
            .any(|(_, outcome)| *outcome == OperationOutcome::Applied)
        {
            // Cached plans may reference the old physical layout.
            self.plan_cache.clear();
        }

        let metrics = RoundMetrics {
            choices_considered: choices.len(),
            choices_accepted: accepted,
            choices_evicted: evicted,
            bytes_delta: bytes_after as i64 - bytes_before as i64,
            duration_ms: start.elapsed().as_millis() as u64,
            operations_failed: outcomes
                .iter()
                .filter(|(_, outcome)| *outcome == OperationOutcome::Failed)
                .count() as u64,
        };
        info!(
            status = ?status,
            considered = metrics.choices_considered,
            accepted = metrics.choices_accepted,
            evicted = metrics.choices_evicted,
            bytes_delta = metrics.bytes_delta,
            failed = metrics.operations_failed,
            duration_ms = metrics.duration_ms,
            "tuning round finished"
        );
        Ok(RoundReport {
            status,
            metrics,
            outcomes,
        })
    }

    /// Deadline / cancellation check between phases. Returns a terminal
    /// report when the round must stop before applying anything.
    fn interrupted(
        &self,
        deadline: Option<Instant>,
        phase: &'static str,
        choices: &ChoiceSet,
        start: Instant,
    ) -> Option<RoundReport> {
        let status = if self.cancel.is_cancelled() {
            RoundStatus::Cancelled
        } else if deadline.is_some_and(|d| Instant::now() > d) {
            RoundStatus::Timeout { phase }
        } else {
            return None;
        };
        info!(?status, phase, "tuning round interrupted");
        Some(RoundReport {
            status,
            metrics: RoundMetrics {
                choices_considered: choices.len(),
                duration_ms: start.elapsed().as_millis() as u64,
                ..RoundMetrics::default()
            },
            outcomes: Vec::new(),
        })
    }

    fn apply_operation(&self, operation: &TuningOperation) -> OperationOutcome {
        let result = match operation {
            TuningOperation::CreateIndex { column_ref, kind } => self.storage.create_index(
                &column_ref.table_name,
                &column_ref.column_ids,
                *kind,
            ),
            TuningOperation::DropIndex { column_ref, kind } => self.storage.drop_index(
                &column_ref.table_name,
                &column_ref.column_ids,
                *kind,
            ),
            TuningOperation::NoOp => return OperationOutcome::Skipped,
        };
        match result {
            Ok(()) => OperationOutcome::Applied,
            Err(StrataError::Catalog(e)) => match e {
                CatalogError::TableNotFound(_)
                | CatalogError::ColumnNotFound { .. }
                | CatalogError::IndexNotFound { .. }
                | CatalogError::IndexAlreadyExists { .. } => {
                    warn!(operation = %operation, error = %e, "catalog moved; operation skipped");
                    OperationOutcome::Skipped
                }
                CatalogError::BuildFailed { .. } => {
                    warn!(operation = %operation, error = %e, "operation failed");
                    OperationOutcome::Failed
                }
            },
            Err(e) => {
                warn!(operation = %operation, error = %e, "operation failed");
                OperationOutcome::Failed
            }
        }
    }

    /// Total measured footprint of all installed indexes.
    fn measured_index_bytes(&self) -> u64 {
        let mut total = 0u64;
        for table in self.storage.list_tables() {
            if let Ok(indexes) = self.storage.list_indexes(&table) {
                total += indexes.iter().map(|i| i.memory_bytes).sum::<u64>();
            }
        }
        total
    }

    fn log_choices(&self, choices: &ChoiceSet) {
        for (_, choice) in choices.iter() {
            debug!(choice = %choice, "evaluated choice");
        }
    }
}
