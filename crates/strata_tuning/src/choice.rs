//! Tuning choices and the per-round choice arena.
//!
//! A choice is a candidate system modification (create, keep or drop an
//! index) annotated with predicted cost, benefit and confidence. The
//! selector consumes only the common capability set (benefit, cost,
//! confidence, is-currently-chosen, accept/reject), so further choice
//! families can be added as new variants.
//!
//! Pairwise `invalidates` constraints are kept out of the choices
//! themselves: the arena owns the choices and a separate adjacency set
//! keyed by arena index, so no owning references run both ways.

use std::collections::BTreeSet;
use std::fmt;

use strata_storage::index::IndexKind;

use crate::column_ref::ColumnRef;
use crate::operation::TuningOperation;

/// Characteristics of one index site as scored by the evaluator.
#[derive(Debug, Clone)]
pub struct IndexChoice {
    pub column_ref: ColumnRef,
    /// Whether this index is already installed.
    pub exists: bool,
    /// Installed kind, or the proposed kind for a hypothetical index.
    pub kind: IndexKind,
    /// Measured footprint when installed, predicted footprint otherwise.
    pub memory_cost_bytes: u64,
    /// Estimated rows not scanned over the observed workload if this index
    /// is (or stays) present. Negative for installed indexes whose upkeep
    /// outweighs their use; that is the signal to drop them.
    pub saved_work: f32,
    /// Reliability of the estimates in [0, 1].
    pub confidence: f32,
}

/// A candidate system modification. Currently only index choices exist;
/// the selector is written against the capability set alone.
#[derive(Debug, Clone)]
pub enum TuningChoice {
    Index(IndexChoice),
}

impl TuningChoice {
    /// Raw performance impact estimate (higher is better, negative means
    /// the system is better off without this choice).
    pub fn desirability(&self) -> f32 {
        match self {
            TuningChoice::Index(c) => c.saved_work,
        }
    }

    /// Desirability after the confidence penalty: `saved_work − λ·(1−confidence)`.
    pub fn benefit(&self, lambda: f32) -> f32 {
        self.desirability() - lambda * (1.0 - self.confidence())
    }

    pub fn confidence(&self) -> f32 {
        match self {
            TuningChoice::Index(c) => c.confidence,
        }
    }

    /// Cost counted against the shared memory budget, in bytes.
    pub fn cost(&self) -> u64 {
        match self {
            TuningChoice::Index(c) => c.memory_cost_bytes,
        }
    }

    /// True if this modification is already present in the system.
    pub fn is_currently_chosen(&self) -> bool {
        match self {
            TuningChoice::Index(c) => c.exists,
        }
    }

    pub fn column_ref(&self) -> &ColumnRef {
        match self {
            TuningChoice::Index(c) => &c.column_ref,
        }
    }

    /// Operation that makes this choice present. NoOp when already chosen.
    pub fn accept(&self) -> TuningOperation {
        match self {
            TuningChoice::Index(c) => {
                if c.exists {
                    TuningOperation::NoOp
                } else {
                    TuningOperation::CreateIndex {
                        column_ref: c.column_ref.clone(),
                        kind: c.kind,
                    }
                }
            }
        }
    }

    /// Operation that makes this choice absent. NoOp when not chosen.
    pub fn reject(&self) -> TuningOperation {
        match self {
            TuningChoice::Index(c) => {
                if c.exists {
                    TuningOperation::DropIndex {
                        column_ref: c.column_ref.clone(),
                        kind: c.kind,
                    }
                } else {
                    TuningOperation::NoOp
                }
            }
        }
    }
}

impl fmt::Display for TuningChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuningChoice::Index(c) => write!(
                f,
                "IndexChoice{{on: {}, exists: {}, kind: {}, saved_work: {} rows, cost: {} B, confidence: {:.2}}}",
                c.column_ref, c.exists, c.kind, c.saved_work, c.memory_cost_bytes, c.confidence
            ),
        }
    }
}

/// Owned arena of one round's choices plus the symmetric invalidation
/// adjacency between them.
#[derive(Debug, Default)]
pub struct ChoiceSet {
    choices: Vec<TuningChoice>,
    invalidates: Vec<BTreeSet<usize>>,
}

impl ChoiceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a choice, returning its arena index.
    pub fn push(&mut self, choice: TuningChoice) -> usize {
        self.choices.push(choice);
        self.invalidates.push(BTreeSet::new());
        self.choices.len() - 1
    }

    /// Mark `a` and `b` as mutually exclusive. The relation is kept
    /// symmetric regardless of which direction callers discover first.
    pub fn add_invalidation(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.invalidates[a].insert(b);
        self.invalidates[b].insert(a);
    }

    pub fn invalidated_by(&self, idx: usize) -> &BTreeSet<usize> {
        &self.invalidates[idx]
    }

    pub fn get(&self, idx: usize) -> &TuningChoice {
        &self.choices[idx]
    }

    pub fn choices(&self) -> &[TuningChoice] {
        &self.choices
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &TuningChoice)> {
        self.choices.iter().enumerate()
    }
}
