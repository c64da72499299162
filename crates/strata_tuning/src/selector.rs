//! Choice selection under a memory budget.
//!
//! The greedy selector sorts choices by ascending benefit and walks two
//! cursors inward: the `worst` cursor evicts installed choices whose
//! removal is worth more than creating the current best, the `best` cursor
//! creates new choices, sacrificing a run of low-benefit installed choices
//! when the budget requires it. The underlying problem is a bounded
//! knapsack; this is a deliberate greedy with local exchanges, and the
//! invariants it must uphold are budget safety, monotone benefit and
//! invalidation respect, not optimality.

use std::collections::BTreeSet;

use tracing::debug;

use crate::choice::ChoiceSet;
use crate::operation::TuningOperation;

/// Turns one round's choices into an ordered operation sequence that
/// transitions the system from its current index set to the selected one.
pub trait TuningSelector: Send {
    fn select(&self, choices: &ChoiceSet, memory_budget_bytes: u64) -> Vec<TuningOperation>;
}

/// Greedy selector with local exchanges. One operation is emitted per
/// considered choice in walk order; keeping an installed choice or
/// rejecting a hypothetical one yields a `NoOp`, which the operation
/// planner later filters out.
pub struct GreedySelector {
    /// Benefit debit per unit of missing confidence (λ). Zero ranks
    /// choices by raw saved work.
    pub confidence_penalty_lambda: f32,
}

impl GreedySelector {
    pub fn new(confidence_penalty_lambda: f32) -> Self {
        Self {
            confidence_penalty_lambda,
        }
    }
}

impl Default for GreedySelector {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl TuningSelector for GreedySelector {
    fn select(&self, choices: &ChoiceSet, memory_budget_bytes: u64) -> Vec<TuningOperation> {
        let mut operations = Vec::with_capacity(choices.len());
        if choices.is_empty() {
            return operations;
        }

        let lambda = self.confidence_penalty_lambda;
        let benefit = |idx: usize| choices.get(idx).benefit(lambda);

        // Ascending benefit; at equal benefit higher confidence ranks as
        // better (later); remaining ties in ascending site order.
        let mut order: Vec<usize> = (0..choices.len()).collect();
        order.sort_by(|&a, &b| {
            benefit(a)
                .total_cmp(&benefit(b))
                .then_with(|| {
                    choices
                        .get(a)
                        .confidence()
                        .total_cmp(&choices.get(b).confidence())
                })
                .then_with(|| choices.get(a).column_ref().cmp(choices.get(b).column_ref()))
        });

        let mut current_memory: i128 = choices
            .choices()
            .iter()
            .filter(|c| c.is_currently_chosen())
            .map(|c| c.cost() as i128)
            .sum();
        let budget = memory_budget_bytes as i128;

        let mut accepted: Vec<usize> = Vec::new();
        let mut dropped: BTreeSet<usize> = BTreeSet::new();
        let mut worst = 0usize;
        let mut best = order.len() - 1;

        loop {
            if best < worst {
                break;
            }
            let w = order[worst];
            let b = order[best];

            if benefit(w) < 0.0 && -benefit(w) > benefit(b) {
                // Evicting the worst choice is more valuable than creating
                // the best one.
                if choices.get(w).is_currently_chosen() {
                    debug!(choice = %choices.get(w), "plan: drop worst installed index");
                    current_memory -= choices.get(w).cost() as i128;
                    dropped.insert(w);
                }
                operations.push(choices.get(w).reject());
                worst += 1;
                continue;
            }

            // An already-accepted choice excludes this one entirely.
            let excluded = accepted
                .iter()
                .any(|a| choices.invalidated_by(b).contains(a));
            if excluded {
                debug!(choice = %choices.get(b), "plan: skip invalidated choice");
                operations.push(choices.get(b).reject());
                if best == 0 {
                    break;
                }
                best -= 1;
                continue;
            }

            if choices.get(b).is_currently_chosen() {
                // Keep the installed index.
                operations.push(choices.get(b).accept());
                accepted.push(b);
                if best == 0 {
                    break;
                }
                best -= 1;
                continue;
            }

            // Determine the minimum benefit that must be sacrificed to free
            // enough budget for the new index.
            let need = choices.get(b).cost() as i128 + current_memory - budget;
            let mut sacrificed_benefit = 0.0f32;
            let mut obtained: i128 = 0;
            let mut sacrifice = worst;
            while obtained < need && sacrifice < best {
                let s = order[sacrifice];
                if choices.get(s).is_currently_chosen() {
                    sacrificed_benefit += benefit(s);
                    obtained += choices.get(s).cost() as i128;
                }
                sacrifice += 1;
            }

            if obtained >= need && sacrificed_benefit <= benefit(b) {
                // Drop the sacrificed installed indexes, then create.
                for d in worst..sacrifice {
                    let s = order[d];
                    if choices.get(s).is_currently_chosen() {
                        debug!(choice = %choices.get(s), "plan: drop installed index for exchange");
                        current_memory -= choices.get(s).cost() as i128;
                        dropped.insert(s);
                        operations.push(choices.get(s).reject());
                    }
                }
                worst = sacrifice;
                debug!(choice = %choices.get(b), "plan: create new index");
                current_memory += choices.get(b).cost() as i128;
                accepted.push(b);
                operations.push(choices.get(b).accept());
            } else {
                operations.push(choices.get(b).reject());
            }
            if best == 0 {
                break;
            }
            best -= 1;
        }

        // The walk above starts from the current chosen-set; if that set
        // already exceeded the budget and everything in it looked useful,
        // nothing was freed. Shed the least beneficial retained choices
        // until the selection fits.
        while current_memory > budget {
            let victim = order.iter().copied().find(|&i| {
                choices.get(i).is_currently_chosen() && !dropped.contains(&i)
            });
            let Some(v) = victim else { break };
            debug!(choice = %choices.get(v), "plan: drop retained index to meet budget");
            current_memory -= choices.get(v).cost() as i128;
            dropped.insert(v);
            operations.push(choices.get(v).reject());
        }

        operations
    }
}
