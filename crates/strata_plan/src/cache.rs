//! Plan cache with priority-ordered iteration.
//!
//! The tuner depends only on the `PlanCache` capability: a read-consistent,
//! priority-descending enumeration of `(key, plan, frequency, priority)`
//! tuples. The engine's concrete cache is GDFS (greedy-dual frequency
//! size); other cache policies can be adapted as long as they produce a
//! stable ordering.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::logical::LogicalNode;
use crate::physical::PhysicalNode;

/// A cached plan in either shape. Logical plans are preferred for tuning
/// analysis; physical plans are the fallback.
#[derive(Debug, Clone)]
pub enum PlanHandle {
    Logical(Arc<LogicalNode>),
    Physical(Arc<PhysicalNode>),
}

/// One snapshot entry from the cache.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub plan: PlanHandle,
    pub frequency: u64,
    pub priority: f64,
}

/// Read surface the tuner consumes. Implementations must return entries in
/// priority-descending order with a stable tie-break so that repeated
/// snapshots of an unchanged cache enumerate identically.
pub trait PlanCache: Send + Sync {
    /// Copy out all entries under the cache's read lock, ordered by
    /// descending priority (ties broken by ascending key).
    fn ordered_entries(&self) -> Vec<CacheEntry>;

    /// Drop all entries. Called after index DDL, since cached plans may
    /// reference the old physical layout.
    fn clear(&self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct GdfsSlot {
    plan: PlanHandle,
    frequency: u64,
    priority: f64,
}

struct GdfsState {
    slots: HashMap<String, GdfsSlot>,
    /// Monotone floor raised to the evicted entry's priority on each
    /// eviction, so long-resident entries age relative to new arrivals.
    inflation: f64,
}

/// Greedy-Dual Frequency Size cache over unit-size entries:
/// `priority = inflation + frequency`.
pub struct GdfsCache {
    capacity: usize,
    state: RwLock<GdfsState>,
}

impl GdfsCache {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "cache capacity must be positive");
        Self {
            capacity,
            state: RwLock::new(GdfsState {
                slots: HashMap::new(),
                inflation: 0.0,
            }),
        }
    }

    /// Insert a plan or record another hit for an existing key.
    pub fn put(&self, key: impl Into<String>, plan: PlanHandle) {
        let key = key.into();
        let mut state = self.state.write();
        let inflation = state.inflation;
        if let Some(slot) = state.slots.get_mut(&key) {
            slot.plan = plan;
            slot.frequency += 1;
            slot.priority = inflation + slot.frequency as f64;
            return;
        }
        if state.slots.len() >= self.capacity {
            Self::evict_lowest(&mut state);
        }
        let priority = state.inflation + 1.0;
        state.slots.insert(
            key,
            GdfsSlot {
                plan,
                frequency: 1,
                priority,
            },
        );
    }

    /// Fetch a plan, bumping its frequency and priority.
    pub fn get(&self, key: &str) -> Option<PlanHandle> {
        let mut state = self.state.write();
        let inflation = state.inflation;
        let slot = state.slots.get_mut(key)?;
        slot.frequency += 1;
        slot.priority = inflation + slot.frequency as f64;
        Some(slot.plan.clone())
    }

    fn evict_lowest(state: &mut GdfsState) {
        let victim = state
            .slots
            .iter()
            .min_by(|(ka, a), (kb, b)| {
                a.priority
                    .partial_cmp(&b.priority)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| ka.cmp(kb))
            })
            .map(|(k, slot)| (k.clone(), slot.priority));
        if let Some((key, priority)) = victim {
            state.slots.remove(&key);
            state.inflation = state.inflation.max(priority);
        }
    }
}

impl PlanCache for GdfsCache {
    fn ordered_entries(&self) -> Vec<CacheEntry> {
        let state = self.state.read();
        let mut entries: Vec<CacheEntry> = state
            .slots
            .iter()
            .map(|(key, slot)| CacheEntry {
                key: key.clone(),
                plan: slot.plan.clone(),
                frequency: slot.frequency,
                priority: slot.priority,
            })
            .collect();
        entries.sort_by(|a, b| {
            b.priority
                .partial_cmp(&a.priority)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.key.cmp(&b.key))
        });
        entries
    }

    fn clear(&self) {
        let mut state = self.state.write();
        state.slots.clear();
        state.inflation = 0.0;
    }

    fn len(&self) -> usize {
        self.state.read().slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(name: &str) -> PlanHandle {
        PlanHandle::Logical(LogicalNode::stored_table(name))
    }

    #[test]
    fn test_put_and_get() {
        let cache = GdfsCache::new(4);
        cache.put("q1", plan("t"));
        assert_eq!(cache.len(), 1);
        assert!(cache.get("q1").is_some());
        assert!(cache.get("q2").is_none());
    }

    #[test]
    fn test_hit_bumps_priority() {
        let cache = GdfsCache::new(4);
        cache.put("a", plan("t"));
        cache.put("b", plan("t"));
        cache.get("b");
        cache.get("b");
        let entries = cache.ordered_entries();
        assert_eq!(entries[0].key, "b");
        assert_eq!(entries[0].frequency, 3);
        assert!(entries[0].priority > entries[1].priority);
    }

    #[test]
    fn test_ordered_ties_break_by_key() {
        let cache = GdfsCache::new(4);
        cache.put("z", plan("t"));
        cache.put("a", plan("t"));
        let entries = cache.ordered_entries();
        assert_eq!(entries[0].key, "a");
        assert_eq!(entries[1].key, "z");
    }

    #[test]
    fn test_eviction_removes_lowest_and_raises_inflation() {
        let cache = GdfsCache::new(2);
        cache.put("hot", plan("t"));
        cache.get("hot");
        cache.get("hot");
        cache.put("cold", plan("t"));
        // Third insert evicts "cold" (priority 1 vs hot's 3).
        cache.put("new", plan("t"));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("cold").is_none());
        // The fresh entry starts above the evicted priority floor.
        let entries = cache.ordered_entries();
        let fresh = entries.iter().find(|e| e.key == "new").unwrap();
        assert!(fresh.priority >= 2.0);
    }

    #[test]
    fn test_clear() {
        let cache = GdfsCache::new(2);
        cache.put("a", plan("t"));
        cache.clear();
        assert!(cache.is_empty());
    }
}
