//! Per-name selection pools.
//!
//! A pool is filled from the alias list the first time its name is queried
//! and then reused; only the scheduler cursor moves afterwards. Population
//! and selection happen under the pool's own lock, so concurrent first
//! queries fill it exactly once.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::classifier::{TargetClassifier, TargetGroup};
use crate::metrics;
use crate::weights::{normalize_name, WeightEntry};
use crate::wrr::SmoothWrr;

/// A classified alias target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Target name.
    pub target: String,
    /// Fleet the target belongs to.
    pub group: TargetGroup,
}

/// Weighted scheduler state for one name.
#[derive(Debug, Default)]
pub struct SelectionPool {
    wrr: Mutex<SmoothWrr<Candidate>>,
}

impl SelectionPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill the pool from `targets` if it is empty, then pick the next target.
    ///
    /// `None` means the scheduler had nothing to offer (no targets, or
    /// several targets all weighted zero).
    pub fn next_or_populate<'a, I>(
        &self,
        targets: I,
        weights: &WeightEntry,
        classifier: &TargetClassifier,
    ) -> Option<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut wrr = self.wrr.lock();
        if wrr.is_empty() {
            for target in targets {
                let group = classifier.classify(target);
                let weight = weights.weight_for(group);
                wrr.add(
                    Candidate {
                        target: target.to_string(),
                        group,
                    },
                    weight,
                );
            }
            debug!(
                key = %weights.key,
                candidates = wrr.len(),
                gcd = wrr.gcd(),
                max_weight = wrr.max_weight(),
                "populated selection pool"
            );
            metrics::record_pool_populated(wrr.len());
        }
        wrr.next().map(|c| c.target.clone())
    }

    /// Restart the weighted sequence, keeping candidates.
    pub fn reset(&self) {
        self.wrr.lock().reset();
    }

    /// Drop every candidate; the next query repopulates.
    pub fn remove_all(&self) {
        self.wrr.lock().remove_all();
    }

    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.wrr.lock().len()
    }

    /// True when the pool has not been populated.
    pub fn is_empty(&self) -> bool {
        self.wrr.lock().is_empty()
    }

    /// Snapshot of the candidates and their weights.
    pub fn candidates(&self) -> Vec<(Candidate, u32)> {
        self.wrr
            .lock()
            .iter()
            .map(|(c, w)| (c.clone(), w))
            .collect()
    }
}

/// Pools keyed by normalized alias owner name.
#[derive(Debug, Default)]
pub struct PoolRegistry {
    pools: RwLock<HashMap<String, Arc<SelectionPool>>>,
}

impl PoolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the pool for `key`, creating an empty one on first use.
    pub fn get_or_create(&self, key: &str) -> Arc<SelectionPool> {
        let key = normalize_name(key);
        if let Some(pool) = self.pools.read().get(&key) {
            return Arc::clone(pool);
        }
        let mut pools = self.pools.write();
        Arc::clone(pools.entry(key).or_default())
    }

    /// Look up an existing pool.
    pub fn get(&self, key: &str) -> Option<Arc<SelectionPool>> {
        self.pools.read().get(&normalize_name(key)).cloned()
    }

    /// Clear the pool for `key`. Returns true if it existed.
    pub fn invalidate(&self, key: &str) -> bool {
        match self.pools.read().get(&normalize_name(key)) {
            Some(pool) => {
                pool.remove_all();
                true
            }
            None => false,
        }
    }

    /// Clear every pool. Returns how many there were.
    pub fn invalidate_all(&self) -> usize {
        let pools = self.pools.read();
        for pool in pools.values() {
            pool.remove_all();
        }
        pools.len()
    }

    /// Number of pools created so far.
    pub fn len(&self) -> usize {
        self.pools.read().len()
    }

    /// True when no pool has been created.
    pub fn is_empty(&self) -> bool {
        self.pools.read().is_empty()
    }
}
