//! Picks one alias target per lookup.
//!
//! ```text
//! alias records ─▶ weight entry for owner or apex?
//!                    ├─ yes ─▶ owner's pool (populate once) ─▶ smooth WRR ─▶ target
//!                    │                                   └─ none ─▶ first record
//!                    └─ no  ─▶ shuffle ─▶ first of shuffled records
//! ```

use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::classifier::TargetClassifier;
use crate::metrics::{self, SelectionMethod};
use crate::pool::PoolRegistry;
use crate::shuffle::{shuffle_first, IdSource};
use crate::state::AliasRecord;
use crate::weights::WeightTable;

/// Outcome of a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Chosen target name.
    pub target: String,
    /// How it was chosen.
    pub method: SelectionMethod,
}

/// Chooses a single alias target for a queried name.
///
/// Holds the weight table, the per-name pools and the id source explicitly,
/// so several selectors can coexist (one per test, for instance).
pub struct CnameSelector<S = StdRng> {
    weights: RwLock<Arc<WeightTable>>,
    pools: PoolRegistry,
    classifier: TargetClassifier,
    ids: Mutex<S>,
}

impl CnameSelector<StdRng> {
    /// Create a selector with an entropy-seeded id source.
    pub fn new(weights: WeightTable, classifier: TargetClassifier) -> Self {
        Self::with_id_source(weights, classifier, StdRng::from_entropy())
    }
}

impl<S: IdSource> CnameSelector<S> {
    /// Create a selector with the given id source.
    pub fn with_id_source(weights: WeightTable, classifier: TargetClassifier, ids: S) -> Self {
        Self {
            weights: RwLock::new(Arc::new(weights)),
            pools: PoolRegistry::new(),
            classifier,
            ids: Mutex::new(ids),
        }
    }

    /// Pick a target from `records`, the alias records of one name in
    /// `origin`'s zone.
    ///
    /// Returns `None` only when `records` is empty.
    pub fn select(&self, origin: &str, records: &[AliasRecord]) -> Option<Selection> {
        let first = records.first()?;
        let owner = first.name.as_str();

        let weights = self.weights();
        let entry = weights.get(owner).or_else(|| weights.get(origin));

        let selection = match entry {
            Some(entry) => {
                // One pool per owner name; the entry may be shared via the apex.
                let pool = self.pools.get_or_create(owner);
                let targets = records.iter().map(|r| r.target.as_str());
                match pool.next_or_populate(targets, entry, &self.classifier) {
                    Some(target) => Selection {
                        target,
                        method: SelectionMethod::Weighted,
                    },
                    None => {
                        debug!(
                            name = %owner,
                            key = %entry.key,
                            "weighted pool had no selection, using first record"
                        );
                        Selection {
                            target: first.target.clone(),
                            method: SelectionMethod::WeightedDefault,
                        }
                    }
                }
            }
            None => {
                let mut shuffled = records.to_vec();
                let mut ids = self.ids.lock();
                let target = shuffle_first(&mut shuffled, &mut *ids)
                    .map(|r| r.target.clone())
                    .unwrap_or_else(|| first.target.clone());
                Selection {
                    target,
                    method: SelectionMethod::Shuffled,
                }
            }
        };

        trace!(
            name = %owner,
            target = %selection.target,
            method = selection.method.as_str(),
            "selected alias target"
        );
        metrics::record_selection(selection.method);
        Some(selection)
    }

    /// Current weight table.
    pub fn weights(&self) -> Arc<WeightTable> {
        Arc::clone(&self.weights.read())
    }

    /// Swap in a new weight table and clear every pool.
    pub fn replace_weights(&self, table: WeightTable) {
        let entries = table.len();
        *self.weights.write() = Arc::new(table);
        let cleared = self.pools.invalidate_all();
        debug!(entries, pools = cleared, "replaced weight table");
        metrics::record_pools_invalidated(cleared);
    }

    /// Clear the pools tied to a reloaded zone: the apex and the given
    /// owner names.
    pub fn invalidate_zone<'a>(&self, origin: &str, owners: impl IntoIterator<Item = &'a str>) {
        let mut cleared = usize::from(self.pools.invalidate(origin));
        for owner in owners {
            cleared += usize::from(self.pools.invalidate(owner));
        }
        debug!(origin, pools = cleared, "invalidated zone pools");
        metrics::record_pools_invalidated(cleared);
    }

    /// Number of pools created so far.
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    /// Classifier in use.
    pub fn classifier(&self) -> &TargetClassifier {
        &self.classifier
    }
}
