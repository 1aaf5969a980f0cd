//! Smooth weighted round-robin scheduling.
//!
//! This is the LVS weighted round-robin algorithm: weights are reduced by
//! their GCD and the scheduler walks the entries repeatedly with a
//! decreasing weight threshold, so a heavy entry is interleaved with lighter
//! ones instead of being picked in one contiguous run.
//!
//! ```text
//! weights  X=2 Y=2 Z=1   (gcd 1, max 2, cycle 5)
//! cw=2     X   Y   -
//! cw=1     X   Y   Z
//! => X Y X Y Z | X Y X Y Z | ...
//! ```

#[derive(Debug, Clone)]
struct Weighted<T> {
    item: T,
    weight: u32,
}

/// Weighted round-robin scheduler over items of type `T`.
///
/// Not synchronized; callers share it behind a lock (see
/// [`SelectionPool`](crate::pool::SelectionPool)).
#[derive(Debug, Clone)]
pub struct SmoothWrr<T> {
    entries: Vec<Weighted<T>>,
    /// GCD of all positive weights, 0 until one is added.
    gcd: u32,
    max_weight: u32,
    /// Index of the last returned entry; `None` before the first call.
    cursor: Option<usize>,
    /// Current weight threshold.
    current: i64,
}

impl<T> Default for SmoothWrr<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SmoothWrr<T> {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            gcd: 0,
            max_weight: 0,
            cursor: None,
            current: 0,
        }
    }

    /// Register an item with the given weight.
    pub fn add(&mut self, item: T, weight: u32) {
        if weight > 0 {
            if self.gcd == 0 {
                self.gcd = weight;
                self.max_weight = weight;
                self.reset();
            } else {
                self.gcd = gcd(self.gcd, weight);
                self.max_weight = self.max_weight.max(weight);
            }
        }
        self.entries.push(Weighted { item, weight });
    }

    /// Return the next item in the weighted sequence.
    ///
    /// `None` when there are no entries, or when there are several entries
    /// and all weights are zero. A single entry is always returned whatever
    /// its weight.
    pub fn next(&mut self) -> Option<&T> {
        let n = self.entries.len();
        match n {
            0 => return None,
            1 => return Some(&self.entries[0].item),
            _ => {}
        }
        if self.max_weight == 0 {
            return None;
        }

        // cw never exceeds max_weight and the max-weight entry satisfies it,
        // so with max_weight > 0 one pass over the entries always returns.
        loop {
            let i = match self.cursor {
                Some(i) => (i + 1) % n,
                None => 0,
            };
            self.cursor = Some(i);

            if i == 0 {
                self.current -= i64::from(self.gcd);
                if self.current <= 0 {
                    self.current = i64::from(self.max_weight);
                }
            }

            if i64::from(self.entries[i].weight) >= self.current {
                return Some(&self.entries[i].item);
            }
        }
    }

    /// Restart the sequence without dropping entries.
    pub fn reset(&mut self) {
        self.cursor = None;
        self.current = 0;
    }

    /// Drop all entries and scheduler state.
    pub fn remove_all(&mut self) {
        self.entries.clear();
        self.gcd = 0;
        self.max_weight = 0;
        self.reset();
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entries are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// GCD of the positive weights (0 if none).
    pub fn gcd(&self) -> u32 {
        self.gcd
    }

    /// Largest registered weight.
    pub fn max_weight(&self) -> u32 {
        self.max_weight
    }

    /// Iterate over `(item, weight)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&T, u32)> {
        self.entries.iter().map(|e| (&e.item, e.weight))
    }
}

fn gcd(mut x: u32, mut y: u32) -> u32 {
    while y != 0 {
        let t = x % y;
        x = y;
        y = t;
    }
    x
}
