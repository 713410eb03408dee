//! B-tree operation statistics.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Write-path counters tracked by a [`BTree`](crate::BTree).
///
/// Only inserts update these, and inserts already hold `&mut BTree`, so
/// there is a single writer at a time. Lookups never touch them, including
/// reads through a [`SharedBTree`](crate::SharedBTree); callers who want
/// hit/miss figures count the `Option` results themselves.
///
/// The fields are atomic so the stats can be read and reset through a
/// shared reference.
///
/// # Memory Ordering
/// Every counter uses `Ordering::Relaxed`: counters are independent and
/// only need atomicity, not ordering against each other.
///
/// # Example
/// ```
/// use arenadb::TreeStats;
/// use std::sync::atomic::Ordering;
///
/// let stats = TreeStats::new();
/// stats.inserts.fetch_add(1, Ordering::Relaxed);
/// assert_eq!(stats.inserts.load(Ordering::Relaxed), 1);
/// ```
#[derive(Debug)]
pub struct TreeStats {
    /// Successful inserts.
    pub inserts: AtomicU64,

    /// Child splits, including those under a new root.
    pub splits: AtomicU64,

    /// Root splits. Each one added a level to the tree.
    pub root_splits: AtomicU64,

    /// Inserts refused because the arena was exhausted.
    pub exhausted: AtomicU64,
}

impl TreeStats {
    /// Create a new stats tracker with all counters at zero.
    pub fn new() -> Self {
        Self {
            inserts: AtomicU64::new(0),
            splits: AtomicU64::new(0),
            root_splits: AtomicU64::new(0),
            exhausted: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn record(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Average splits per successful insert.
    pub fn splits_per_insert(&self) -> f64 {
        self.snapshot().splits_per_insert()
    }

    /// Get a snapshot of current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            inserts: self.inserts.load(Ordering::Relaxed),
            splits: self.splits.load(Ordering::Relaxed),
            root_splits: self.root_splits.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.inserts.store(0, Ordering::Relaxed);
        self.splits.store(0, Ordering::Relaxed);
        self.root_splits.store(0, Ordering::Relaxed);
        self.exhausted.store(0, Ordering::Relaxed);
    }
}

impl Default for TreeStats {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time copy of [`TreeStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub inserts: u64,
    pub splits: u64,
    pub root_splits: u64,
    pub exhausted: u64,
}

impl StatsSnapshot {
    /// Average splits per successful insert (0.0 when nothing was inserted).
    pub fn splits_per_insert(&self) -> f64 {
        if self.inserts == 0 {
            0.0
        } else {
            self.splits as f64 / self.inserts as f64
        }
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ inserts: {}, splits: {}, root_splits: {}, exhausted: {}, splits/insert: {:.3} }}",
            self.inserts,
            self.splits,
            self.root_splits,
            self.exhausted,
            self.splits_per_insert()
        )
    }
}
