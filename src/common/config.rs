//! Configuration constants and tree settings for ArenaDB.

use super::error::{Error, Result};

/// Target cache line size in bytes.
///
/// Every key, value and child row in the arena starts on a boundary of this
/// size, and the per-node footprint is rounded up to a multiple of it.
pub const CACHE_LINE_SIZE: usize = 64;

/// Default arena capacity (64 MiB).
pub const DEFAULT_ARENA_CAPACITY: usize = 64 * 1024 * 1024;

/// Default tree order. A node holds at most `2 * order` keys.
pub const DEFAULT_ORDER: usize = 32;

/// Smallest usable order.
///
/// At order 1 a split leaves the right sibling with no keys, so internal
/// nodes with a single child stack up and the tree degenerates into a list.
pub const MIN_ORDER: usize = 2;

/// Largest order whose key count still fits the `u16` node counter.
pub const MAX_ORDER: usize = (u16::MAX / 2) as usize;

/// Settings for building a [`BTree`](crate::BTree).
///
/// # Example
/// ```
/// use arenadb::TreeConfig;
///
/// let config = TreeConfig::default()
///     .with_order(4)
///     .with_arena_capacity(1024 * 1024);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.max_keys(), 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeConfig {
    /// Total bytes the node arena may occupy.
    pub arena_capacity_bytes: usize,
    /// Fan-out parameter.
    pub order: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            arena_capacity_bytes: DEFAULT_ARENA_CAPACITY,
            order: DEFAULT_ORDER,
        }
    }
}

impl TreeConfig {
    /// Set the arena capacity in bytes.
    pub fn with_arena_capacity(mut self, bytes: usize) -> Self {
        self.arena_capacity_bytes = bytes;
        self
    }

    /// Set the tree order.
    pub fn with_order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }

    /// Maximum keys per node.
    #[inline]
    pub fn max_keys(&self) -> usize {
        self.order * 2
    }

    /// Maximum children per internal node.
    #[inline]
    pub fn max_children(&self) -> usize {
        self.max_keys() + 1
    }

    /// Check the order is usable.
    ///
    /// Capacity is checked by the arena, which knows the node footprint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOrder`] unless `MIN_ORDER <= order <= MAX_ORDER`.
    pub fn validate(&self) -> Result<()> {
        if self.order < MIN_ORDER || self.order > MAX_ORDER {
            return Err(Error::InvalidOrder(self.order));
        }
        Ok(())
    }
}

/// Round `bytes` up to the next multiple of [`CACHE_LINE_SIZE`].
#[inline]
pub const fn align_to_cache_line(bytes: usize) -> usize {
    (bytes + CACHE_LINE_SIZE - 1) & !(CACHE_LINE_SIZE - 1)
}

/// Number of `elem_size`-byte slots a row of `slots` elements is padded to
/// so that consecutive rows each start on a cache line.
///
/// Zero-sized elements need no padding.
pub const fn cache_aligned_row_len(slots: usize, elem_size: usize) -> usize {
    if elem_size == 0 {
        return slots;
    }
    let mut a = CACHE_LINE_SIZE;
    let mut b = elem_size;
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    // smallest slot count whose byte length is a multiple of the line
    let step = CACHE_LINE_SIZE / a;
    slots.div_ceil(step) * step
}
