//! Thread-shareable wrapper around a [`BTree`].
//!
//! The tree itself does no locking. [`SharedBTree`] layers the
//! single-writer / many-readers discipline on top: one `RwLock` guards the
//! whole tree, every insert holds the write lock for its full duration, and
//! reads proceed in parallel only while no insert is in flight.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::common::{Result, TreeConfig};
use crate::index::btree::BTree;

/// A cloneable, thread-safe handle to one [`BTree`].
///
/// # Example
/// ```
/// use arenadb::SharedBTree;
/// use std::thread;
///
/// let tree: SharedBTree<u64, u64> = SharedBTree::new(1 << 20, 8)?;
///
/// let writer = tree.clone();
/// thread::spawn(move || {
///     for k in 0..100 {
///         writer.insert(k, k * 2).unwrap();
///     }
/// })
/// .join()
/// .unwrap();
///
/// assert_eq!(tree.get(&21), Some(42));
/// # Ok::<(), arenadb::Error>(())
/// ```
pub struct SharedBTree<K, V> {
    inner: Arc<RwLock<BTree<K, V>>>,
}

impl<K: Ord + Copy + Default, V: Copy + Default> SharedBTree<K, V> {
    /// Create an empty shared tree.
    pub fn new(capacity_bytes: usize, order: usize) -> Result<Self> {
        Ok(Self::from_tree(BTree::new(capacity_bytes, order)?))
    }

    /// Create an empty shared tree from a [`TreeConfig`].
    pub fn with_config(config: TreeConfig) -> Result<Self> {
        Ok(Self::from_tree(BTree::with_config(config)?))
    }

    /// Wrap an existing tree.
    pub fn from_tree(tree: BTree<K, V>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(tree)),
        }
    }

    /// Insert under the write lock.
    ///
    /// # Errors
    /// - `Error::ArenaExhausted` as for [`BTree::insert`]
    pub fn insert(&self, key: K, value: V) -> Result<()> {
        self.inner.write().insert(key, value)
    }

    /// Copy the value for `key` out under the read lock.
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.read().search(key).copied()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Acquire the read lock for several lookups in one critical section.
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, BTree<K, V>> {
        self.inner.read()
    }

    /// Acquire the write lock for a batch of inserts.
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, BTree<K, V>> {
        self.inner.write()
    }
}

impl<K, V> Clone for SharedBTree<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
