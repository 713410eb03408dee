//! BTree - arena-backed ordered index.
//!
//! Insertion follows the top-down, split-before-descend discipline: any full
//! child is split *before* the insert walks into it, so the node being
//! modified always has room and a split never has to travel back up.

use std::fmt;

use tracing::{debug, trace, warn};

use crate::common::{Error, NodeId, Result, TreeConfig};
use crate::index::btree::iter::Iter;
use crate::index::btree::stats::TreeStats;
use crate::storage::NodeArena;

/// An in-memory B-tree of order `order` over a fixed-capacity arena.
///
/// # Architecture
/// ```text
/// ┌────────────────────────────────────────────────────────────┐
/// │                          BTree                             │
/// │   root: NodeId ──┐                                         │
/// │                  ▼                                         │
/// │  ┌──────────────────────────────────────────────────────┐  │
/// │  │                 NodeArena (owned)                    │  │
/// │  │  [Node0] [Node1] [Node2] ... [NodeN)   never freed   │  │
/// │  └──────────────────────────────────────────────────────┘  │
/// └────────────────────────────────────────────────────────────┘
/// ```
///
/// Each node holds up to `2 * order` keys. Splitting a full node keeps
/// `order` keys on the left, promotes the key at index `order`, and moves
/// the remaining `order - 1` keys into a new right sibling.
///
/// # Duplicates
/// Inserting a key that is already present adds a second entry. Iteration
/// yields every entry; [`search`](Self::search) returns the first match met
/// on the way down, which for duplicates sharing a leaf is the oldest one.
///
/// # Type bounds
/// Keys need `Ord + Copy` and values `Copy`, as expected of a fixed-size
/// index. Both additionally need `Default`: the arena fills every slot of a
/// node row when the node is allocated, and `Default` supplies those
/// placeholder values. Unoccupied slots are never read. A key type without a
/// natural default can derive one:
/// ```
/// use arenadb::BTree;
///
/// #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
/// struct OrderId(u32);
///
/// let mut tree: BTree<OrderId, f64> = BTree::new(1 << 16, 2)?;
/// tree.insert(OrderId(7), 101.5)?;
/// assert_eq!(tree.search(&OrderId(7)), Some(&101.5));
/// # Ok::<(), arenadb::Error>(())
/// ```
///
/// # Thread Safety
/// No internal locking. Wrap the tree in a
/// [`SharedBTree`](crate::SharedBTree) to share it between threads.
///
/// # Example
/// ```
/// use arenadb::BTree;
///
/// let mut tree: BTree<u64, u64> = BTree::new(1 << 20, 4)?;
/// tree.insert(42, 4200)?;
///
/// assert_eq!(tree.search(&42), Some(&4200));
/// assert_eq!(tree.search(&7), None);
/// # Ok::<(), arenadb::Error>(())
/// ```
pub struct BTree<K, V> {
    arena: NodeArena<K, V>,
    root: NodeId,
    order: usize,
    len: usize,
    /// Levels from root to leaf; a lone root leaf is height 1.
    height: usize,
    stats: TreeStats,
}

impl<K: Ord + Copy + Default, V: Copy + Default> BTree<K, V> {
    /// Create an empty tree whose arena holds `capacity_bytes`.
    ///
    /// # Errors
    /// - `Error::InvalidOrder` if `order` is below `MIN_ORDER` (2) or too large
    /// - `Error::ArenaTooSmall` if the arena cannot hold one node
    /// - `Error::ArenaAllocation` if the arena memory cannot be reserved
    pub fn new(capacity_bytes: usize, order: usize) -> Result<Self> {
        Self::with_config(
            TreeConfig::default()
                .with_arena_capacity(capacity_bytes)
                .with_order(order),
        )
    }

    /// Create an empty tree from a [`TreeConfig`].
    pub fn with_config(config: TreeConfig) -> Result<Self> {
        config.validate()?;

        let mut arena = NodeArena::new(config.arena_capacity_bytes, config.order)?;
        let root = arena.allocate_node(true)?;

        debug!(
            order = config.order,
            max_nodes = arena.max_nodes(),
            "btree created"
        );

        Ok(Self {
            arena,
            root,
            order: config.order,
            len: 0,
            height: 1,
            stats: TreeStats::new(),
        })
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Look up `key`.
    ///
    /// Returns `None` when the key is absent; a miss is not an error.
    /// Lookups write nothing, not even statistics.
    pub fn search(&self, key: &K) -> Option<&V> {
        self.locate(key)
            .map(|(id, pos)| &self.arena.value_row(id)[pos])
    }

    /// Look up `key` for in-place update of its value.
    pub fn search_mut(&mut self, key: &K) -> Option<&mut V> {
        let (id, pos) = self.locate(key)?;
        Some(&mut self.arena.value_row_mut(id)[pos])
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &K) -> bool {
        self.search(key).is_some()
    }

    /// Node and slot holding `key`, walking down from the root.
    fn locate(&self, key: &K) -> Option<(NodeId, usize)> {
        let mut id = self.root;
        loop {
            let node = self.arena.node(id);
            let pos = node.find_position(key);

            if pos < node.key_count() && node.keys()[pos] == *key {
                return Some((id, pos));
            }
            if node.is_leaf() {
                return None;
            }
            id = node.children()[pos];
        }
    }

    // ========================================================================
    // Insertion
    // ========================================================================

    /// Insert `key` with `value`.
    ///
    /// A key that is already present gets a second entry.
    ///
    /// # Errors
    /// - `Error::ArenaExhausted` if the arena cannot supply the nodes this
    ///   insert would split into. Nothing is modified in that case.
    pub fn insert(&mut self, key: K, value: V) -> Result<()> {
        // An insert allocates at most `height + 1` nodes; only walk the
        // path to count them once the arena is that close to full.
        if !self.arena.has_room_for(self.height + 1) {
            let needed = self.nodes_needed_for(&key);
            if !self.arena.has_room_for(needed) {
                TreeStats::record(&self.stats.exhausted);
                warn!(
                    needed,
                    remaining = self.arena.remaining_nodes(),
                    len = self.len,
                    "insert refused: node arena exhausted"
                );
                return Err(Error::ArenaExhausted {
                    capacity_nodes: self.arena.max_nodes(),
                    requested: needed,
                });
            }
        }

        if self.arena.node(self.root).is_full() {
            self.grow_root()?;
        }
        self.insert_non_full(self.root, key, value)?;

        self.len += 1;
        TreeStats::record(&self.stats.inserts);
        Ok(())
    }

    /// Nodes an insert of `key` will allocate.
    ///
    /// Preemptive splitting splits every full node on the search path, and
    /// a split never changes which nodes lie below the path, so the count is
    /// the number of full nodes on the current path, plus one for a new root.
    /// That is never more than `height + 1`.
    ///
    /// This costs a second root-to-leaf descent, so `insert` only calls it
    /// when fewer than `height + 1` nodes remain in the arena.
    fn nodes_needed_for(&self, key: &K) -> usize {
        let mut node = self.arena.node(self.root);
        let mut needed = usize::from(node.is_full());
        loop {
            if node.is_full() {
                needed += 1;
            }
            if node.is_leaf() {
                return needed;
            }
            let pos = node.find_position(key);
            node = self.arena.node(node.children()[pos]);
        }
    }

    /// Put a new internal root above the full root and split the old one.
    fn grow_root(&mut self) -> Result<()> {
        let old_root = self.root;
        let new_root = self.arena.allocate_node(false)?;
        self.arena.child_row_mut(new_root)[0] = old_root;

        self.split_child(new_root, 0)?;

        self.root = new_root;
        self.height += 1;
        TreeStats::record(&self.stats.root_splits);
        debug!(root = %new_root, height = self.height, "root split");
        Ok(())
    }

    /// Split the full child at `child_index`, promoting its median into
    /// `parent`.
    ///
    /// `parent` must not be full. The left half keeps `order` keys, the key
    /// at index `order` moves up, and the right sibling takes the last
    /// `order - 1`.
    fn split_child(&mut self, parent: NodeId, child_index: usize) -> Result<()> {
        let child = self.arena.child_row(parent)[child_index];
        debug_assert!(self.arena.node(child).is_full());
        debug_assert!(!self.arena.node(parent).is_full());

        let is_leaf = self.arena.header(child).is_leaf;
        // Allocate first: if this fails nothing has been touched.
        let sibling = self.arena.allocate_node(is_leaf)?;

        let mid = self.order;
        let right_count = self.max_keys() - mid - 1;

        self.arena.copy_entries(child, mid + 1, sibling, 0, right_count);
        if !is_leaf {
            self.arena
                .copy_children(child, mid + 1, sibling, 0, right_count + 1);
        }
        self.arena.header_mut(sibling).key_count = right_count as u16;
        self.arena.header_mut(child).key_count = mid as u16;

        let promoted_key = self.arena.key_row(child)[mid];
        let promoted_value = self.arena.value_row(child)[mid];

        // Open slot `child_index` in the parent, and child slot after it.
        let parent_count = self.arena.header(parent).key_count as usize;
        let shifted = parent_count - child_index;
        self.arena
            .copy_entries(parent, child_index, parent, child_index + 1, shifted);
        self.arena
            .copy_children(parent, child_index + 1, parent, child_index + 2, shifted);

        self.arena.key_row_mut(parent)[child_index] = promoted_key;
        self.arena.value_row_mut(parent)[child_index] = promoted_value;
        self.arena.child_row_mut(parent)[child_index + 1] = sibling;
        self.arena.header_mut(parent).key_count += 1;

        TreeStats::record(&self.stats.splits);
        trace!(%parent, %child, %sibling, child_index, "split child");
        Ok(())
    }

    /// Insert into the subtree at `node`, which must not be full.
    fn insert_non_full(&mut self, mut node: NodeId, key: K, value: V) -> Result<()> {
        loop {
            if self.arena.header(node).is_leaf {
                self.insert_into_leaf(node, key, value);
                return Ok(());
            }

            let mut pos = self.arena.node(node).find_position(&key);
            let child = self.arena.child_row(node)[pos];
            if self.arena.node(child).is_full() {
                self.split_child(node, pos)?;
                // The key may now belong to the new right sibling.
                if self.arena.key_row(node)[pos] < key {
                    pos += 1;
                }
            }
            node = self.arena.child_row(node)[pos];
        }
    }

    fn insert_into_leaf(&mut self, leaf: NodeId, key: K, value: V) {
        let count = self.arena.header(leaf).key_count as usize;
        debug_assert!(count < self.max_keys());

        // Shift only keys strictly greater; equal keys stay ahead.
        let pos = self.arena.key_row(leaf)[..count].partition_point(|k| *k <= key);
        self.arena.copy_entries(leaf, pos, leaf, pos + 1, count - pos);

        self.arena.key_row_mut(leaf)[pos] = key;
        self.arena.value_row_mut(leaf)[pos] = value;
        self.arena.header_mut(leaf).key_count += 1;
    }

    // ========================================================================
    // Ordered access
    // ========================================================================

    /// Iterate entries in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.arena, self.root, self.len)
    }

    /// Entry with the smallest key.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        let mut node = self.arena.node(self.root);
        while !node.is_leaf() {
            node = self.arena.node(node.children()[0]);
        }
        node.keys().first().zip(node.values().first())
    }

    /// Entry with the largest key.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        let mut node = self.arena.node(self.root);
        while !node.is_leaf() {
            node = self.arena.node(node.children()[node.key_count()]);
        }
        node.keys().last().zip(node.values().last())
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Walk the whole tree and verify its structural invariants.
    ///
    /// Checks key counts (including that no internal node is left without
    /// keys), ordering within and across nodes, uniform leaf depth, and that
    /// the entry count matches `len`.
    ///
    /// # Errors
    /// - `Error::Corrupted` describing the first violation found
    pub fn check_invariants(&self) -> Result<()> {
        let mut entries = 0;
        self.check_node(self.root, None, None, 1, &mut entries)?;

        if entries != self.len {
            return Err(Error::Corrupted(format!(
                "tree holds {} entries but len is {}",
                entries, self.len
            )));
        }
        Ok(())
    }

    fn check_node(
        &self,
        id: NodeId,
        lower: Option<&K>,
        upper: Option<&K>,
        depth: usize,
        entries: &mut usize,
    ) -> Result<()> {
        if !self.arena.contains(id) {
            return Err(Error::Corrupted(format!("dangling child {}", id)));
        }

        let node = self.arena.node(id);
        let count = node.key_count();
        let is_root = id == self.root;

        if count > self.max_keys() {
            return Err(Error::Corrupted(format!(
                "{} holds {} keys, max is {}",
                id,
                count,
                self.max_keys()
            )));
        }
        if !node.is_leaf() && count == 0 {
            return Err(Error::Corrupted(format!(
                "internal {} has no keys",
                id
            )));
        }
        // Right halves of a split start with order - 1 keys.
        if !is_root && count + 1 < self.order {
            return Err(Error::Corrupted(format!(
                "{} underfull with {} keys",
                id, count
            )));
        }
        if !node.keys().windows(2).all(|w| w[0] <= w[1]) {
            return Err(Error::Corrupted(format!("{} keys out of order", id)));
        }
        let out_of_range = node.keys().iter().any(|k| {
            lower.is_some_and(|lo| k < lo) || upper.is_some_and(|hi| k > hi)
        });
        if out_of_range {
            return Err(Error::Corrupted(format!(
                "{} has keys outside its parent's separators",
                id
            )));
        }

        *entries += count;

        if node.is_leaf() {
            if depth != self.height {
                return Err(Error::Corrupted(format!(
                    "leaf {} at depth {}, tree height is {}",
                    id, depth, self.height
                )));
            }
            return Ok(());
        }

        let keys = node.keys();
        for (i, &child) in node.children().iter().enumerate() {
            let lo = if i == 0 { lower } else { Some(&keys[i - 1]) };
            let hi = if i == count { upper } else { Some(&keys[i]) };
            self.check_node(child, lo, hi, depth + 1, entries)?;
        }
        Ok(())
    }
}

impl<K, V> BTree<K, V> {
    /// Number of entries (duplicates counted once per insert).
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Levels from the root down to the leaves.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    /// Maximum keys per node (`2 * order`).
    #[inline]
    pub fn max_keys(&self) -> usize {
        self.order * 2
    }

    /// Nodes allocated from the arena so far.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.arena.allocated_nodes()
    }

    /// Current root node.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The node arena backing this tree.
    #[inline]
    pub fn arena(&self) -> &NodeArena<K, V> {
        &self.arena
    }

    /// Operation counters.
    #[inline]
    pub fn stats(&self) -> &TreeStats {
        &self.stats
    }
}

impl<'a, K: Ord + Copy + Default, V: Copy + Default> IntoIterator for &'a BTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> fmt::Debug for BTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BTree")
            .field("order", &self.order)
            .field("len", &self.len)
            .field("height", &self.height)
            .field("root", &self.root)
            .field("arena", &self.arena)
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================
