//! NodeArena - fixed-capacity slab holding every node of one tree.
//!
//! Node memory is reserved once, up front, and never returned until the
//! arena itself is dropped. Nodes are addressed by [`NodeId`] slot index
//! rather than by pointer, so a node's storage stays put for the whole
//! lifetime of the tree.

use std::mem::size_of;

use tracing::debug;

use super::aligned::AlignedColumn;
use crate::common::config::{align_to_cache_line, cache_aligned_row_len};
use crate::common::{Error, NodeId, Result, TreeConfig};
use crate::index::btree::node::{Node, NodeHeader};

/// Fixed-capacity node storage for one B-tree.
///
/// # Layout
/// ```text
/// headers:  [H0][H1][H2] ...                    (4 bytes each, packed)
/// keys:     |K0 .. K2m pad|K0 .. K2m pad| ...   (one row per node)
/// values:   |V0 .. V2m pad|V0 .. V2m pad| ...   (one row per node)
/// children: |C0 .. C2m+1 pad| ...               (one row per node)
///           ^ every row starts on a 64-byte boundary
/// ```
/// Slot `i` of every column belongs to `NodeId(i)`. Each column is allocated
/// 64-byte aligned for `max_nodes` rows at construction, and each row is
/// padded to a whole number of cache lines, so the key row that
/// `find_position` scans always begins on a fresh line. Growing a column
/// while allocating never reallocates.
///
/// # Capacity
/// `max_nodes = capacity_bytes / node_footprint`, where the footprint is one
/// header plus one padded row of each column, rounded up to a cache line.
/// Once `max_nodes` slots are handed out, allocation fails with
/// [`Error::ArenaExhausted`]; there is no growth or compaction.
pub struct NodeArena<K, V> {
    headers: AlignedColumn<NodeHeader>,
    keys: AlignedColumn<K>,
    values: AlignedColumn<V>,
    children: AlignedColumn<NodeId>,

    /// Keys per node (`2 * order`).
    max_keys: usize,
    /// Children per node (`2 * order + 1`).
    max_children: usize,

    /// Padded row lengths, in elements.
    key_stride: usize,
    value_stride: usize,
    child_stride: usize,

    capacity_bytes: usize,
    node_footprint: usize,
    max_nodes: usize,
}

impl<K: Copy + Default, V: Copy + Default> NodeArena<K, V> {
    /// Reserve an arena of `capacity_bytes` for nodes of the given order.
    ///
    /// # Errors
    /// - `Error::InvalidOrder` if `order` is below `MIN_ORDER` or too large
    /// - `Error::ArenaTooSmall` if not even one node fits
    /// - `Error::ArenaAllocation` if the memory reservation fails
    pub fn new(capacity_bytes: usize, order: usize) -> Result<Self> {
        let config = TreeConfig::default()
            .with_arena_capacity(capacity_bytes)
            .with_order(order);
        config.validate()?;

        let max_keys = config.max_keys();
        let max_children = config.max_children();
        let key_stride = cache_aligned_row_len(max_keys, size_of::<K>());
        let value_stride = cache_aligned_row_len(max_keys, size_of::<V>());
        let child_stride = cache_aligned_row_len(max_children, size_of::<NodeId>());
        let node_footprint = Self::footprint_for(order);

        // NodeId::INVALID is u32::MAX, so ids stop one short of it.
        let max_nodes = (capacity_bytes / node_footprint).min(u32::MAX as usize);
        if max_nodes == 0 {
            return Err(Error::ArenaTooSmall {
                capacity_bytes,
                node_footprint,
            });
        }

        let headers = AlignedColumn::with_capacity(max_nodes)?;
        let keys = AlignedColumn::with_capacity(max_nodes * key_stride)?;
        let values = AlignedColumn::with_capacity(max_nodes * value_stride)?;
        let children = AlignedColumn::with_capacity(max_nodes * child_stride)?;

        debug!(
            capacity_bytes,
            order, node_footprint, max_nodes, "node arena reserved"
        );

        Ok(Self {
            headers,
            keys,
            values,
            children,
            max_keys,
            max_children,
            key_stride,
            value_stride,
            child_stride,
            capacity_bytes,
            node_footprint,
            max_nodes,
        })
    }

    /// Bytes one node occupies for the given order, cache-line rounded.
    pub fn footprint_for(order: usize) -> usize {
        let max_keys = order * 2;
        let raw = size_of::<NodeHeader>()
            + cache_aligned_row_len(max_keys, size_of::<K>()) * size_of::<K>()
            + cache_aligned_row_len(max_keys, size_of::<V>()) * size_of::<V>()
            + cache_aligned_row_len(max_keys + 1, size_of::<NodeId>()) * size_of::<NodeId>();
        align_to_cache_line(raw)
    }

    /// Claim the next slot as an empty node of the requested kind.
    ///
    /// Child slots start as [`NodeId::INVALID`]; with `key_count == 0`
    /// none of them are live anyway.
    ///
    /// # Errors
    /// - `Error::ArenaExhausted` if every slot is already in use
    pub fn allocate_node(&mut self, is_leaf: bool) -> Result<NodeId> {
        if !self.has_room_for(1) {
            return Err(Error::ArenaExhausted {
                capacity_nodes: self.max_nodes,
                requested: 1,
            });
        }

        let id = NodeId::new(self.headers.len() as u32);

        // Capacity was reserved up front: none of these reallocate.
        self.headers.extend_filled(1, NodeHeader::new(is_leaf));
        self.keys.extend_filled(self.key_stride, K::default());
        self.values.extend_filled(self.value_stride, V::default());
        self.children
            .extend_filled(self.child_stride, NodeId::INVALID);

        Ok(id)
    }
}

impl<K, V> NodeArena<K, V> {
    // ========================================================================
    // Capacity
    // ========================================================================

    /// Total capacity in bytes, as configured.
    #[inline]
    pub fn capacity_bytes(&self) -> usize {
        self.capacity_bytes
    }

    /// Bytes accounted per node.
    #[inline]
    pub fn node_footprint(&self) -> usize {
        self.node_footprint
    }

    /// Number of nodes the arena can ever hold.
    #[inline]
    pub fn max_nodes(&self) -> usize {
        self.max_nodes
    }

    /// Number of nodes handed out so far.
    #[inline]
    pub fn allocated_nodes(&self) -> usize {
        self.headers.len()
    }

    /// Number of nodes still available.
    #[inline]
    pub fn remaining_nodes(&self) -> usize {
        self.max_nodes - self.allocated_nodes()
    }

    /// Bytes consumed by allocated nodes.
    #[inline]
    pub fn used_bytes(&self) -> usize {
        self.allocated_nodes() * self.node_footprint
    }

    /// Whether `nodes` more allocations would succeed.
    #[inline]
    pub fn has_room_for(&self, nodes: usize) -> bool {
        nodes <= self.remaining_nodes()
    }

    /// Keys per node.
    #[inline]
    pub fn max_keys(&self) -> usize {
        self.max_keys
    }

    // ========================================================================
    // Node access
    // ========================================================================

    /// Whether `id` refers to an allocated node.
    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        id.is_valid() && id.index() < self.headers.len()
    }

    /// Read-only view of a node's occupied slots.
    #[inline]
    pub fn node(&self, id: NodeId) -> Node<'_, K, V> {
        Node::new(
            id,
            &self.headers[id.index()],
            self.key_row(id),
            self.value_row(id),
            self.child_row(id),
        )
    }

    #[inline]
    pub(crate) fn header(&self, id: NodeId) -> &NodeHeader {
        &self.headers[id.index()]
    }

    #[inline]
    pub(crate) fn header_mut(&mut self, id: NodeId) -> &mut NodeHeader {
        &mut self.headers[id.index()]
    }

    #[inline]
    pub(crate) fn key_row(&self, id: NodeId) -> &[K] {
        let base = id.index() * self.key_stride;
        &self.keys[base..base + self.max_keys]
    }

    #[inline]
    pub(crate) fn key_row_mut(&mut self, id: NodeId) -> &mut [K] {
        let base = id.index() * self.key_stride;
        &mut self.keys[base..base + self.max_keys]
    }

    #[inline]
    pub(crate) fn value_row(&self, id: NodeId) -> &[V] {
        let base = id.index() * self.value_stride;
        &self.values[base..base + self.max_keys]
    }

    #[inline]
    pub(crate) fn value_row_mut(&mut self, id: NodeId) -> &mut [V] {
        let base = id.index() * self.value_stride;
        &mut self.values[base..base + self.max_keys]
    }

    #[inline]
    pub(crate) fn child_row(&self, id: NodeId) -> &[NodeId] {
        let base = id.index() * self.child_stride;
        &self.children[base..base + self.max_children]
    }

    #[inline]
    pub(crate) fn child_row_mut(&mut self, id: NodeId) -> &mut [NodeId] {
        let base = id.index() * self.child_stride;
        &mut self.children[base..base + self.max_children]
    }
}

impl<K: Copy, V: Copy> NodeArena<K, V> {
    /// Block-copy `count` key/value pairs between two node rows.
    ///
    /// Source and destination may be the same node; ranges may overlap.
    pub(crate) fn copy_entries(
        &mut self,
        src: NodeId,
        src_start: usize,
        dst: NodeId,
        dst_start: usize,
        count: usize,
    ) {
        debug_assert!(src_start + count <= self.max_keys);
        debug_assert!(dst_start + count <= self.max_keys);

        let from = src.index() * self.key_stride + src_start;
        let to = dst.index() * self.key_stride + dst_start;
        self.keys.copy_within(from..from + count, to);

        let from = src.index() * self.value_stride + src_start;
        let to = dst.index() * self.value_stride + dst_start;
        self.values.copy_within(from..from + count, to);
    }

    /// Block-copy `count` child handles between two node rows.
    pub(crate) fn copy_children(
        &mut self,
        src: NodeId,
        src_start: usize,
        dst: NodeId,
        dst_start: usize,
        count: usize,
    ) {
        debug_assert!(src_start + count <= self.max_children);
        debug_assert!(dst_start + count <= self.max_children);

        let from = src.index() * self.child_stride + src_start;
        let to = dst.index() * self.child_stride + dst_start;
        self.children.copy_within(from..from + count, to);
    }
}

impl<K, V> std::fmt::Debug for NodeArena<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeArena")
            .field("capacity_bytes", &self.capacity_bytes)
            .field("node_footprint", &self.node_footprint)
            .field("max_nodes", &self.max_nodes)
            .field("allocated_nodes", &self.allocated_nodes())
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    type Arena = NodeArena<u64, u64>;

    /// Footprint of an order-2 `Arena` node.
    const FP: usize = 256;

    #[test]
    fn test_footprint_is_cache_aligned() {
        // 4 header + 64 keys (4 of 8 slots) + 64 values + 64 children
        // (5 of 16 slots) = 196 -> 256
        assert_eq!(Arena::footprint_for(2), FP);
        assert_eq!(Arena::footprint_for(32) % 64, 0);
        assert_eq!(NodeArena::<(u32, u32, u32), u8>::footprint_for(3) % 64, 0);
    }

    #[test]
    fn test_arena_capacity() {
        let arena = Arena::new(FP * 10 + 50, 2).unwrap();
        assert_eq!(arena.max_nodes(), 10);
        assert_eq!(arena.allocated_nodes(), 0);
        assert_eq!(arena.remaining_nodes(), 10);
        assert_eq!(arena.used_bytes(), 0);
        assert_eq!(arena.max_keys(), 4);
    }

    #[test]
    fn test_arena_too_small() {
        let result = Arena::new(100, 2);
        assert!(matches!(
            result,
            Err(Error::ArenaTooSmall {
                capacity_bytes: 100,
                node_footprint: FP
            })
        ));
    }

    #[test]
    fn test_arena_invalid_order() {
        assert!(matches!(Arena::new(1 << 20, 0), Err(Error::InvalidOrder(0))));
        assert!(matches!(Arena::new(1 << 20, 1), Err(Error::InvalidOrder(1))));
    }

    #[test]
    fn test_allocate_node_initialises_empty() {
        let mut arena = Arena::new(FP * 4, 2).unwrap();

        let leaf = arena.allocate_node(true).unwrap();
        let internal = arena.allocate_node(false).unwrap();

        assert_eq!(leaf, NodeId::new(0));
        assert_eq!(internal, NodeId::new(1));
        assert_eq!(arena.allocated_nodes(), 2);
        assert_eq!(arena.used_bytes(), 2 * FP);

        let node = arena.node(leaf);
        assert!(node.is_leaf());
        assert_eq!(node.key_count(), 0);

        let node = arena.node(internal);
        assert!(!node.is_leaf());
        assert_eq!(node.key_count(), 0);
        assert!(arena.child_row(internal).iter().all(|c| !c.is_valid()));
    }

    #[test]
    fn test_allocate_until_exhausted() {
        let mut arena = Arena::new(FP * 3, 2).unwrap();

        for _ in 0..3 {
            arena.allocate_node(true).unwrap();
        }
        assert!(!arena.has_room_for(1));

        match arena.allocate_node(true) {
            Err(Error::ArenaExhausted {
                capacity_nodes,
                requested,
            }) => {
                assert_eq!(capacity_nodes, 3);
                assert_eq!(requested, 1);
            }
            other => panic!("Expected ArenaExhausted, got {:?}", other),
        }
        // Failed allocation leaves the cursor alone
        assert_eq!(arena.allocated_nodes(), 3);
    }

    #[test]
    fn test_columns_do_not_reallocate() {
        let mut arena = Arena::new(FP * 8, 2).unwrap();
        let first = arena.allocate_node(true).unwrap();
        let keys_ptr = arena.key_row(first).as_ptr();

        for _ in 0..7 {
            arena.allocate_node(true).unwrap();
        }
        assert_eq!(arena.key_row(first).as_ptr(), keys_ptr);
    }

    #[test]
    fn test_rows_are_cache_aligned() {
        let mut arena = Arena::new(FP * 99, 2).unwrap();
        for _ in 0..99 {
            let id = arena.allocate_node(false).unwrap();
            assert_eq!(arena.key_row(id).as_ptr() as usize % 64, 0, "{}", id);
            assert_eq!(arena.value_row(id).as_ptr() as usize % 64, 0, "{}", id);
            assert_eq!(arena.child_row(id).as_ptr() as usize % 64, 0, "{}", id);
        }
    }

    #[test]
    fn test_odd_sized_key_rows_are_cache_aligned() {
        // 12-byte keys need 16-slot rows to stay on line boundaries
        let mut arena: NodeArena<(u32, u32, u32), u16> = NodeArena::new(1 << 16, 3).unwrap();
        for _ in 0..10 {
            let id = arena.allocate_node(true).unwrap();
            assert_eq!(arena.key_row(id).len(), 6);
            assert_eq!(arena.key_row(id).as_ptr() as usize % 64, 0);
            assert_eq!(arena.value_row(id).as_ptr() as usize % 64, 0);
        }
    }

    #[test]
    fn test_copy_entries_between_nodes() {
        let mut arena = Arena::new(FP * 2, 2).unwrap();
        let a = arena.allocate_node(true).unwrap();
        let b = arena.allocate_node(true).unwrap();

        arena.key_row_mut(a).copy_from_slice(&[1, 2, 3, 4]);
        arena.value_row_mut(a).copy_from_slice(&[10, 20, 30, 40]);

        arena.copy_entries(a, 2, b, 0, 2);
        assert_eq!(&arena.key_row(b)[..2], &[3, 4]);
        assert_eq!(&arena.value_row(b)[..2], &[30, 40]);

        // Overlapping shift within one row
        arena.copy_entries(a, 0, a, 1, 3);
        assert_eq!(arena.key_row(a), &[1, 1, 2, 3]);
    }

    #[test]
    fn test_copy_children() {
        let mut arena = Arena::new(FP * 2, 2).unwrap();
        let a = arena.allocate_node(false).unwrap();
        let b = arena.allocate_node(false).unwrap();

        for (i, slot) in arena.child_row_mut(a).iter_mut().enumerate() {
            *slot = NodeId::new(100 + i as u32);
        }
        arena.copy_children(a, 3, b, 0, 2);

        assert_eq!(arena.child_row(b)[0], NodeId::new(103));
        assert_eq!(arena.child_row(b)[1], NodeId::new(104));
        assert!(!arena.child_row(b)[2].is_valid());
    }

    #[test]
    fn test_contains() {
        let mut arena = Arena::new(FP * 2, 2).unwrap();
        let id = arena.allocate_node(true).unwrap();
        assert!(arena.contains(id));
        assert!(!arena.contains(NodeId::new(1)));
        assert!(!arena.contains(NodeId::INVALID));
    }
}
