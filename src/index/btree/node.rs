//! Node layout and in-node position lookup.
//!
//! A node is split across the arena columns: a compact [`NodeHeader`] plus
//! cache-line aligned rows of keys, values and child handles.
//! [`Node`] bundles those pieces into a read-only view of the occupied slots.

use crate::common::NodeId;

/// Per-node metadata.
///
/// Leaf vs. internal is a runtime flag so that both kinds share one
/// slot size in the arena. Headers are packed in their own column, so
/// sixteen of them share a cache line.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHeader {
    /// Leaf nodes have no children.
    pub is_leaf: bool,
    /// Number of occupied key/value slots.
    pub key_count: u16,
}

impl NodeHeader {
    /// Header for a fresh, empty node.
    #[inline]
    pub fn new(is_leaf: bool) -> Self {
        Self {
            is_leaf,
            key_count: 0,
        }
    }
}

/// Read-only view of one node's occupied slots.
///
/// Borrowed from the arena; cheap to construct on every visit.
#[derive(Debug, Clone, Copy)]
pub struct Node<'a, K, V> {
    id: NodeId,
    header: &'a NodeHeader,
    keys: &'a [K],
    values: &'a [V],
    children: &'a [NodeId],
    max_keys: usize,
}

impl<'a, K, V> Node<'a, K, V> {
    /// Build a view from full-capacity rows. Slices are trimmed to the
    /// occupied range here.
    pub(crate) fn new(
        id: NodeId,
        header: &'a NodeHeader,
        key_row: &'a [K],
        value_row: &'a [V],
        child_row: &'a [NodeId],
    ) -> Self {
        let count = header.key_count as usize;
        let children = if header.is_leaf {
            &child_row[..0]
        } else {
            &child_row[..count + 1]
        };
        Self {
            id,
            header,
            keys: &key_row[..count],
            values: &value_row[..count],
            children,
            max_keys: key_row.len(),
        }
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.header.is_leaf
    }

    #[inline]
    pub fn key_count(&self) -> usize {
        self.header.key_count as usize
    }

    /// A full node must be split before anything descends into it.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.key_count() == self.max_keys
    }

    /// Occupied keys, ascending.
    #[inline]
    pub fn keys(&self) -> &'a [K] {
        self.keys
    }

    /// Occupied values, index-aligned with [`keys`](Self::keys).
    #[inline]
    pub fn values(&self) -> &'a [V] {
        self.values
    }

    /// Live child handles: `key_count + 1` for internal nodes, none for leaves.
    #[inline]
    pub fn children(&self) -> &'a [NodeId] {
        self.children
    }
}

impl<K: Ord, V> Node<'_, K, V> {
    /// Index of the first key `>= key`, or `key_count` if there is none.
    #[inline]
    pub fn find_position(&self, key: &K) -> usize {
        find_position(self.keys, key)
    }
}

/// Number of keys compared per unrolled step of [`find_position`].
const SCAN_BATCH: usize = 4;

/// Index of the first element of `keys` that is `>= key`.
///
/// `keys` must be sorted ascending. The result is both the insertion point
/// for `key` and, in an internal node, the child to descend into when
/// `key` is not stored at this node.
///
/// Scans left to right in batches of four; nodes are a handful of cache
/// lines, where a linear scan beats a binary search.
#[inline]
pub fn find_position<K: Ord>(keys: &[K], key: &K) -> usize {
    let n = keys.len();
    let mut i = 0;

    while i + SCAN_BATCH <= n {
        if keys[i] >= *key {
            return i;
        }
        if keys[i + 1] >= *key {
            return i + 1;
        }
        if keys[i + 2] >= *key {
            return i + 2;
        }
        if keys[i + 3] >= *key {
            return i + 3;
        }
        i += SCAN_BATCH;
    }

    while i < n {
        if keys[i] >= *key {
            return i;
        }
        i += 1;
    }
    n
}

const _: () = assert!(std::mem::size_of::<NodeHeader>() == 4);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_is_compact() {
        assert_eq!(std::mem::size_of::<NodeHeader>(), 4);
        assert_eq!(std::mem::align_of::<NodeHeader>(), 2);
    }

    #[test]
    fn test_find_position_empty() {
        let keys: [u64; 0] = [];
        assert_eq!(find_position(&keys, &5), 0);
    }

    #[test]
    fn test_find_position_semantics() {
        let keys = [10, 20, 30, 40, 50, 60, 70];

        assert_eq!(find_position(&keys, &5), 0);
        assert_eq!(find_position(&keys, &10), 0);
        assert_eq!(find_position(&keys, &11), 1);
        assert_eq!(find_position(&keys, &40), 3);
        // Past the unrolled block, into the scalar tail
        assert_eq!(find_position(&keys, &55), 5);
        assert_eq!(find_position(&keys, &70), 6);
        assert_eq!(find_position(&keys, &71), 7);
    }

    #[test]
    fn test_find_position_matches_partition_point() {
        let keys: Vec<u32> = (0..37).map(|i| i * 3).collect();
        for target in 0..120 {
            let expected = keys.partition_point(|k| *k < target);
            assert_eq!(find_position(&keys, &target), expected, "target {}", target);
        }
    }

    #[test]
    fn test_find_position_duplicates_returns_first() {
        let keys = [1, 3, 5, 5, 5, 9];
        assert_eq!(find_position(&keys, &5), 2);
    }

    #[test]
    fn test_node_view_trims_rows() {
        let header = NodeHeader {
            is_leaf: false,
            key_count: 2,
        };
        let keys = [1u64, 2, 0, 0];
        let values = [10u64, 20, 0, 0];
        let children = [
            NodeId::new(1),
            NodeId::new(2),
            NodeId::new(3),
            NodeId::INVALID,
            NodeId::INVALID,
        ];

        let node = Node::new(NodeId::new(0), &header, &keys, &values, &children);
        assert_eq!(node.keys(), &[1, 2]);
        assert_eq!(node.values(), &[10, 20]);
        assert_eq!(node.children().len(), 3);
        assert!(!node.is_full());
        assert_eq!(node.find_position(&2), 1);
    }

    #[test]
    fn test_leaf_view_has_no_children() {
        let header = NodeHeader {
            is_leaf: true,
            key_count: 4,
        };
        let keys = [1u8, 2, 3, 4];
        let values = [(); 4];
        let children = [NodeId::INVALID; 5];

        let node = Node::new(NodeId::new(3), &header, &keys, &values, &children);
        assert!(node.is_leaf());
        assert!(node.is_full());
        assert!(node.children().is_empty());
        assert_eq!(node.id(), NodeId::new(3));
    }
}
