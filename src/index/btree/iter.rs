//! In-order iteration over a [`BTree`](crate::BTree).

use std::iter::FusedIterator;

use crate::common::NodeId;
use crate::storage::NodeArena;

/// Iterator over `(&K, &V)` pairs in ascending key order.
///
/// Created by [`BTree::iter`](crate::BTree::iter). Duplicate keys appear
/// once per insert.
pub struct Iter<'a, K, V> {
    arena: &'a NodeArena<K, V>,
    /// Path from the root: each entry is a node and the next key index to
    /// yield from it.
    stack: Vec<(NodeId, usize)>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(arena: &'a NodeArena<K, V>, root: NodeId, len: usize) -> Self {
        let mut iter = Self {
            arena,
            stack: Vec::new(),
            remaining: len,
        };
        iter.push_left_spine(root);
        iter
    }

    fn push_left_spine(&mut self, mut id: NodeId) {
        let arena = self.arena;
        loop {
            self.stack.push((id, 0));
            let node = arena.node(id);
            if node.is_leaf() {
                break;
            }
            id = node.children()[0];
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let arena = self.arena;
        loop {
            let (id, idx) = *self.stack.last()?;
            let node = arena.node(id);

            if idx < node.key_count() {
                if let Some(top) = self.stack.last_mut() {
                    top.1 += 1;
                }
                if !node.is_leaf() {
                    self.push_left_spine(node.children()[idx + 1]);
                }
                self.remaining = self.remaining.saturating_sub(1);
                return Some((&node.keys()[idx], &node.values()[idx]));
            }

            self.stack.pop();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}
