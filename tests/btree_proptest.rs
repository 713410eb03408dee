//! Property tests for the B-tree index.

use std::collections::BTreeMap;

use arenadb::{BTree, NodeArena};
use proptest::prelude::*;

fn build(order: usize, keys: &[u16]) -> BTree<u16, u32> {
    let mut tree = BTree::new(1 << 22, order).unwrap();
    for (i, &k) in keys.iter().enumerate() {
        tree.insert(k, i as u32).unwrap();
    }
    tree
}

proptest! {
    /// In-order traversal equals the sorted multiset of inserted keys.
    #[test]
    fn prop_in_order_traversal_is_sorted(
        order in 2usize..6,
        keys in prop::collection::vec(any::<u16>(), 0..400),
    ) {
        let tree = build(order, &keys);

        let mut expected = keys.clone();
        expected.sort_unstable();
        let actual: Vec<u16> = tree.iter().map(|(k, _)| *k).collect();

        prop_assert_eq!(actual, expected);
        prop_assert_eq!(tree.len(), keys.len());
    }

    /// Every distinct key comes back with its value.
    #[test]
    fn prop_round_trip_distinct_keys(
        order in 2usize..6,
        entries in prop::collection::btree_map(any::<u16>(), any::<u32>(), 0..400),
    ) {
        let mut tree: BTree<u16, u32> = BTree::new(1 << 22, order).unwrap();
        let mut shuffled: Vec<(u16, u32)> = entries.iter().map(|(k, v)| (*k, *v)).collect();
        shuffled.reverse();
        for &(k, v) in &shuffled {
            tree.insert(k, v).unwrap();
        }

        for (k, v) in &entries {
            prop_assert_eq!(tree.search(k), Some(v));
        }
        for candidate in 0u16..64 {
            prop_assert_eq!(tree.search(&candidate).is_some(), entries.contains_key(&candidate));
        }
    }

    /// Structural invariants hold after arbitrary insert sequences.
    #[test]
    fn prop_invariants_hold(
        order in 2usize..6,
        keys in prop::collection::vec(0u16..50, 0..300),
    ) {
        let tree = build(order, &keys);
        prop_assert!(tree.check_invariants().is_ok());
    }

    /// Height grows logarithmically with the number of keys.
    #[test]
    fn prop_height_is_logarithmic(
        order in 2usize..8,
        keys in prop::collection::btree_set(any::<u16>(), 1..800),
    ) {
        let keys: Vec<u16> = keys.into_iter().collect();
        let tree = build(order, &keys);

        let n = keys.len() as f64;
        let bound = 2 + n.log(order as f64).ceil() as usize;
        prop_assert!(
            tree.height() <= bound,
            "height {} exceeds bound {} for n={} order={}",
            tree.height(), bound, keys.len(), order
        );
    }

    /// A refused insert leaves contents and node count untouched.
    #[test]
    fn prop_exhaustion_preserves_tree(
        order in 2usize..4,
        max_nodes in 1usize..12,
        keys in prop::collection::vec(any::<u16>(), 1..300),
    ) {
        let footprint = NodeArena::<u16, u32>::footprint_for(order);
        let mut tree: BTree<u16, u32> = BTree::new(footprint * max_nodes, order).unwrap();
        let mut model: BTreeMap<u16, usize> = BTreeMap::new();

        for (i, &k) in keys.iter().enumerate() {
            let before: Vec<(u16, u32)> = tree.iter().map(|(k, v)| (*k, *v)).collect();
            let nodes_before = tree.node_count();

            match tree.insert(k, i as u32) {
                Ok(()) => *model.entry(k).or_default() += 1,
                Err(_) => {
                    let after: Vec<(u16, u32)> = tree.iter().map(|(k, v)| (*k, *v)).collect();
                    prop_assert_eq!(before, after);
                    prop_assert_eq!(nodes_before, tree.node_count());
                }
            }
            prop_assert!(tree.node_count() <= max_nodes);
        }

        prop_assert!(tree.check_invariants().is_ok());
        prop_assert_eq!(tree.len(), model.values().sum::<usize>());
    }
}
