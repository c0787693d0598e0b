use std::ops::Range;

use proptest::prelude::*;

use crate::model;

use super::*;

// Calls `f` with every permutation of `keys`.
fn for_each_permutation(keys: &mut Vec<u32>, k: usize, f: &mut impl FnMut(&[u32])) {
    if k == keys.len() {
        f(keys);
        return;
    }

    for i in k..keys.len() {
        keys.swap(k, i);
        for_each_permutation(keys, k + 1, f);
        keys.swap(k, i);
    }
}

fn insert_find_all(keys: &[u32]) {
    let mut tree: AvlTree<u32, u32> = AvlTree::new();

    for &key in keys {
        assert_eq!(tree.insert(key, key * 10), None);
        tree.assert_invariants();
    }

    for key in keys {
        let id = tree.find(key).expect("item not found");
        assert_eq!(tree.node(id).map(Node::key), Some(key));
        assert_eq!(tree.get(key), Some(&(key * 10)));
    }
}

fn insert_remove_all(keys: &[u32]) {
    let mut tree: AvlTree<u32, ()> = AvlTree::new();

    for &key in keys {
        tree.insert(key, ());
        tree.assert_invariants();
    }

    for key in keys {
        assert_eq!(tree.remove_entry(key), Some((*key, ())));
        tree.assert_invariants();
    }

    assert!(tree.is_empty());

    for &key in keys {
        tree.insert(key, ());
        tree.assert_invariants();
    }

    for key in keys.iter().rev() {
        assert_eq!(tree.remove_entry(key), Some((*key, ())));
        tree.assert_invariants();
    }

    assert!(tree.is_empty());
    assert_eq!(tree.nodes.len(), 0);
}

// Preorder listing of (key, balance), which pins down the exact shape of the tree.
fn shape<K: Copy, V>(tree: &AvlTree<K, V>) -> Vec<(K, i8)> {
    let mut out = Vec::new();
    let mut stack: Vec<NodeId> = tree.root().into_iter().collect();

    while let Some(id) = stack.pop() {
        let node = tree.node(id).unwrap();
        out.push((*node.key(), node.balance()));
        stack.extend(node.right());
        stack.extend(node.left());
    }

    out
}

// Checks links and ordering without looking at balances.
fn assert_links(tree: &AvlTree<u32, ()>) {
    let mut stack: Vec<NodeId> = tree.root().into_iter().collect();
    if let Some(root) = tree.root() {
        assert_eq!(tree.node(root).unwrap().parent(), None);
    }

    while let Some(id) = stack.pop() {
        let node = tree.node(id).unwrap();
        for child in [node.left(), node.right()].into_iter().flatten() {
            assert_eq!(tree.node(child).unwrap().parent(), Some(id));
            stack.push(child);
        }
    }

    let keys: Vec<_> = tree.keys().copied().collect();
    assert!(keys.windows(2).all(|w| w[0] < w[1]));
}

fn key_of<V>(tree: &AvlTree<u32, V>, id: Option<NodeId>) -> Option<u32> {
    id.and_then(|id| tree.node(id)).map(|node| *node.key())
}

#[test]
fn zero_elems_find() {
    insert_find_all(&[]);
}

#[test]
fn single_elem_find() {
    insert_find_all(&[0]);
}

#[test]
fn small_permutations_find() {
    for n in 2..=5 {
        let mut keys: Vec<u32> = (0..n).collect();
        for_each_permutation(&mut keys, 0, &mut |keys| insert_find_all(keys));
    }
}

#[test]
fn remove_one() {
    insert_remove_all(&[0]);
}

#[test]
fn small_permutations_remove() {
    for n in 2..=6 {
        let mut keys: Vec<u32> = (0..n).collect();
        for_each_permutation(&mut keys, 0, &mut |keys| insert_remove_all(keys));
    }
}

#[test]
fn ascending_inserts_make_perfect_tree() {
    let tree: AvlTree<u32, ()> = (1..=7).map(|k| (k, ())).collect();

    tree.assert_invariants();
    assert_eq!(tree.height(), 3);
    assert_eq!(key_of(&tree, tree.root()), Some(4));
    assert!(shape(&tree).iter().all(|&(_, balance)| balance == 0));
}

#[test]
fn third_ascending_insert_rotates_left() {
    let mut tree = AvlTree::new();
    tree.insert(1, ());
    tree.insert(2, ());
    assert_eq!(shape(&tree), [(1, 1), (2, 0)]);

    tree.insert(3, ());
    assert_eq!(shape(&tree), [(2, 0), (1, 0), (3, 0)]);
}

#[test]
fn double_rotations_on_insert() {
    // Right-left: the pivot 2 rises above 1 and 3.
    let tree: AvlTree<u32, ()> = [1, 3, 2].into_iter().map(|k| (k, ())).collect();
    assert_eq!(shape(&tree), [(2, 0), (1, 0), (3, 0)]);

    // Left-right.
    let tree: AvlTree<u32, ()> = [3, 1, 2].into_iter().map(|k| (k, ())).collect();
    assert_eq!(shape(&tree), [(2, 0), (1, 0), (3, 0)]);

    // Left-right with a pivot that leans right: 20's left subtree is short afterwards.
    let tree: AvlTree<u32, ()> = [20, 10, 30, 5, 15, 17]
        .into_iter()
        .map(|k| (k, ()))
        .collect();
    tree.assert_invariants();
    assert_eq!(
        shape(&tree),
        [(15, 0), (10, -1), (5, 0), (20, 0), (17, 0), (30, 0)]
    );

    // Right-left with a pivot that leans right.
    let tree: AvlTree<u32, ()> = [10, 5, 20, 15, 25, 17]
        .into_iter()
        .map(|k| (k, ()))
        .collect();
    tree.assert_invariants();
    assert_eq!(
        shape(&tree),
        [(15, 0), (10, -1), (5, 0), (20, 0), (17, 0), (25, 0)]
    );
}

#[test]
fn remove_root_with_two_children_promotes_predecessor() {
    let mut tree: AvlTree<u32, &str> = AvlTree::new();
    tree.insert(2, "two");
    tree.insert(1, "one");
    tree.insert(3, "three");

    assert_eq!(tree.remove(&2), Some("two"));
    tree.assert_invariants();

    let root = tree.root().unwrap();
    assert_eq!(key_of(&tree, Some(root)), Some(1));
    assert_eq!(tree.node(root).unwrap().left(), None);
    assert_eq!(key_of(&tree, tree.node(root).unwrap().right()), Some(3));
    assert_eq!(shape(&tree), [(1, 1), (3, 0)]);
    assert_eq!(tree.get(&1), Some(&"one"));
}

#[test]
fn height_preserving_rotation_stops_removal_fixup() {
    //          6
    //       /     \
    //      2       8
    //     / \     / \
    //    1   4   7   9
    //       / \       \
    //      3   5       10
    let mut tree: AvlTree<u32, ()> = [6, 2, 8, 1, 4, 7, 9, 3, 5, 10]
        .into_iter()
        .map(|k| (k, ()))
        .collect();
    tree.assert_invariants();
    assert_eq!(
        shape(&tree),
        [
            (6, 0),
            (2, 1),
            (1, 0),
            (4, 0),
            (3, 0),
            (5, 0),
            (8, 1),
            (7, 0),
            (9, 1),
            (10, 0)
        ]
    );

    // 2 overflows to +2 while its heavy child 4 is balanced. After the rotation the subtree keeps
    // its height, so the root's balance must not move.
    tree.remove(&1);
    tree.assert_invariants();
    assert_eq!(
        shape(&tree),
        [
            (6, 0),
            (4, -1),
            (2, 1),
            (3, 0),
            (5, 0),
            (8, 1),
            (7, 0),
            (9, 1),
            (10, 0)
        ]
    );
}

#[test]
fn removal_rotates_at_several_levels() {
    // A sparse tree of height 5 whose inner nodes all lean left. Removing 12 from the short
    // right edge forces a rotation at 11 and then another at the root.
    let keys = [8, 5, 11, 3, 7, 10, 12, 2, 4, 6, 9, 1];
    let mut tree: AvlTree<u32, ()> = keys.into_iter().map(|k| (k, ())).collect();
    tree.assert_invariants();
    assert_eq!(tree.height(), 5);

    tree.remove(&12);
    tree.assert_invariants();
    assert_eq!(tree.height(), 4);
    assert_eq!(key_of(&tree, tree.root()), Some(5));
}

#[test]
fn overwrite_keeps_shape() {
    let mut tree: AvlTree<u32, &str> = (0..20).map(|k| (k, "first")).collect();
    let before = shape(&tree);

    assert_eq!(tree.insert(13, "second"), Some("first"));

    assert_eq!(shape(&tree), before);
    assert_eq!(tree.get(&13), Some(&"second"));
    assert_eq!(tree.len(), 20);
}

#[test]
fn remove_absent_is_noop() {
    let mut tree: AvlTree<u32, ()> = AvlTree::new();
    assert_eq!(tree.remove(&1), None);

    tree.extend((0..10).map(|k| (k * 2, ())));
    let before = shape(&tree);

    assert_eq!(tree.remove(&7), None);
    assert_eq!(shape(&tree), before);
}

#[test]
fn at_reports_missing_keys() {
    let mut tree: AvlTree<String, u32> = AvlTree::new();
    tree.insert("a".to_owned(), 1);

    assert_eq!(tree.at("a"), Ok(&1));
    assert_eq!(tree.at("b"), Err(KeyError));

    *tree.at_mut("a").unwrap() += 1;
    assert_eq!(tree.get("a"), Some(&2));
    assert_eq!(tree.at_mut("b").unwrap_err().to_string(), "key not found");
}

#[test]
fn rotations_preserve_order() {
    let mut tree: AvlTree<u32, ()> = (1..=7).map(|k| (k, ())).collect();
    let before: Vec<_> = tree.keys().copied().collect();

    let root = tree.root().unwrap();
    let up = tree.rotate(root, Dir::Left);
    assert_eq!(key_of(&tree, Some(up)), Some(6));
    assert_eq!(tree.root(), Some(up));
    assert_links(&tree);
    assert!(tree.keys().copied().eq(before.iter().copied()));

    let up = tree.rotate(up, Dir::Right);
    assert_eq!(key_of(&tree, Some(up)), Some(4));
    assert_links(&tree);

    // Rotate an inner node so the grandparent link is rewired rather than the root.
    let two = tree.find(&2).unwrap();
    let up = tree.rotate(two, Dir::Right);
    assert_eq!(key_of(&tree, Some(up)), Some(1));
    assert_eq!(key_of(&tree, tree.node(up).unwrap().parent()), Some(4));
    assert_links(&tree);
    assert!(tree.keys().copied().eq(before.iter().copied()));
}

#[test]
fn swap_exchanges_positions_and_balances() {
    let mut tree: AvlTree<u32, ()> = [4, 2, 6, 1, 3, 5, 7, 0]
        .into_iter()
        .map(|k| (k, ()))
        .collect();
    tree.assert_invariants();
    let before = shape(&tree);

    // Parent and child.
    let two = tree.find(&2).unwrap();
    let one = tree.find(&1).unwrap();
    let balance_two = tree.node(two).unwrap().balance();
    let balance_one = tree.node(one).unwrap().balance();

    tree.swap(two, one);
    assert_eq!(tree.node(one).unwrap().left(), Some(two));
    assert_eq!(tree.node(two).unwrap().parent(), Some(one));
    assert_eq!(tree.node(one).unwrap().balance(), balance_two);
    assert_eq!(tree.node(two).unwrap().balance(), balance_one);

    tree.swap(two, one);
    assert_eq!(shape(&tree), before);

    // Root and a distant leaf.
    let four = tree.find(&4).unwrap();
    let seven = tree.find(&7).unwrap();
    tree.swap(four, seven);
    assert_eq!(tree.root(), Some(seven));
    assert_eq!(tree.node(four).unwrap().parent(), tree.find_by_walk(&[6]));
    tree.swap(seven, four);
    assert_eq!(shape(&tree), before);
    tree.assert_invariants();
}

impl<V> AvlTree<u32, V> {
    // Follows the path of keys from the root, ignoring ordering.
    fn find_by_walk(&self, path: &[u32]) -> Option<NodeId> {
        let mut cur = self.root?;
        for key in path {
            let node = &self.nodes[cur];
            cur = [node.left(), node.right()]
                .into_iter()
                .flatten()
                .find(|&child| self.nodes[child].key == *key)?;
        }
        Some(cur)
    }
}

#[test]
fn handles_survive_other_removals() {
    let mut tree: AvlTree<u32, u32> = (0..64).map(|k| (k, k)).collect();
    let ten = tree.find(&10).unwrap();
    let thirty_one = tree.find(&31).unwrap();

    for key in [9, 8, 11, 12, 30, 7] {
        assert!(tree.remove(&key).is_some());
        tree.assert_invariants();
    }

    assert_eq!(tree.node(ten).map(|n| (*n.key(), *n.value())), Some((10, 10)));
    assert_eq!(tree.find(&10), Some(ten));

    assert_eq!(tree.remove_node(thirty_one), Some((31, 31)));
    assert_eq!(tree.node(ten).map(|n| *n.key()), Some(10));
    assert_eq!(tree.remove_node(thirty_one), None);
    tree.assert_invariants();
}

#[test]
fn removed_handles_stay_dead_after_reuse() {
    let mut tree: AvlTree<u32, u32> = (0..8).map(|k| (k, k)).collect();
    let stale = tree.find(&3).unwrap();

    assert_eq!(tree.remove(&3), Some(3));
    tree.insert(100, 100);

    // The new key lands in the freed slot.
    let fresh = tree.find(&100).unwrap();
    assert_eq!(fresh.index(), stale.index());
    assert_ne!(fresh, stale);

    assert!(tree.node(stale).is_none());
    assert_eq!(tree.predecessor(stale), None);
    assert_eq!(tree.successor(stale), None);
    assert_eq!(tree.remove_node(stale), None);

    assert_eq!(tree.get(&100), Some(&100));
    assert_eq!(tree.len(), 8);
    tree.assert_invariants();
}

#[test]
fn clear_retires_handles() {
    let mut tree: AvlTree<u32, ()> = (0..4).map(|k| (k, ())).collect();
    let old = tree.first().unwrap();

    tree.clear();
    tree.insert(7, ());

    assert!(tree.node(old).is_none());
    assert_eq!(tree.remove_node(old), None);
    assert!(tree.contains_key(&7));
}

#[test]
fn neighbors_walk_in_order() {
    let tree: AvlTree<u32, ()> = (0..50).rev().map(|k| (k * 3, ())).collect();

    let mut cur = tree.first();
    let mut seen = Vec::new();
    while let Some(id) = cur {
        seen.push(*tree.node(id).unwrap().key());
        cur = tree.successor(id);
    }
    assert_eq!(seen, (0..50).map(|k| k * 3).collect::<Vec<_>>());

    let mut cur = tree.last();
    seen.clear();
    while let Some(id) = cur {
        seen.push(*tree.node(id).unwrap().key());
        cur = tree.predecessor(id);
    }
    assert_eq!(seen, (0..50).rev().map(|k| k * 3).collect::<Vec<_>>());
}

#[test]
fn iterators_are_double_ended() {
    let tree: AvlTree<u32, char> = [(2, 'b'), (1, 'a'), (3, 'c'), (4, 'd')]
        .into_iter()
        .collect();

    let mut iter = tree.iter();
    assert_eq!(iter.len(), 4);
    assert_eq!(iter.next(), Some((&1, &'a')));
    assert_eq!(iter.next_back(), Some((&4, &'d')));
    assert_eq!(iter.next(), Some((&2, &'b')));
    assert_eq!(iter.next_back(), Some((&3, &'c')));
    assert_eq!(iter.next(), None);
    assert_eq!(iter.next_back(), None);

    assert_eq!(tree.keys().rev().copied().collect::<Vec<_>>(), [4, 3, 2, 1]);
    assert_eq!(tree.values().collect::<String>(), "abcd");
    assert_eq!(format!("{tree:?}"), "{1: 'a', 2: 'b', 3: 'c', 4: 'd'}");
}

#[test]
fn cursor_removal_walks_forward() {
    let mut tree: AvlTree<u32, u32> = (0..32).map(|k| (k, k)).collect();
    let mut curs = tree.cursor_first_mut();

    // Remove every even key.
    while let Some((&key, value)) = curs.get_mut() {
        *value += 100;
        if key % 2 == 0 {
            assert_eq!(curs.remove_current(), Some((key, key + 100)));
        } else {
            curs.move_next();
        }
    }

    assert_eq!(curs.peek_next().map(|(k, _)| *k), Some(1));
    drop(curs);

    tree.assert_invariants();
    let expected: Vec<(u32, u32)> = (0..32)
        .filter(|k| k % 2 == 1)
        .map(|k| (k, k + 100))
        .collect();
    assert!(tree.iter().map(|(k, v)| (*k, *v)).eq(expected));
}

#[test]
fn height_stays_logarithmic() {
    let mut tree: AvlTree<u32, ()> = AvlTree::new();

    for n in 1..=2000u32 {
        // A scrambled but deterministic key order.
        tree.insert(n.wrapping_mul(2_654_435_761) % 100_003, ());

        let bound = (1.44 * ((tree.len() + 2) as f64).log2()).ceil() as usize;
        assert!(tree.height() <= bound, "height {} > {bound}", tree.height());
    }

    tree.assert_invariants();
}

#[test]
fn clear_releases_everything() {
    let mut tree: AvlTree<u32, ()> = (0..100).map(|k| (k, ())).collect();
    tree.clear();

    assert!(tree.is_empty());
    assert_eq!(tree.height(), 0);
    assert_eq!(tree.first_key_value(), None);

    tree.insert(5, ());
    tree.assert_invariants();
}

#[cfg(miri)]
const FUZZ_RANGE: Range<usize> = 0..10;

#[cfg(not(miri))]
const FUZZ_RANGE: Range<usize> = 0..1000;

proptest::proptest! {
    #![proptest_config(ProptestConfig {
        max_shrink_iters: 65536,
        .. ProptestConfig::default()
    })]

    #[test]
    fn btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_btree_equivalence(ops);
    }

    #[test]
    fn cursor_equivalence(
        values in proptest::collection::vec(0u32..500, 0..100),
        ops in proptest::collection::vec(model::cursor_op_strategy(), FUZZ_RANGE),
    ) {
        model::run_cursor_equivalence(values, ops);
    }

    #[test]
    fn insert_then_remove_all(keys in proptest::collection::hash_set(0u32..10_000, 0..300)) {
        let keys: Vec<u32> = keys.into_iter().collect();
        let mut tree = AvlTree::new();

        for &key in &keys {
            tree.insert(key, ());
        }
        tree.assert_invariants();
        prop_assert_eq!(tree.len(), keys.len());

        for key in keys.iter().rev() {
            prop_assert_eq!(tree.remove(key), Some(()));
        }
        tree.assert_invariants();
        prop_assert!(tree.is_empty());
        prop_assert_eq!(tree.nodes.len(), 0);
    }
}
