//! An arena-backed AVL tree.
//!
//! Nodes live in a slot arena and refer to each other through [`NodeId`] handles, so parent
//! back-links need neither raw pointers nor reference counting.

// Conventions used in comments:
// - The height of a subtree rooted at `x` is denoted `h(x)`; a missing subtree has height 0.
// - The balance of a node `x` is `b(x) = h(right(x)) - h(left(x))`.
// - A node is left-heavy if `b(x) < 0` and right-heavy if `b(x) > 0`.
//
// The fundamental invariants of an AVL tree are:
// 1. An in-order walk visits keys in strictly increasing order.
// 2. `b(x) ∈ {-1, 0, 1}` for every node, and the stored balance equals the true one.
//
// Corollaries:
// 3. A node with a nonzero balance has a child on its heavy side.
// 4. A node with one child has balance ±1, and that child is a leaf.
//
// Fix-ups temporarily allow `b(x) = ±2` at exactly one node, which is resolved by a single or a
// double rotation before the walk moves on.

use core::{borrow::Borrow, cmp::Ordering, fmt, mem};

use tracing::trace;

mod arena;
pub mod cursor;
mod debug;
mod error;
pub mod iter;
#[cfg(any(test, feature = "model"))]
pub mod model;
mod node;
pub mod set;

#[cfg(test)]
mod tests;

use arena::Arena;
use node::{Dir, Link};

pub use cursor::{Cursor, CursorMut};
pub use error::KeyError;
pub use iter::{Iter, Keys, Values};
pub use node::{Node, NodeId};
pub use set::AvlSet;

/// An ordered map implemented as an AVL tree.
///
/// Lookup, insertion and removal complete in _O(log(n))_ time. Every key is stored in its own
/// arena slot, addressed by a [`NodeId`] that stays valid until that key is removed.
#[derive(Clone)]
pub struct AvlTree<K, V> {
    root: Link,
    nodes: Arena<K, V>,
}

impl<K, V> AvlTree<K, V> {
    /// Returns a new empty tree.
    pub const fn new() -> AvlTree<K, V> {
        AvlTree {
            root: None,
            nodes: Arena::new(),
        }
    }

    /// Returns `true` if the tree contains no elements.
    pub fn is_empty(&self) -> bool {
        let empty = self.len() == 0;
        debug_assert_eq!(empty, self.root.is_none());
        empty
    }

    /// Returns the number of elements in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of nodes on the longest path from the root to a leaf.
    pub fn height(&self) -> usize {
        self.height_at(self.root)
    }

    fn height_at(&self, link: Link) -> usize {
        match link {
            Some(id) => {
                let node = &self.nodes[id];
                1 + self.height_at(node.left()).max(self.height_at(node.right()))
            }
            None => 0,
        }
    }

    /// Returns the handle of the root node.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Returns the node behind `id`, or `None` if `id` does not refer to a live node.
    pub fn node(&self, id: NodeId) -> Option<&Node<K, V>> {
        self.nodes.get(id)
    }

    /// Returns the handle of the node with the minimum key.
    pub fn first(&self) -> Option<NodeId> {
        self.root.map(|root| self.extreme(root, Dir::Left))
    }

    /// Returns the handle of the node with the maximum key.
    pub fn last(&self) -> Option<NodeId> {
        self.root.map(|root| self.extreme(root, Dir::Right))
    }

    /// Returns the in-order predecessor of `id`.
    pub fn predecessor(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id)?;
        self.neighbor(id, Dir::Left)
    }

    /// Returns the in-order successor of `id`.
    pub fn successor(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id)?;
        self.neighbor(id, Dir::Right)
    }

    /// Returns the first key-value pair in the tree.
    ///
    /// The returned key is the minimum key in the tree.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.first().map(|id| self.entry(id))
    }

    /// Returns the last key-value pair in the tree.
    ///
    /// The returned key is the maximum key in the tree.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.last().map(|id| self.entry(id))
    }

    /// Removes and returns the first key-value pair in the tree.
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.first().and_then(|id| self.remove_node(id))
    }

    /// Removes and returns the last key-value pair in the tree.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        self.last().and_then(|id| self.remove_node(id))
    }

    /// Returns an in-order iterator over the key-value pairs of the tree.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self)
    }

    /// Returns an in-order iterator over the keys of the tree.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys::new(self)
    }

    /// Returns an in-order iterator over the values of the tree.
    pub fn values(&self) -> Values<'_, K, V> {
        Values::new(self)
    }

    /// Returns a cursor pointing at the first element of the tree.
    pub fn cursor_first(&self) -> Cursor<'_, K, V> {
        Cursor::first(self)
    }

    /// Returns a cursor pointing at the last element of the tree.
    pub fn cursor_last(&self) -> Cursor<'_, K, V> {
        Cursor::last(self)
    }

    /// Returns an editing cursor pointing at the first element of the tree.
    pub fn cursor_first_mut(&mut self) -> CursorMut<'_, K, V> {
        CursorMut::first(self)
    }

    /// Returns an editing cursor pointing at the last element of the tree.
    pub fn cursor_last_mut(&mut self) -> CursorMut<'_, K, V> {
        CursorMut::last(self)
    }

    /// Clears the tree, removing all elements.
    pub fn clear(&mut self) {
        self.root = None;
        self.nodes.clear();
    }

    /// Removes the node behind `id` from the tree, returning its key and value.
    ///
    /// Returns `None` if `id` does not refer to a live node. Handles of all other nodes remain
    /// valid.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn remove_node(&mut self, id: NodeId) -> Option<(K, V)> {
        let (_, left, right) = self.nodes.get(id)?.links();

        if let (Some(left), Some(_)) = (left, right) {
            // Trade places with the predecessor, which has no right child. `id` then has at most
            // one child and can be spliced out directly.
            let predecessor = self.extreme(left, Dir::Right);
            trace!(node = ?id, ?predecessor, "remove: swapping with predecessor");
            self.swap(id, predecessor);
        }

        let (parent, left, right) = self.nodes[id].links();
        debug_assert!(left.is_none() || right.is_none());

        // The parent's balance moves away from the side that lost height.
        let diff = match parent {
            Some(parent) => -self.which_child(parent, id).sign(),
            None => 0,
        };

        let child = left.or(right);
        self.replace_child_or_set_root(parent, id, child);
        self.maybe_set_parent(child, parent);

        let removed = self.nodes.free(id);

        if let Some(parent) = parent {
            self.rebalance_removed(parent, diff);
        }

        Some(removed.into_entry())
    }

    // Performs a bottom-up rebalance of the tree after an insertion below `parent`.
    //
    // Invariants:
    // - `parent`'s subtree grew by one level.
    // - `b(parent) = ±1`, leaning toward the grown side.
    fn rebalance_inserted(&mut self, mut parent: NodeId) {
        while let Some(grandparent) = self.nodes[parent].parent() {
            let side = self.which_child(grandparent, parent);
            let balance = self.nodes[grandparent].balance() + side.sign();
            self.nodes[grandparent].set_balance(balance);

            match balance {
                0 => {
                    trace!(node = ?grandparent, "insert: absorbed");
                    return;
                }

                // Still within tolerance, but the subtree grew. Keep climbing.
                -1 | 1 => parent = grandparent,

                _ => {
                    if self.nodes[parent].balance() == side.sign() {
                        self.rotate(grandparent, !side);
                        self.nodes[grandparent].set_balance(0);
                        self.nodes[parent].set_balance(0);
                    } else {
                        self.rotate_twice(grandparent, side);
                    }

                    // The rotated subtree is back to its height before the insertion.
                    return;
                }
            }
        }
    }

    // Performs a bottom-up rebalance of the tree after a removal below `node`.
    //
    // `diff` is the change to `b(node)` caused by the removal: +1 if its left subtree shrank and
    // -1 if its right subtree shrank. Unlike insertion, a rotation does not end the walk unless it
    // leaves the subtree height unchanged.
    fn rebalance_removed(&mut self, node: NodeId, diff: i8) {
        let mut opt_node = Some(node);
        let mut diff = diff;

        while let Some(node) = opt_node {
            let parent = self.nodes[node].parent();
            let next_diff = match parent {
                Some(parent) => -self.which_child(parent, node).sign(),
                None => 0,
            };

            let balance = self.nodes[node].balance() + diff;

            match balance {
                -2 | 2 => {
                    let heavy = if balance > 0 { Dir::Right } else { Dir::Left };
                    let child = self.nodes[node]
                        .child(heavy)
                        .expect("heavy side must have a child");
                    let child_balance = self.nodes[child].balance();

                    if child_balance == heavy.sign() {
                        self.rotate(node, !heavy);
                        self.nodes[node].set_balance(0);
                        self.nodes[child].set_balance(0);
                    } else if child_balance == -heavy.sign() {
                        self.rotate_twice(node, heavy);
                    } else {
                        self.rotate(node, !heavy);
                        self.nodes[node].set_balance(heavy.sign());
                        self.nodes[child].set_balance(-heavy.sign());

                        trace!(node = ?node, "remove: rotation preserved height");
                        return;
                    }
                }

                // The subtree lost a level. Keep climbing.
                0 => self.nodes[node].set_balance(0),

                _ => {
                    self.nodes[node].set_balance(balance);
                    trace!(node = ?node, "remove: absorbed");
                    return;
                }
            }

            opt_node = parent;
            diff = next_diff;
        }
    }

    // Performs a rotation, moving `node` down toward `dir` and its child on the other side up.
    //
    // `rotate(n, Dir::Left)` is a left rotation and `rotate(n, Dir::Right)` a right rotation.
    // Returns the new root of the subtree. The balances of affected nodes are not updated.
    fn rotate(&mut self, node: NodeId, dir: Dir) -> NodeId {
        let up = self.nodes[node]
            .child(!dir)
            .expect("rotation requires a child on the rising side");

        trace!(?node, ?up, ?dir, "rotate");

        // - `node` becomes the `dir` child of `up`.
        // - `across` goes from the `dir` child of `up` to the `!dir` child of `node`.
        let across = self.nodes[up].child(dir);
        self.nodes[node].set_child(!dir, across);
        self.maybe_set_parent(across, Some(node));

        let parent = self.nodes[node].parent();
        self.replace_child_or_set_root(parent, node, Some(up));
        self.nodes[up].set_parent(parent);

        self.nodes[up].set_child(dir, Some(node));
        self.nodes[node].set_parent(Some(up));

        up
    }

    // Resolves a ±2 imbalance at `node` whose `heavy` child leans the other way.
    //
    // The heavy child's inner child (the pivot) is raised above both, and the new balances follow
    // from the pivot's balance before the rotations. Returns the pivot.
    fn rotate_twice(&mut self, node: NodeId, heavy: Dir) -> NodeId {
        let child = self.nodes[node]
            .child(heavy)
            .expect("heavy side must have a child");
        let pivot = self.nodes[child]
            .child(!heavy)
            .expect("inner grandchild must exist for a double rotation");
        let pivot_balance = self.nodes[pivot].balance();

        self.rotate(child, heavy);
        self.rotate(node, !heavy);

        let (node_balance, child_balance) = if pivot_balance == heavy.sign() {
            (-heavy.sign(), 0)
        } else if pivot_balance == -heavy.sign() {
            (0, heavy.sign())
        } else {
            (0, 0)
        };

        self.nodes[node].set_balance(node_balance);
        self.nodes[child].set_balance(child_balance);
        self.nodes[pivot].set_balance(0);

        pivot
    }

    // Exchanges the tree positions of `a` and `b`, including their balances.
    //
    // Keys and values stay with their handles; only the links move.
    fn swap(&mut self, a: NodeId, b: NodeId) {
        self.swap_positions(a, b);

        let balance_a = self.nodes[a].balance();
        let balance_b = self.nodes[b].balance();
        self.nodes[a].set_balance(balance_b);
        self.nodes[b].set_balance(balance_a);
    }

    // Exchanges the tree positions of `a` and `b`.
    //
    // Either node may be the parent of the other.
    fn swap_positions(&mut self, a: NodeId, b: NodeId) {
        if a == b {
            return;
        }

        let (pa, la, ra) = self.nodes[a].links();
        let (pb, lb, rb) = self.nodes[b].links();
        let up_a = pa.map(|p| (p, self.which_child(p, a)));
        let up_b = pb.map(|p| (p, self.which_child(p, b)));

        let exchanged = |link: Link| match link {
            Some(x) if x == a => Some(b),
            Some(x) if x == b => Some(a),
            other => other,
        };

        // Repoint the outside neighbors.
        for (up, other) in [(up_a, b), (up_b, a)] {
            match up {
                None => self.root = Some(other),
                Some((parent, _)) if parent == a || parent == b => {}
                Some((parent, side)) => {
                    self.nodes[parent].set_child(side, Some(other));
                }
            }
        }

        for (children, other) in [([la, ra], b), ([lb, rb], a)] {
            for child in children.into_iter().flatten() {
                if child != a && child != b {
                    self.nodes[child].set_parent(Some(other));
                }
            }
        }

        self.nodes[a].set_links(exchanged(pb), exchanged(lb), exchanged(rb));
        self.nodes[b].set_links(exchanged(pa), exchanged(la), exchanged(ra));
    }

    // Support methods ========================================================

    #[inline]
    fn entry(&self, id: NodeId) -> (&K, &V) {
        let node = &self.nodes[id];
        (&node.key, &node.value)
    }

    #[inline]
    fn which_child(&self, parent: NodeId, child: NodeId) -> Dir {
        if self.nodes[parent].left() == Some(child) {
            Dir::Left
        } else {
            debug_assert_eq!(self.nodes[parent].right(), Some(child));
            Dir::Right
        }
    }

    // Returns the last node reached by following `dir` links from `from`.
    #[inline]
    fn extreme(&self, from: NodeId, dir: Dir) -> NodeId {
        let mut cur = from;

        while let Some(next) = self.nodes[cur].child(dir) {
            cur = next;
        }

        cur
    }

    // Returns the in-order neighbor of `id` on the `dir` side.
    fn neighbor(&self, id: NodeId, dir: Dir) -> Link {
        if let Some(child) = self.nodes[id].child(dir) {
            return Some(self.extreme(child, !dir));
        }

        // Ascend until we arrive from the `!dir` side.
        let mut cur = id;
        while let Some(parent) = self.nodes[cur].parent() {
            if self.nodes[parent].child(!dir) == Some(cur) {
                return Some(parent);
            }

            cur = parent;
        }

        None
    }

    #[inline]
    fn maybe_set_parent(&mut self, link: Link, parent: Link) {
        if let Some(node) = link {
            self.nodes[node].set_parent(parent);
        }
    }

    // Replaces the child link of `parent` pointing at `old_child` with `new_child`, or replaces
    // the root if `parent` is `None`.
    //
    // `new_child`'s parent link is not updated.
    #[inline]
    fn replace_child_or_set_root(&mut self, parent: Link, old_child: NodeId, new_child: Link) {
        match parent {
            Some(parent) => {
                let side = self.which_child(parent, old_child);
                self.nodes[parent].set_child(side, new_child);
            }
            None => self.root = new_child,
        }
    }
}

impl<K: Ord, V> AvlTree<K, V> {
    /// Returns the handle of the node holding `key`.
    pub fn find<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut opt_cur = self.root;

        loop {
            let cur = opt_cur?;
            let node = &self.nodes[cur];

            match key.cmp(node.key.borrow()) {
                Ordering::Less => opt_cur = node.left(),
                Ordering::Equal => return Some(cur),
                Ordering::Greater => opt_cur = node.right(),
            }
        }
    }

    /// Returns `true` if the tree contains a value associated with `key`.
    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Returns a reference to the value associated with `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).map(|id| &self.nodes[id].value)
    }

    /// Returns the key-value pair associated with `key`.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).map(|id| self.entry(id))
    }

    /// Returns a mutable reference to the value associated with `key`.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let id = self.find(key)?;
        Some(&mut self.nodes[id].value)
    }

    /// Returns a reference to the value associated with `key`, failing if there is none.
    pub fn at<Q>(&self, key: &Q) -> Result<&V, KeyError>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).ok_or(KeyError)
    }

    /// Returns a mutable reference to the value associated with `key`, failing if there is none.
    pub fn at_mut<Q>(&mut self, key: &Q) -> Result<&mut V, KeyError>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get_mut(key).ok_or(KeyError)
    }

    /// Inserts a key-value pair into the tree.
    ///
    /// If the key is already present, its value is replaced and the old value is returned. The
    /// shape of the tree is left untouched in that case.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let Some(root) = self.root else {
            // Tree is empty. Set the new node as the root and return.
            self.root = Some(self.nodes.alloc(Node::new(key, value, None)));
            return None;
        };

        let mut parent = root;

        // Descend the tree, looking for a free child slot.
        let dir = loop {
            let ordering = key.cmp(&self.nodes[parent].key);

            let dir = match ordering {
                Ordering::Less => Dir::Left,
                Ordering::Equal => {
                    return Some(mem::replace(&mut self.nodes[parent].value, value));
                }
                Ordering::Greater => Dir::Right,
            };

            match self.nodes[parent].child(dir) {
                Some(child) => parent = child,
                None => break dir,
            }
        };

        let id = self.nodes.alloc(Node::new(key, value, Some(parent)));
        self.nodes[parent].set_child(dir, Some(id));

        if self.nodes[parent].balance() != 0 {
            // The new node filled the shorter side of `parent`, whose height is unchanged.
            self.nodes[parent].set_balance(0);
        } else {
            self.nodes[parent].set_balance(dir.sign());
            self.rebalance_inserted(parent);
        }

        None
    }

    /// Removes the value associated with `key` from the tree.
    ///
    /// Removing a key that is not present is a no-op.
    ///
    /// This operation completes in _O(log(n))_ time.
    #[inline]
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes the key-value pair associated with `key` from the tree.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let id = self.find(key)?;
        self.remove_node(id)
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        let Some(root) = self.root else {
            assert_eq!(self.len(), 0, "empty tree has live nodes");
            return;
        };

        assert_eq!(self.nodes[root].parent(), None, "root has a parent link");

        let mut count = 0;
        self.assert_invariants_at(root, &mut count);
        assert_eq!(count, self.len(), "live nodes unreachable from the root");

        let mut keys = self.keys();
        if let Some(mut prev) = keys.next() {
            for key in keys {
                assert!(prev < key, "keys out of order");
                prev = key;
            }
        }
    }

    // Checks the subtree rooted at `id` and returns its height.
    fn assert_invariants_at(&self, id: NodeId, count: &mut usize) -> usize {
        *count += 1;
        let node = &self.nodes[id];

        let mut heights = [0; 2];
        for dir in [Dir::Left, Dir::Right] {
            if let Some(child) = node.child(dir) {
                // Ensure child's parent link points to this node.
                assert_eq!(
                    self.nodes[child].parent(),
                    Some(id),
                    "child parent link not set"
                );

                heights[dir as usize] = self.assert_invariants_at(child, count);
            }
        }

        let balance = heights[Dir::Right as usize] as isize - heights[Dir::Left as usize] as isize;
        assert!((-1..=1).contains(&balance), "subtree at {id:?} is unbalanced");
        assert_eq!(
            node.balance() as isize,
            balance,
            "stored balance of {id:?} has drifted"
        );

        1 + heights[0].max(heights[1])
    }
}

impl<K, V> Default for AvlTree<K, V> {
    fn default() -> Self {
        AvlTree::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for AvlTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for AvlTree<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq> Eq for AvlTree<K, V> {}

impl<K: Ord, V> FromIterator<(K, V)> for AvlTree<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = AvlTree::new();
        tree.extend(iter);
        tree
    }
}

impl<K: Ord, V> Extend<(K, V)> for AvlTree<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'tree, K, V> IntoIterator for &'tree AvlTree<K, V> {
    type Item = (&'tree K, &'tree V);
    type IntoIter = Iter<'tree, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
