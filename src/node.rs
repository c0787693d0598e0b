use core::{fmt, mem, ops::Not};

/// A stable handle to a node stored in an [`AvlTree`](crate::AvlTree).
///
/// A handle stays attached to its key for as long as the key is in the tree. Rotations, removals
/// of other keys and predecessor swaps never move a key to a different handle. Once the key is
/// removed the handle goes stale: its slot may be reused, but under a newer generation, so the
/// old handle never resolves to the new occupant.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    #[inline]
    pub(crate) fn new(index: usize, generation: u32) -> NodeId {
        NodeId {
            index: u32::try_from(index).expect("arena index exceeds u32::MAX"),
            generation,
        }
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.index as usize
    }

    #[inline]
    pub(crate) fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

pub(crate) type Link = Option<NodeId>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Dir {
    Left = 0,
    Right = 1,
}

impl Dir {
    /// The balance contribution of growing the subtree on this side.
    #[inline]
    pub(crate) fn sign(self) -> i8 {
        match self {
            Dir::Left => -1,
            Dir::Right => 1,
        }
    }
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

/// A key-value pair together with its tree links.
///
/// The balance factor is `height(right) - height(left)` and is always in `-1..=1` outside of a
/// mutation.
#[derive(Clone)]
pub struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    parent: Link,
    children: [Link; 2],
    balance: i8,
}

impl<K, V> Node<K, V> {
    pub(crate) fn new(key: K, value: V, parent: Link) -> Self {
        Node {
            key,
            value,
            parent,
            children: [None; 2],
            balance: 0,
        }
    }

    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    #[inline]
    pub fn value(&self) -> &V {
        &self.value
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub fn left(&self) -> Option<NodeId> {
        self.child(Dir::Left)
    }

    #[inline]
    pub fn right(&self) -> Option<NodeId> {
        self.child(Dir::Right)
    }

    /// Returns `height(right) - height(left)`.
    #[inline]
    pub fn balance(&self) -> i8 {
        self.balance
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.left().is_none() && self.right().is_none()
    }

    #[inline]
    pub(crate) fn into_entry(self) -> (K, V) {
        (self.key, self.value)
    }

    #[inline]
    pub(crate) fn child(&self, dir: Dir) -> Link {
        self.children[dir as usize]
    }

    #[inline]
    pub(crate) fn set_parent(&mut self, parent: Link) -> Link {
        mem::replace(&mut self.parent, parent)
    }

    #[inline]
    pub(crate) fn set_child(&mut self, dir: Dir, child: Link) -> Link {
        mem::replace(&mut self.children[dir as usize], child)
    }

    #[inline]
    pub(crate) fn set_links(&mut self, parent: Link, left: Link, right: Link) {
        self.parent = parent;
        self.children = [left, right];
    }

    #[inline]
    pub(crate) fn set_balance(&mut self, balance: i8) {
        self.balance = balance;
    }

    #[inline]
    pub(crate) fn links(&self) -> (Link, Link, Link) {
        (self.parent, self.left(), self.right())
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Node<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("parent", &self.parent)
            .field("left", &self.left())
            .field("right", &self.right())
            .field("balance", &self.balance)
            .finish()
    }
}
