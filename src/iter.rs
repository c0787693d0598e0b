use core::iter::FusedIterator;

use crate::{
    node::{Dir, Link},
    AvlTree,
};

/// An in-order iterator over the entries of an [`AvlTree`].
pub struct Iter<'tree, K, V> {
    tree: &'tree AvlTree<K, V>,

    front: Link,
    back: Link,

    len: usize,
}

impl<'tree, K, V> Iter<'tree, K, V> {
    pub(crate) fn new(tree: &'tree AvlTree<K, V>) -> Self {
        Iter {
            tree,

            front: tree.first(),
            back: tree.last(),
            len: tree.len(),
        }
    }

    fn step(&mut self, dir: Dir) -> Option<(&'tree K, &'tree V)> {
        if self.len == 0 {
            return None;
        }

        let end = match dir {
            Dir::Right => &mut self.front,
            Dir::Left => &mut self.back,
        };

        let cur = (*end)?;
        *end = self.tree.neighbor(cur, dir);
        self.len -= 1;

        Some(self.tree.entry(cur))
    }
}

impl<'tree, K, V> Iterator for Iter<'tree, K, V> {
    type Item = (&'tree K, &'tree V);

    fn next(&mut self) -> Option<Self::Item> {
        self.step(Dir::Right)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.step(Dir::Left)
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            tree: self.tree,
            front: self.front,
            back: self.back,
            len: self.len,
        }
    }
}

/// An in-order iterator over the keys of an [`AvlTree`].
pub struct Keys<'tree, K, V> {
    inner: Iter<'tree, K, V>,
}

impl<'tree, K, V> Keys<'tree, K, V> {
    pub(crate) fn new(tree: &'tree AvlTree<K, V>) -> Self {
        Keys {
            inner: Iter::new(tree),
        }
    }
}

impl<'tree, K, V> Iterator for Keys<'tree, K, V> {
    type Item = &'tree K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(key, _)| key)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// An in-order iterator over the values of an [`AvlTree`].
pub struct Values<'tree, K, V> {
    inner: Iter<'tree, K, V>,
}

impl<'tree, K, V> Values<'tree, K, V> {
    pub(crate) fn new(tree: &'tree AvlTree<K, V>) -> Self {
        Values {
            inner: Iter::new(tree),
        }
    }
}

impl<'tree, K, V> Iterator for Values<'tree, K, V> {
    type Item = &'tree V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, value)| value)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

impl<K, V> FusedIterator for Values<'_, K, V> {}
