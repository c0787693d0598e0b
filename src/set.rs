use core::{borrow::Borrow, fmt};

use crate::{AvlTree, Keys};

/// An ordered set based on an [`AvlTree`].
#[derive(Clone, PartialEq, Eq)]
pub struct AvlSet<T> {
    tree: AvlTree<T, ()>,
}

impl<T> AvlSet<T> {
    /// Creates a new, empty `AvlSet`.
    pub const fn new() -> Self {
        Self {
            tree: AvlTree::new(),
        }
    }

    /// Returns `true` if the set contains no elements.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the number of elements in the set.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns the minimum element of the set.
    #[inline]
    pub fn first(&self) -> Option<&T> {
        self.tree.first_key_value().map(|(value, _)| value)
    }

    /// Removes and returns the minimum element of the set.
    #[inline]
    pub fn pop_first(&mut self) -> Option<T> {
        self.tree.pop_first().map(|(value, _)| value)
    }

    /// Returns the maximum element of the set.
    #[inline]
    pub fn last(&self) -> Option<&T> {
        self.tree.last_key_value().map(|(value, _)| value)
    }

    /// Removes and returns the maximum element of the set.
    #[inline]
    pub fn pop_last(&mut self) -> Option<T> {
        self.tree.pop_last().map(|(value, _)| value)
    }

    /// Returns an iterator over the elements of the set, in ascending order.
    #[inline]
    pub fn iter(&self) -> Keys<'_, T, ()> {
        self.tree.keys()
    }

    /// Clears the set, removing all elements.
    #[inline]
    pub fn clear(&mut self) {
        self.tree.clear();
    }
}

impl<T: Ord> AvlSet<T> {
    /// Returns `true` if the set contains `value`.
    #[inline]
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.contains_key(value)
    }

    /// Adds `value` to the set.
    ///
    /// Returns `false` if the set already contained an equal element, which is left in place.
    #[inline]
    pub fn insert(&mut self, value: T) -> bool {
        self.tree.insert(value, ()).is_none()
    }

    /// Removes `value` from the set, returning whether it was present.
    #[inline]
    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.remove(value).is_some()
    }
}

impl<T> Default for AvlSet<T> {
    fn default() -> Self {
        AvlSet::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for AvlSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: Ord> FromIterator<T> for AvlSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = AvlSet::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

impl<'set, T> IntoIterator for &'set AvlSet<T> {
    type Item = &'set T;
    type IntoIter = Keys<'set, T, ()>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
