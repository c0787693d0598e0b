use crate::{
    node::{Dir, Link},
    AvlTree,
};

/// A cursor over an [`AvlTree`].
///
/// A cursor points either to an element of the tree or to a "ghost" non-element that connects the
/// last element to the first.
pub struct Cursor<'tree, K, V> {
    tree: &'tree AvlTree<K, V>,
    cur: Link,
}

impl<'tree, K, V> Cursor<'tree, K, V> {
    pub(crate) fn first(tree: &'tree AvlTree<K, V>) -> Cursor<'tree, K, V> {
        Cursor {
            cur: tree.first(),
            tree,
        }
    }

    pub(crate) fn last(tree: &'tree AvlTree<K, V>) -> Cursor<'tree, K, V> {
        Cursor {
            cur: tree.last(),
            tree,
        }
    }

    /// Moves the cursor to the next element of the `AvlTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method moves it to the first
    /// element. If it is pointing to the last element, this method moves it to the "ghost"
    /// non-element.
    pub fn move_next(&mut self) {
        self.cur = step(self.tree, self.cur, Dir::Right);
    }

    /// Moves the cursor to the previous element of the `AvlTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method moves it to the last
    /// element. If it is pointing to the first element, this method moves it to the "ghost"
    /// non-element.
    pub fn move_prev(&mut self) {
        self.cur = step(self.tree, self.cur, Dir::Left);
    }

    /// Returns the entry pointed to by the cursor.
    ///
    /// This returns `None` if the cursor is currently pointing to the "ghost" non-element.
    pub fn get(&self) -> Option<(&'tree K, &'tree V)> {
        self.cur.map(|id| self.tree.entry(id))
    }

    /// Returns the next entry.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method returns the first element.
    /// If it is pointing to the last element, this method returns `None`.
    pub fn peek_next(&self) -> Option<(&'tree K, &'tree V)> {
        step(self.tree, self.cur, Dir::Right).map(|id| self.tree.entry(id))
    }

    /// Returns the previous entry.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method returns the last element.
    /// If it is pointing to the first element, this method returns `None`.
    pub fn peek_prev(&self) -> Option<(&'tree K, &'tree V)> {
        step(self.tree, self.cur, Dir::Left).map(|id| self.tree.entry(id))
    }
}

/// A cursor over an [`AvlTree`] which supports editing operations.
///
/// A cursor points either to an element of the tree or to a "ghost" non-element that connects the
/// last element to the first.
pub struct CursorMut<'tree, K, V> {
    tree: &'tree mut AvlTree<K, V>,
    cur: Link,
}

impl<'tree, K, V> CursorMut<'tree, K, V> {
    pub(crate) fn first(tree: &'tree mut AvlTree<K, V>) -> CursorMut<'tree, K, V> {
        CursorMut {
            cur: tree.first(),
            tree,
        }
    }

    pub(crate) fn last(tree: &'tree mut AvlTree<K, V>) -> CursorMut<'tree, K, V> {
        CursorMut {
            cur: tree.last(),
            tree,
        }
    }

    /// Returns a read-only cursor pointing to the current element.
    ///
    /// The `CursorMut` remains immutably borrowed for the lifetime of the returned `Cursor`.
    pub fn as_cursor(&self) -> Cursor<'_, K, V> {
        Cursor {
            tree: &*self.tree,
            cur: self.cur,
        }
    }

    /// Moves the cursor to the next element of the `AvlTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method will move it to the first
    /// element. If it is pointing to the last element, this method will move it to the "ghost"
    /// non-element.
    pub fn move_next(&mut self) {
        self.cur = step(self.tree, self.cur, Dir::Right);
    }

    /// Moves the cursor to the previous element of the `AvlTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method will move it to the last
    /// element. If it is pointing to the first element, this method will move it to the "ghost"
    /// non-element.
    pub fn move_prev(&mut self) {
        self.cur = step(self.tree, self.cur, Dir::Left);
    }

    /// Returns the entry pointed to by the cursor.
    ///
    /// This returns `None` if the cursor is currently pointing to the "ghost" non-element.
    pub fn get(&self) -> Option<(&K, &V)> {
        self.cur.map(|id| self.tree.entry(id))
    }

    /// Returns the entry pointed to by the cursor, with a mutable reference to the value.
    ///
    /// This returns `None` if the cursor is currently pointing to the "ghost" non-element.
    pub fn get_mut(&mut self) -> Option<(&K, &mut V)> {
        let node = &mut self.tree.nodes[self.cur?];
        Some((&node.key, &mut node.value))
    }

    /// Returns the next entry.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method returns the first element.
    /// If it is pointing to the last element, this method returns `None`.
    pub fn peek_next(&self) -> Option<(&K, &V)> {
        step(self.tree, self.cur, Dir::Right).map(|id| self.tree.entry(id))
    }

    /// Returns the previous entry.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method returns the last element.
    /// If it is pointing to the first element, this method returns `None`.
    pub fn peek_prev(&self) -> Option<(&K, &V)> {
        step(self.tree, self.cur, Dir::Left).map(|id| self.tree.entry(id))
    }

    /// Removes the current element from the tree.
    ///
    /// This returns the removed entry and moves the cursor to the next element. If the cursor is
    /// pointing to the "ghost" non-element, this method returns `None`, and neither the tree nor
    /// the cursor is modified.
    pub fn remove_current(&mut self) -> Option<(K, V)> {
        self.remove_and_move(Dir::Right)
    }

    /// Removes the current element from the tree.
    ///
    /// This returns the removed entry and moves the cursor to the previous element. If the cursor
    /// is pointing to the "ghost" non-element, this method returns `None`, and neither the tree
    /// nor the cursor is modified.
    pub fn remove_current_and_move_prev(&mut self) -> Option<(K, V)> {
        self.remove_and_move(Dir::Left)
    }

    fn remove_and_move(&mut self, dir: Dir) -> Option<(K, V)> {
        let remove = self.cur?;

        // Removal never moves a surviving key to another handle, so the neighbor stays valid.
        self.cur = self.tree.neighbor(remove, dir);
        self.tree.remove_node(remove)
    }
}

fn step<K, V>(tree: &AvlTree<K, V>, cur: Link, dir: Dir) -> Link {
    match cur {
        Some(id) => tree.neighbor(id, dir),
        None => match dir {
            Dir::Right => tree.first(),
            Dir::Left => tree.last(),
        },
    }
}
