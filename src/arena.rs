use core::ops::{Index, IndexMut};

use tracing::trace;

use crate::node::{Node, NodeId};

/// Slot storage for tree nodes.
///
/// Freed slots are kept on a free list and handed out again by later allocations. Every slot
/// carries a generation that is bumped when its node is freed, and lookups compare it against the
/// generation recorded in the [`NodeId`], so a handle to a removed node stays dead.
#[derive(Clone)]
pub(crate) struct Arena<K, V> {
    slots: Vec<Slot<K, V>>,
    free: Vec<usize>,
}

#[derive(Clone)]
struct Slot<K, V> {
    generation: u32,
    node: Option<Node<K, V>>,
}

impl<K, V> Arena<K, V> {
    pub(crate) const fn new() -> Self {
        Arena {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Returns the number of live nodes.
    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub(crate) fn alloc(&mut self, node: Node<K, V>) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                debug_assert!(slot.node.is_none());
                slot.node = Some(node);

                let id = NodeId::new(index, slot.generation);
                trace!(?id, "arena: reusing slot");
                id
            }
            None => {
                let id = NodeId::new(self.slots.len(), 0);
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                id
            }
        }
    }

    /// Takes the node out of its slot and retires `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not refer to a live node.
    pub(crate) fn free(&mut self, id: NodeId) -> Node<K, V> {
        let slot = self
            .slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
            .expect("freed a node that is not live");
        let node = slot.node.take().expect("freed a node that is not live");

        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());
        node
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&Node<K, V>> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node<K, V>> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_mut())
    }

    /// Drops every node. Slots are kept so that handles issued before the clear stay dead.
    pub(crate) fn clear(&mut self) {
        self.free.clear();

        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.node.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free.push(index);
        }
    }
}

impl<K, V> Index<NodeId> for Arena<K, V> {
    type Output = Node<K, V>;

    #[inline]
    fn index(&self, id: NodeId) -> &Self::Output {
        self.get(id).expect("dangling node id")
    }
}

impl<K, V> IndexMut<NodeId> for Arena<K, V> {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut Self::Output {
        self.get_mut(id).expect("dangling node id")
    }
}
