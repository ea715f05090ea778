//! Dense, ID-indexed storage for netlist entities.

use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::ops::Index;

/// Trait for opaque ID types used as arena keys.
pub trait ArenaId: Copy {
    /// Creates an ID from a raw `u32` index.
    fn from_raw(index: u32) -> Self;

    /// Returns the raw `u32` index.
    fn as_raw(self) -> u32;
}

/// An append-only container indexed by typed IDs.
///
/// Items are never removed or reordered, so IDs stay valid and iteration
/// order is allocation order. Emission order is part of the netlist's
/// identity, which is what makes fingerprints reproducible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arena<I: ArenaId, T> {
    items: Vec<T>,
    #[serde(skip)]
    _marker: PhantomData<I>,
}

impl<I: ArenaId, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ArenaId, T> Arena<I, T> {
    /// Creates a new, empty arena.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Returns the ID the next [`alloc`](Self::alloc) will hand out.
    pub fn next_id(&self) -> I {
        I::from_raw(self.items.len() as u32)
    }

    /// Appends an item and returns its ID.
    pub fn alloc(&mut self, item: T) -> I {
        let id = self.next_id();
        self.items.push(item);
        id
    }

    /// Returns the item with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID is out of bounds.
    pub fn get(&self, id: I) -> &T {
        &self.items[id.as_raw() as usize]
    }

    /// Returns the item with the given ID, or `None` if out of bounds.
    pub fn try_get(&self, id: I) -> Option<&T> {
        self.items.get(id.as_raw() as usize)
    }

    /// Returns the number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over `(ID, &T)` pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (I::from_raw(i as u32), item))
    }

    /// Iterates over items in allocation order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<I: ArenaId, T> Index<I> for Arena<I, T> {
    type Output = T;

    fn index(&self, id: I) -> &T {
        self.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SignalId;

    #[test]
    fn alloc_is_sequential() {
        let mut arena: Arena<SignalId, &str> = Arena::new();
        assert_eq!(arena.next_id(), SignalId::from_raw(0));
        let a = arena.alloc("clk_i");
        let b = arena.alloc("ready");
        assert_eq!(a.as_raw(), 0);
        assert_eq!(b.as_raw(), 1);
        assert_eq!(arena[b], "ready");
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn try_get_out_of_bounds() {
        let arena: Arena<SignalId, u8> = Arena::new();
        assert!(arena.is_empty());
        assert!(arena.try_get(SignalId::from_raw(3)).is_none());
    }

    #[test]
    fn iter_in_allocation_order() {
        let mut arena: Arena<SignalId, u32> = Arena::new();
        for v in [10, 20, 30] {
            arena.alloc(v);
        }
        let collected: Vec<_> = arena.iter().map(|(id, v)| (id.as_raw(), *v)).collect();
        assert_eq!(collected, vec![(0, 10), (1, 20), (2, 30)]);
    }
}
