//! Keyed, insertion-ordered holder for the entities the page currently knows about.

use std::{
    collections::{BTreeMap, HashMap},
    hash::Hash,
};

use shared::{
    domain::{RequestId, UserId},
    protocol::{Instructor, Request},
};

pub trait Entity {
    type Key: Copy + Eq + Hash;

    fn key(&self) -> Self::Key;

    /// Rows that should not contribute to counts.
    fn is_countable(&self) -> bool {
        true
    }
}

impl Entity for Request {
    type Key = RequestId;

    fn key(&self) -> RequestId {
        self.id
    }
}

impl Entity for Instructor {
    type Key = UserId;

    fn key(&self) -> UserId {
        self.id
    }
}

struct Slot<E> {
    seq: u64,
    entity: E,
}

/// Replacing an existing key keeps its original position.
pub struct EntityStore<E: Entity> {
    slots: HashMap<E::Key, Slot<E>>,
    order: BTreeMap<u64, E::Key>,
    next_seq: u64,
}

impl<E: Entity> Default for EntityStore<E> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
            order: BTreeMap::new(),
            next_seq: 0,
        }
    }
}

impl<E: Entity> EntityStore<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the key was not present before.
    pub fn insert(&mut self, entity: E) -> bool {
        let key = entity.key();
        if let Some(slot) = self.slots.get_mut(&key) {
            slot.entity = entity;
            return false;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, key);
        self.slots.insert(key, Slot { seq, entity });
        true
    }

    pub fn remove(&mut self, key: E::Key) -> Option<E> {
        let slot = self.slots.remove(&key)?;
        self.order.remove(&slot.seq);
        Some(slot.entity)
    }

    pub fn get(&self, key: E::Key) -> Option<&E> {
        self.slots.get(&key).map(|slot| &slot.entity)
    }

    pub fn contains(&self, key: E::Key) -> bool {
        self.slots.contains_key(&key)
    }

    pub fn all(&self) -> impl DoubleEndedIterator<Item = &E> + '_ {
        self.order
            .values()
            .filter_map(move |key| self.slots.get(key).map(|slot| &slot.entity))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
