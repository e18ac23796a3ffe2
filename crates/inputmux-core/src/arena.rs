//! Generation-checked slot arena.
//!
//! Devices, seats and multiplexer sources live in arenas and are referred to
//! by copyable keys. Removing a value bumps its slot's generation, so keys
//! handed out earlier stop resolving instead of aliasing whatever value
//! reuses the slot.

use std::marker::PhantomData;

use inputmux_types::{DeviceId, SeatId};

/// A typed arena key made of a slot index and a generation.
pub trait ArenaKey: Copy {
    fn from_parts(index: u32, generation: u32) -> Self;
    fn index(self) -> u32;
    fn generation(self) -> u32;
}

impl ArenaKey for DeviceId {
    fn from_parts(index: u32, generation: u32) -> Self {
        DeviceId::new(index, generation)
    }

    fn index(self) -> u32 {
        DeviceId::index(self)
    }

    fn generation(self) -> u32 {
        DeviceId::generation(self)
    }
}

impl ArenaKey for SeatId {
    fn from_parts(index: u32, generation: u32) -> Self {
        SeatId::new(index, generation)
    }

    fn index(self) -> u32 {
        SeatId::index(self)
    }

    fn generation(self) -> u32 {
        SeatId::generation(self)
    }
}

#[derive(Debug)]
struct Slot<V> {
    generation: u32,
    value: Option<V>,
}

#[derive(Debug)]
pub struct Arena<K, V> {
    slots: Vec<Slot<V>>,
    free: Vec<u32>,
    len: usize,
    _key: PhantomData<K>,
}

impl<K: ArenaKey, V> Default for Arena<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ArenaKey, V> Arena<K, V> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
            _key: PhantomData,
        }
    }

    pub fn insert(&mut self, value: V) -> K {
        self.insert_with(|_| value)
    }

    /// Insert a value that needs to know its own key.
    pub fn insert_with(&mut self, make: impl FnOnce(K) -> V) -> K {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            let key = K::from_parts(index, slot.generation);
            slot.value = Some(make(key));
            return key;
        }
        let index = u32::try_from(self.slots.len()).expect("arena index overflow");
        let key = K::from_parts(index, 0);
        self.slots.push(Slot {
            generation: 0,
            value: Some(make(key)),
        });
        key
    }

    /// The key the next insertion will return.
    pub fn next_key(&self) -> K {
        match self.free.last() {
            Some(&index) => K::from_parts(index, self.slots[index as usize].generation),
            None => {
                let index = u32::try_from(self.slots.len()).expect("arena index overflow");
                K::from_parts(index, 0)
            }
        }
    }

    pub fn get(&self, key: K) -> Option<&V> {
        let slot = self.slots.get(key.index() as usize)?;
        if slot.generation != key.generation() {
            return None;
        }
        slot.value.as_ref()
    }

    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        let slot = self.slots.get_mut(key.index() as usize)?;
        if slot.generation != key.generation() {
            return None;
        }
        slot.value.as_mut()
    }

    pub fn contains(&self, key: K) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: K) -> Option<V> {
        let slot = self.slots.get_mut(key.index() as usize)?;
        if slot.generation != key.generation() {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(key.index());
        self.len -= 1;
        Some(value)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.iter().map(|(key, _)| key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let value = slot.value.as_ref()?;
            let index = u32::try_from(index).ok()?;
            Some((K::from_parts(index, slot.generation), value))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_key_does_not_alias_reused_slot() {
        let mut arena: Arena<DeviceId, &str> = Arena::new();
        let first = arena.insert("first");
        assert_eq!(arena.remove(first), Some("first"));

        let second = arena.insert("second");
        assert_eq!(first.index(), second.index());
        assert_ne!(first, second);
        assert_eq!(arena.get(first), None);
        assert_eq!(arena.get(second), Some(&"second"));
        assert_eq!(arena.remove(first), None);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn next_key_predicts_insert() {
        let mut arena: Arena<DeviceId, u8> = Arena::new();
        let predicted = arena.next_key();
        assert_eq!(arena.insert(1), predicted);
        arena.remove(predicted);
        let predicted = arena.next_key();
        assert_eq!(predicted.generation(), 1);
        assert_eq!(arena.insert(2), predicted);
    }

    #[test]
    fn insert_with_sees_own_key() {
        let mut arena: Arena<SeatId, SeatId> = Arena::new();
        let key = arena.insert_with(|key| key);
        assert_eq!(arena.get(key), Some(&key));
    }

    #[test]
    fn iter_skips_vacant_slots() {
        let mut arena: Arena<DeviceId, u32> = Arena::new();
        let a = arena.insert(1);
        let b = arena.insert(2);
        let c = arena.insert(3);
        arena.remove(b);
        let keys: Vec<_> = arena.keys().collect();
        assert_eq!(keys, vec![a, c]);
        assert!(!arena.is_empty());
    }
}
