use std::marker::PhantomData;
use crate::core::{BodyHandle, JointHandle};
use crate::error::PhysicsError;
use crate::Result;

/// A handle made of a slot index and the generation of that slot
pub trait ArenaHandle: Copy + std::fmt::Debug {
    fn from_parts(index: u32, generation: u32) -> Self;
    fn index(&self) -> u32;
    fn generation(&self) -> u32;
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot storage with generation-checked handles.
///
/// Removing an item bumps the generation of its slot, so handles to removed
/// items are rejected even after the slot is reused. Iteration follows slot
/// order and is therefore deterministic.
#[derive(Debug, Clone)]
pub struct Arena<H: ArenaHandle, T> {
    slots: Vec<Slot<T>>,
    free_slots: Vec<u32>,
    len: usize,
    _handle: PhantomData<H>,
}

/// Storage for rigid bodies
pub type BodyStorage<T> = Arena<BodyHandle, T>;

/// Storage for joints
pub type JointStorage<T> = Arena<JointHandle, T>;

impl<H: ArenaHandle, T> Arena<H, T> {
    /// Creates a new empty storage
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_slots: Vec::new(),
            len: 0,
            _handle: PhantomData,
        }
    }

    /// Adds an item and returns its handle
    pub fn insert(&mut self, item: T) -> H {
        self.len += 1;
        match self.free_slots.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.value = Some(item);
                H::from_parts(index, slot.generation)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    value: Some(item),
                });
                H::from_parts(index, 0)
            }
        }
    }

    pub fn get(&self, handle: H) -> Option<&T> {
        self.slots
            .get(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.value.as_ref())
    }

    pub fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.value.as_mut())
    }

    /// Like `get`, reporting a stale handle as `ResourceNotFound`
    pub fn try_get(&self, handle: H) -> Result<&T> {
        self.get(handle)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("no item for handle {:?}", handle)))
    }

    /// Like `get_mut`, reporting a stale handle as `ResourceNotFound`
    pub fn try_get_mut(&mut self, handle: H) -> Result<&mut T> {
        self.get_mut(handle)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("no item for handle {:?}", handle)))
    }

    pub fn contains(&self, handle: H) -> bool {
        self.get(handle).is_some()
    }

    /// Removes an item, invalidating every handle to it
    pub fn remove(&mut self, handle: H) -> Option<T> {
        let index = handle.index();
        let slot = self.slots.get_mut(index as usize)?;
        if slot.generation != handle.generation() {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_slots.push(index);
        self.len -= 1;
        Some(value)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Removes every item; all previously issued handles become stale
    pub fn clear(&mut self) {
        self.free_slots.clear();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free_slots.push(index as u32);
        }
        self.free_slots.reverse();
        self.len = 0;
    }

    /// Handles of all live items, in slot order
    pub fn handles(&self) -> Vec<H> {
        self.iter().map(|(handle, _)| handle).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (H, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value
                .as_ref()
                .map(|value| (H::from_parts(index as u32, slot.generation), value))
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (H, &mut T)> + '_ {
        self.slots.iter_mut().enumerate().filter_map(|(index, slot)| {
            let generation = slot.generation;
            slot.value
                .as_mut()
                .map(|value| (H::from_parts(index as u32, generation), value))
        })
    }
}

impl<H: ArenaHandle, T> Default for Arena<H, T> {
    fn default() -> Self {
        Self::new()
    }
}
