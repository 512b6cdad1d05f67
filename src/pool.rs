//! A fixed-capacity slab allocator for objects that are created and retired at a high rate.
//!
//! An `ObjectPool<T>` preallocates `capacity` default-initialized slots when it is initialized
//! and hands them out through a free list. Acquiring and releasing a slot never allocates, so the
//! cost of scheduling thousands of events per simulated day does not depend on the allocator.
//!
//! The capacity is fixed for the lifetime of the pool. It is sized from the expected peak
//! population, and running out of slots means that estimate was wrong: `acquire` returns
//! `SimError::PoolExhausted` rather than growing the slab.
//!
//! Slots are addressed by a `PoolKey` that carries a generation counter. A key becomes stale as
//! soon as its slot is released, so `get` on a released key returns `None` instead of handing out
//! whatever now occupies the slot.

use log::trace;

use crate::error::SimError;

/// A handle to a live slot in an [`ObjectPool`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PoolKey {
    index: u32,
    generation: u32,
}

impl PoolKey {
    /// The slot index this key refers to.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

struct Slot<T> {
    value: T,
    generation: u32,
    occupied: bool,
}

pub struct ObjectPool<T: Default> {
    name: &'static str,
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    live: usize,
}

impl<T: Default> ObjectPool<T> {
    /// Creates a pool with every one of its `capacity` slots allocated up front.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` does not fit in a `u32` slot index.
    #[must_use]
    pub fn initialize_pool(name: &'static str, capacity: usize) -> ObjectPool<T> {
        let capacity_u32 = u32::try_from(capacity).expect("Pool capacity too large");
        trace!("initializing object pool `{name}` with {capacity} slots");
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || Slot {
            value: T::default(),
            generation: 0,
            occupied: false,
        });
        // Reverse so that slot 0 is handed out first.
        let free_list = (0..capacity_u32).rev().collect();
        ObjectPool {
            name,
            slots,
            free_list,
            live: 0,
        }
    }

    /// Drops every slot. Keys handed out earlier are stale afterwards.
    pub fn release_pool(&mut self) {
        trace!(
            "releasing object pool `{}` ({} live objects)",
            self.name,
            self.live
        );
        self.slots = Vec::new();
        self.free_list = Vec::new();
        self.live = 0;
    }

    /// Takes a slot from the free list and resets it to `T::default()`.
    ///
    /// # Errors
    ///
    /// Returns `SimError::PoolExhausted` if every slot is live.
    pub fn acquire(&mut self) -> Result<PoolKey, SimError> {
        let Some(index) = self.free_list.pop() else {
            return Err(SimError::PoolExhausted {
                pool: self.name,
                capacity: self.capacity(),
            });
        };
        let slot = &mut self.slots[index as usize];
        slot.value = T::default();
        slot.occupied = true;
        self.live += 1;
        Ok(PoolKey {
            index,
            generation: slot.generation,
        })
    }

    /// Acquires a slot and moves `value` into it.
    ///
    /// # Errors
    ///
    /// Returns `SimError::PoolExhausted` if every slot is live.
    pub fn acquire_with(&mut self, value: T) -> Result<PoolKey, SimError> {
        let key = self.acquire()?;
        self.slots[key.index()].value = value;
        Ok(key)
    }

    /// Returns the slot to the free list.
    ///
    /// # Panics
    ///
    /// Panics if the key has already been released.
    pub fn release(&mut self, key: PoolKey) {
        let name = self.name;
        let slot = self
            .slots
            .get_mut(key.index())
            .filter(|slot| slot.occupied && slot.generation == key.generation)
            .unwrap_or_else(|| panic!("Slot released twice in pool `{name}`"));
        slot.occupied = false;
        slot.generation = slot.generation.wrapping_add(1);
        slot.value = T::default();
        self.free_list.push(key.index);
        self.live -= 1;
    }

    #[must_use]
    pub fn get(&self, key: PoolKey) -> Option<&T> {
        self.slots
            .get(key.index())
            .filter(|slot| slot.occupied && slot.generation == key.generation)
            .map(|slot| &slot.value)
    }

    pub fn get_mut(&mut self, key: PoolKey) -> Option<&mut T> {
        self.slots
            .get_mut(key.index())
            .filter(|slot| slot.occupied && slot.generation == key.generation)
            .map(|slot| &mut slot.value)
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots currently acquired and not yet released.
    #[must_use]
    pub fn live(&self) -> usize {
        self.live
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T: Default> Default for ObjectPool<T> {
    fn default() -> Self {
        ObjectPool::initialize_pool("unnamed", 0)
    }
}
