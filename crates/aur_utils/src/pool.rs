use std::num::NonZeroU32;

/// Untyped handle for a [`Pool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    pub index: u32,
    pub generation: NonZeroU32,
}

/// Generational pool. Stores values of type `T` and hands out copyable handles made of a 32-bit
/// index and a 32-bit generation. The generation makes stale handles (ones whose slot has been
/// freed and reused) detectable instead of silently aliasing the new value.
///
/// Panics on 32-bit index or generation overflow. `get`/`get_mut` panic on stale handles, the
/// `try_*` variants don't.
///
/// ## Example
/// ```
/// # use aur_utils::Pool;
/// let mut screens: Pool<&str> = Pool::new();
///
/// let handle = screens.allocate("main screen");
/// assert_eq!(*screens.get(handle), "main screen");
///
/// assert_eq!(screens.deallocate(handle), Some("main screen"));
/// assert!(screens.try_get(handle).is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Pool<T> {
    top_generation: NonZeroU32,
    free_indices: Vec<u32>,
    slots: Vec<Option<(NonZeroU32, T)>>,

    /// The amount of slots to grow by once the free list runs dry.
    pub growth_amount: NonZeroU32,
}

impl<T> Pool<T> {
    pub fn new() -> Self {
        Self {
            top_generation: NonZeroU32::MIN,
            free_indices: vec![],
            slots: vec![],
            growth_amount: NonZeroU32::new(8).unwrap(),
        }
    }

    /// Moves `value` into the pool and returns its handle.
    pub fn allocate(&mut self, value: T) -> PoolHandle {
        if self.free_indices.is_empty() {
            let low = self.slots.len() as u32;
            let high = low
                .checked_add(self.growth_amount.get())
                .expect("pool index overflow");

            // Reversed, so that pop hands out the lowest indices first
            self.free_indices.extend((low..high).rev());
            self.slots.extend((low..high).map(|_| None));
        }

        let index = self.free_indices.pop().unwrap();
        let generation = self.top_generation;
        self.top_generation = generation.checked_add(1).expect("pool generation overflow");

        self.slots[index as usize] = Some((generation, value));
        PoolHandle { index, generation }
    }

    /// Removes the value behind `handle` and returns it. Stale handles return [`None`].
    pub fn deallocate(&mut self, handle: PoolHandle) -> Option<T> {
        if !self.is_valid(handle) {
            return None;
        }

        self.free_indices.push(handle.index);
        self.slots[handle.index as usize]
            .take()
            .map(|(_, value)| value)
    }

    /// ## Panics
    /// Panics if the handle is stale.
    pub fn get(&self, handle: PoolHandle) -> &T {
        self.try_get(handle).expect("stale pool handle")
    }

    /// ## Panics
    /// Panics if the handle is stale.
    pub fn get_mut(&mut self, handle: PoolHandle) -> &mut T {
        self.try_get_mut(handle).expect("stale pool handle")
    }

    pub fn try_get(&self, handle: PoolHandle) -> Option<&T> {
        match self.slots.get(handle.index as usize)? {
            Some((generation, value)) if *generation == handle.generation => Some(value),
            _ => None,
        }
    }

    pub fn try_get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        match self.slots.get_mut(handle.index as usize)? {
            Some((generation, value)) if *generation == handle.generation => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub fn is_valid(&self, handle: PoolHandle) -> bool {
        self.try_get(handle).is_some()
    }

    /// Iterates over all live values, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().flatten().map(|(_, value)| value)
    }

    /// Iterates mutably over all live values, in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut().flatten().map(|(_, value)| value)
    }

    /// Removes every live value, returning them in slot order.
    pub fn drain(&mut self) -> Vec<T> {
        self.free_indices.clear();
        self.free_indices.extend((0..self.slots.len() as u32).rev());
        self.slots
            .iter_mut()
            .filter_map(|slot| slot.take().map(|(_, value)| value))
            .collect()
    }

    /// Counts occupied slots. Linear in the pool's capacity.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}
