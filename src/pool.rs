//! Typed object pool with generation-checked handles.
//!
//! Released slots go onto a free list and are handed out again by the next
//! [`Pool::acquire`], reset to `T::default()`. Every release bumps the slot's
//! generation, so a [`Handle`] kept past its release never resolves again.
//!
//! ```
//! use auto_2048::pool::Pool;
//! let mut pool: Pool<u64> = Pool::new();
//! let a = pool.acquire().unwrap();
//! *pool.get_mut(a).unwrap() = 7;
//! assert!(pool.release(a));
//! assert!(pool.get(a).is_none());
//! let b = pool.acquire().unwrap();
//! assert_eq!(pool.get(b), Some(&0));
//! assert_eq!(pool.capacity(), 1);
//! ```

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// No free slot and no room to allocate another.
    #[error("object pool exhausted ({capacity} slots)")]
    Exhausted { capacity: usize },
    /// The handle's slot was released since the handle was issued.
    #[error("stale pool handle")]
    Stale,
}

/// Index into a [`Pool`] plus the generation it was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    #[inline]
    pub fn index(self) -> usize { self.index as usize }
}

#[derive(Debug)]
struct Slot<T> {
    value: T,
    generation: u32,
    live: bool,
}

#[derive(Debug)]
pub struct Pool<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
    limit: usize,
}

impl<T: Default> Default for Pool<T> {
    fn default() -> Self { Self::new() }
}

impl<T: Default> Pool<T> {
    pub fn new() -> Self { Self::with_limit(u32::MAX as usize) }

    /// Pool that refuses to grow past `limit` slots.
    pub fn with_limit(limit: usize) -> Self {
        Self { slots: Vec::new(), free: Vec::new(), live: 0, limit: limit.min(u32::MAX as usize) }
    }

    /// Take a slot off the free list, or allocate a new one.
    pub fn acquire(&mut self) -> Result<Handle, PoolError> {
        let index = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.value = T::default();
                slot.live = true;
                index
            }
            None => {
                if self.slots.len() >= self.limit || self.slots.try_reserve(1).is_err() {
                    return Err(PoolError::Exhausted { capacity: self.slots.len() });
                }
                self.slots.push(Slot { value: T::default(), generation: 0, live: true });
                (self.slots.len() - 1) as u32
            }
        };
        self.live += 1;
        Ok(Handle { index, generation: self.slots[index as usize].generation })
    }

    /// Return a slot to the free list. False if `handle` was already stale.
    pub fn release(&mut self, handle: Handle) -> bool {
        let Some(slot) = self.slot_mut(handle) else { return false };
        slot.live = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.live -= 1;
        true
    }

    #[inline]
    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slots
            .get(handle.index())
            .filter(|s| s.live && s.generation == handle.generation)
            .map(|s| &s.value)
    }

    #[inline]
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slot_mut(handle).map(|s| &mut s.value)
    }

    #[inline]
    pub fn contains(&self, handle: Handle) -> bool { self.get(handle).is_some() }

    /// Slots currently handed out.
    #[inline]
    pub fn live(&self) -> usize { self.live }

    /// Slots ever allocated, live or free.
    #[inline]
    pub fn capacity(&self) -> usize { self.slots.len() }

    fn slot_mut(&mut self, handle: Handle) -> Option<&mut Slot<T>> {
        self.slots.get_mut(handle.index()).filter(|s| s.live && s.generation == handle.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn released_slots_are_reused() {
        let mut pool: Pool<Vec<u8>> = Pool::new();
        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        pool.get_mut(a).unwrap().push(1);
        assert_eq!(pool.live(), 2);
        assert!(pool.release(a));
        assert_eq!(pool.live(), 1);

        let c = pool.acquire().unwrap();
        assert_eq!(c.index(), a.index());
        assert_ne!(c, a);
        assert!(pool.get(c).unwrap().is_empty(), "reacquired value is reset");
        assert_eq!(pool.capacity(), 2);
        assert!(pool.contains(b));
    }

    #[test]
    fn stale_handles_never_resolve() {
        let mut pool: Pool<u32> = Pool::new();
        let a = pool.acquire().unwrap();
        assert!(pool.release(a));
        assert!(!pool.release(a), "double release is rejected");
        let b = pool.acquire().unwrap();
        assert!(pool.get(a).is_none());
        assert!(pool.get_mut(a).is_none());
        assert_eq!(pool.get(b), Some(&0));
        assert_eq!(pool.live(), 1);
    }

    #[test]
    fn limit_reports_exhaustion() {
        let mut pool: Pool<u8> = Pool::with_limit(2);
        let a = pool.acquire().unwrap();
        let _b = pool.acquire().unwrap();
        assert_eq!(pool.acquire(), Err(PoolError::Exhausted { capacity: 2 }));
        pool.release(a);
        assert!(pool.acquire().is_ok());
    }
}
