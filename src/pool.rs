//! Fixed-block pool supplying pre-allocated, index-addressable slots.
//!
//! Backed by [`slab::Slab`], the same contiguous-arena-with-stable-handles
//! idea the wider order-book corpus reaches for (it underlies `PriceLevel`'s
//! own order storage). `slab::Slab` grows on demand; this wrapper turns it
//! into the *fixed*-capacity contract §4.A requires by refusing `allocate`
//! once `len() == capacity`, so there is no heap traffic past construction.
//!
//! The pool is single-threaded: the order book is the only owner, and the
//! book itself is confined to one writer thread (§5). No atomics are needed
//! here; the lock-free CAS-on-head-pointer variant the spec allows for a
//! *generic*, cross-thread pool is not implemented because nothing in this
//! crate needs a pool shared across threads — the book's pool is private to
//! the market-data thread, and the ring buffers move the data that does
//! cross threads.

use slab::Slab;

use crate::error::CoreError;

/// A stable, `u32` handle into a [`Pool`].
///
/// `u32` rather than `usize` keeps `OrderNode` links compact; a pool backing
/// a book with `max_orders = 2^20` never needs more than 20 bits of index
/// space.
pub type Handle = u32;

/// Fixed-capacity pool of `T` slots with O(1) allocate/free.
#[derive(Debug)]
pub struct Pool<T> {
    slots: Slab<T>,
    capacity: usize,
}

impl<T> Pool<T> {
    /// Pre-allocates `capacity` slots. No further heap allocation occurs.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ZeroPoolCapacity`] if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, CoreError> {
        if capacity == 0 {
            return Err(CoreError::ZeroPoolCapacity);
        }
        Ok(Pool {
            slots: Slab::with_capacity(capacity),
            capacity,
        })
    }

    /// Total capacity this pool was constructed with.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots currently allocated (in use).
    #[inline]
    pub fn size_used(&self) -> usize {
        self.slots.len()
    }

    /// Allocates a slot holding `value`, returning its handle.
    ///
    /// Returns `None` when the pool is exhausted; the caller treats this the
    /// same way `add_order` treats pool exhaustion — a local, non-fatal
    /// `CapacityExceeded` result.
    #[inline]
    pub fn allocate(&mut self, value: T) -> Option<Handle> {
        if self.slots.len() >= self.capacity {
            return None;
        }
        Some(self.slots.insert(value) as Handle)
    }

    /// Returns the slot at `handle` to the free set, yielding its value.
    ///
    /// # Panics
    ///
    /// Panics if `handle` does not refer to a currently-allocated slot. The
    /// order book never calls this with a stale handle because `order_index`
    /// is the sole source of live handles and is updated atomically with
    /// pool state (§4.D, I1/I5).
    #[inline]
    pub fn deallocate(&mut self, handle: Handle) -> T {
        self.slots.remove(handle as usize)
    }

    /// Borrows the value at `handle`.
    #[inline]
    pub fn get(&self, handle: Handle) -> &T {
        &self.slots[handle as usize]
    }

    /// Mutably borrows the value at `handle`.
    #[inline]
    pub fn get_mut(&mut self, handle: Handle) -> &mut T {
        &mut self.slots[handle as usize]
    }
}
