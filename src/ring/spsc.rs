//! Single-producer/single-consumer lock-free ring buffer.
//!
//! One producer thread calls [`SpscRing::try_push`]; one consumer thread
//! calls [`SpscRing::try_pop`]. Neither ever blocks or spins: push fails only
//! when the ring is full, pop only when it is empty.
//!
//! `write_pos`/`read_pos` are monotonically increasing `u64` sequence
//! counters rather than wrapped indices — with 2^64 values, wraparound is not
//! a practical concern even at billions of messages per second, which
//! sidesteps ABA entirely and keeps the slot index a simple
//! `sequence & mask` at the point of access. Each counter is wrapped in
//! [`crossbeam::utils::CachePadded`] so producer and consumer never bounce
//! the same cache line (§4.B: "read_pos and write_pos occupy separate cache
//! lines").
//!
//! Memory model: the producer writes the slot, then publishes with a
//! `Release` store to `write_pos`; the consumer observes that store with
//! `Acquire`, reads the slot, and publishes its own progress with a
//! `Release` store to `read_pos`. This is the same protocol the
//! `ringmpsc`/`qcu_core` family of SPSC rings in the wider corpus document.

use crossbeam::utils::CachePadded;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::CoreError;

/// Lock-free SPSC ring buffer of fixed, power-of-two capacity.
pub struct SpscRing<T> {
    write_pos: CachePadded<AtomicU64>,
    read_pos: CachePadded<AtomicU64>,
    mask: u64,
    buffer: Box<[UnsafeCell<MaybeUninit<T>>]>,
}

// Safety: a live `T` is moved into exactly one of `buffer`'s slots by the
// producer before `write_pos` is released, and out of exactly one slot by
// the consumer after `read_pos`'s corresponding acquire — the two threads
// never touch the same slot at the same time because `write_pos`/`read_pos`
// bound how far each side may run ahead. This holds only under the SPSC
// contract: exactly one producer, exactly one consumer.
unsafe impl<T: Send> Send for SpscRing<T> {}
unsafe impl<T: Send> Sync for SpscRing<T> {}

impl<T> SpscRing<T> {
    /// Creates a ring of the given capacity, which must be a power of two.
    pub fn new(capacity: usize) -> Result<Self, CoreError> {
        if capacity == 0 || !capacity.is_power_of_two() {
            return Err(CoreError::RingCapacityNotPowerOfTwo {
                requested: capacity,
            });
        }
        let mut buffer = Vec::with_capacity(capacity);
        buffer.resize_with(capacity, || UnsafeCell::new(MaybeUninit::uninit()));
        Ok(SpscRing {
            write_pos: CachePadded::new(AtomicU64::new(0)),
            read_pos: CachePadded::new(AtomicU64::new(0)),
            mask: (capacity - 1) as u64,
            buffer: buffer.into_boxed_slice(),
        })
    }

    /// Ring capacity (always a power of two).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Number of elements currently queued.
    #[inline]
    pub fn size(&self) -> usize {
        let w = self.write_pos.load(Ordering::Acquire);
        let r = self.read_pos.load(Ordering::Acquire);
        (w - r) as usize
    }

    /// True when the ring holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Attempts to push `value`. Returns `false` (and returns `value`
    /// untouched to the caller via the bool contract) only when the ring is
    /// full; producer-side, this is the sole failure mode.
    pub fn try_push(&self, value: T) -> bool {
        let w = self.write_pos.load(Ordering::Relaxed);
        let r = self.read_pos.load(Ordering::Acquire);
        if w.wrapping_sub(r) >= self.capacity() as u64 {
            return false;
        }
        let idx = (w & self.mask) as usize;
        // Safety: only the single producer ever writes this slot, and only
        // once `write_pos` has not yet advanced past `w`; the consumer will
        // not read slot `idx` until it observes `write_pos > w`.
        unsafe {
            (*self.buffer[idx].get()).write(value);
        }
        self.write_pos.store(w + 1, Ordering::Release);
        true
    }

    /// Attempts to pop the oldest element. Returns `None` only when the ring
    /// is empty.
    pub fn try_pop(&self) -> Option<T> {
        let r = self.read_pos.load(Ordering::Relaxed);
        let w = self.write_pos.load(Ordering::Acquire);
        if r == w {
            return None;
        }
        let idx = (r & self.mask) as usize;
        // Safety: `write_pos` acquired above is `> r`, so the producer has
        // finished writing slot `idx` and released it to us.
        let value = unsafe { (*self.buffer[idx].get()).assume_init_read() };
        self.read_pos.store(r + 1, Ordering::Release);
        Some(value)
    }
}

impl<T> Drop for SpscRing<T> {
    fn drop(&mut self) {
        // Drain any elements still queued so T::drop runs exactly once.
        while self.try_pop().is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_power_of_two_capacity() {
        assert!(SpscRing::<u8>::new(0).is_err());
        assert!(SpscRing::<u8>::new(3).is_err());
        assert!(SpscRing::<u8>::new(16).is_ok());
    }

    #[test]
    fn push_pop_is_fifo_and_lossless() {
        let ring = SpscRing::<i32>::new(16).unwrap();
        for i in 0..16 {
            assert!(ring.try_push(i));
        }
        assert!(!ring.try_push(99));
        for i in 0..16 {
            assert_eq!(ring.try_pop(), Some(i));
        }
        assert_eq!(ring.try_pop(), None);
    }

    #[test]
    fn interleaved_push_pop_preserves_order() {
        let ring = SpscRing::<i32>::new(4).unwrap();
        let mut produced = Vec::new();
        let mut consumed = Vec::new();
        for i in 0..50 {
            assert!(ring.try_push(i));
            produced.push(i);
            if i % 3 == 0 {
                if let Some(v) = ring.try_pop() {
                    consumed.push(v);
                }
            }
        }
        while let Some(v) = ring.try_pop() {
            consumed.push(v);
        }
        assert_eq!(produced, consumed);
    }

    #[test]
    fn concurrent_producer_consumer_delivers_every_value_in_order() {
        use std::sync::Arc;
        use std::thread;

        let ring = Arc::new(SpscRing::<u64>::new(1024).unwrap());
        let producer_ring = ring.clone();
        const N: u64 = 200_000;

        let producer = thread::spawn(move || {
            let mut i = 0;
            while i < N {
                if producer_ring.try_push(i) {
                    i += 1;
                }
            }
        });

        let mut received = Vec::with_capacity(N as usize);
        while received.len() < N as usize {
            if let Some(v) = ring.try_pop() {
                received.push(v);
            }
        }
        producer.join().unwrap();
        assert_eq!(received, (0..N).collect::<Vec<_>>());
    }
}
