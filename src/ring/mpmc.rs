//! Multi-producer/multi-consumer lock-free ring buffer.
//!
//! Any thread may call [`MpmcRing::try_push`] or [`MpmcRing::try_pop`]. Each
//! slot carries its own sequence counter rather than relying on a single
//! shared `write_pos`/`read_pos` pair to decide who owns a slot; this is the
//! classic Dmitry Vyukov bounded-queue layout (the same algorithm
//! `crossbeam::queue::ArrayQueue` implements), not the `fetch_add` +
//! rollback-on-full pattern the spec's source material used.
//!
//! §9 flags the rollback pattern ("fetch_add followed by fetch_sub on
//! failure") as having subtle progress concerns and asks for "the classic
//! per-slot-sequence design without rollback: the producer CAS-es write_pos
//! only after confirming the target slot's sequence is ready; failure does
//! not perturb write_pos" — that is exactly what is implemented here.
//!
//! A slot's sequence starts at its own index (writable). A producer that
//! claims index `i` (via CAS on `enqueue_pos`, not a bare `fetch_add`) writes
//! the value and advances the slot's sequence to `i + 1` (readable). A
//! consumer that claims index `i` (via CAS on `dequeue_pos`) reads the value
//! and advances the slot's sequence to `i + capacity` (writable again, one
//! lap later).

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::CoreError;

struct Slot<T> {
    sequence: AtomicUsize,
    value: UnsafeCell<MaybeUninit<T>>,
}

/// Lock-free MPMC ring buffer of fixed, power-of-two capacity.
pub struct MpmcRing<T> {
    buffer: Box<[Slot<T>]>,
    mask: usize,
    enqueue_pos: AtomicUsize,
    dequeue_pos: AtomicUsize,
}

// Safety: each slot's `sequence` field linearizes exactly one writer and one
// reader per lap; `value` is only touched by the thread that currently owns
// that linearization, which the CAS on enqueue_pos/dequeue_pos establishes.
unsafe impl<T: Send> Send for MpmcRing<T> {}
unsafe impl<T: Send> Sync for MpmcRing<T> {}

impl<T> MpmcRing<T> {
    /// Creates a ring of the given capacity, which must be a power of two.
    pub fn new(capacity: usize) -> Result<Self, CoreError> {
        if capacity == 0 || !capacity.is_power_of_two() {
            return Err(CoreError::RingCapacityNotPowerOfTwo {
                requested: capacity,
            });
        }
        let buffer: Vec<Slot<T>> = (0..capacity)
            .map(|i| Slot {
                sequence: AtomicUsize::new(i),
                value: UnsafeCell::new(MaybeUninit::uninit()),
            })
            .collect();
        Ok(MpmcRing {
            buffer: buffer.into_boxed_slice(),
            mask: capacity - 1,
            enqueue_pos: AtomicUsize::new(0),
            dequeue_pos: AtomicUsize::new(0),
        })
    }

    /// Ring capacity (always a power of two).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Best-effort occupancy snapshot; concurrent producers/consumers may
    /// change it before the caller observes the result.
    pub fn size(&self) -> usize {
        let enq = self.enqueue_pos.load(Ordering::Acquire);
        let deq = self.dequeue_pos.load(Ordering::Acquire);
        enq.saturating_sub(deq)
    }

    /// True when the ring currently holds no elements.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Attempts to push `value`. Returns `false` only when the ring is full.
    pub fn try_push(&self, value: T) -> bool {
        let mut pos = self.enqueue_pos.load(Ordering::Relaxed);
        loop {
            let slot = &self.buffer[pos & self.mask];
            let seq = slot.sequence.load(Ordering::Acquire);
            let diff = seq as isize - pos as isize;
            if diff == 0 {
                match self.enqueue_pos.compare_exchange_weak(
                    pos,
                    pos + 1,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => break,
                    Err(current) => pos = current,
                }
            } else if diff < 0 {
                // Slot is still in the "readable" phase of the previous lap: full.
                return false;
            } else {
                pos = self.enqueue_pos.load(Ordering::Relaxed);
            }
        }

        let slot = &self.buffer[pos & self.mask];
        // Safety: the CAS above gives this thread exclusive ownership of
        // writing slot `pos & mask` until it releases the sequence store.
        unsafe {
            (*slot.value.get()).write(value);
        }
        slot.sequence.store(pos + 1, Ordering::Release);
        true
    }

    /// Attempts to pop the oldest element. Returns `None` only when the ring
    /// is empty.
    pub fn try_pop(&self) -> Option<T> {
        let mut pos = self.dequeue_pos.load(Ordering::Relaxed);
        loop {
            let slot = &self.buffer[pos & self.mask];
            let seq = slot.sequence.load(Ordering::Acquire);
            let diff = seq as isize - (pos + 1) as isize;
            if diff == 0 {
                match self.dequeue_pos.compare_exchange_weak(
                    pos,
                    pos + 1,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => break,
                    Err(current) => pos = current,
                }
            } else if diff < 0 {
                return None;
            } else {
                pos = self.dequeue_pos.load(Ordering::Relaxed);
            }
        }

        let slot = &self.buffer[pos & self.mask];
        // Safety: the CAS above gives this thread exclusive ownership of
        // reading slot `pos & mask` until it releases the sequence store.
        let value = unsafe { (*slot.value.get()).assume_init_read() };
        slot.sequence.store(pos + self.mask + 1, Ordering::Release);
        Some(value)
    }
}

impl<T> Drop for MpmcRing<T> {
    fn drop(&mut self) {
        while self.try_pop().is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn rejects_non_power_of_two_capacity() {
        assert!(MpmcRing::<u8>::new(0).is_err());
        assert!(MpmcRing::<u8>::new(5).is_err());
        assert!(MpmcRing::<u8>::new(8).is_ok());
    }

    #[test]
    fn single_thread_push_pop_is_fifo() {
        let ring = MpmcRing::<i32>::new(8).unwrap();
        for i in 0..8 {
            assert!(ring.try_push(i));
        }
        assert!(!ring.try_push(99));
        for i in 0..8 {
            assert_eq!(ring.try_pop(), Some(i));
        }
        assert_eq!(ring.try_pop(), None);
    }

    #[test]
    fn multiple_producers_and_consumers_move_every_item_exactly_once() {
        const PRODUCERS: usize = 4;
        const PER_PRODUCER: usize = 20_000;
        const TOTAL: usize = PRODUCERS * PER_PRODUCER;

        let ring: Arc<MpmcRing<usize>> = Arc::new(MpmcRing::new(1024).unwrap());

        let producers: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let ring = ring.clone();
                thread::spawn(move || {
                    for i in 0..PER_PRODUCER {
                        let value = p * PER_PRODUCER + i;
                        while !ring.try_push(value) {
                            std::hint::spin_loop();
                        }
                    }
                })
            })
            .collect();

        let consumers: Vec<_> = (0..4)
            .map(|_| {
                let ring = ring.clone();
                thread::spawn(move || {
                    let mut seen = Vec::new();
                    loop {
                        match ring.try_pop() {
                            Some(v) => seen.push(v),
                            None => {
                                if seen.len() >= TOTAL {
                                    break;
                                }
                                std::hint::spin_loop();
                            }
                        }
                        if seen.len() == TOTAL {
                            break;
                        }
                    }
                    seen
                })
            })
            .collect();

        for p in producers {
            p.join().unwrap();
        }
        let mut all: Vec<usize> = Vec::new();
        for c in consumers {
            all.extend(c.join().unwrap());
        }
        // Drain stragglers in case consumers exited before the ring fully drained.
        while let Some(v) = ring.try_pop() {
            all.push(v);
        }

        all.sort_unstable();
        assert_eq!(all, (0..TOTAL).collect::<Vec<_>>());
    }
}
