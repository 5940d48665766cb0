//! Wait-free bounded single-producer/single-consumer FIFO
//!
//! Ring of in-place constructed elements with one slack slot to distinguish
//! empty from full. Each side keeps a cached copy of the opposite index and
//! refreshes it with an acquire load only when the cache suggests the ring is
//! full (producer) or empty (consumer), which keeps cache-coherency traffic
//! off the fast path. The producer and consumer index groups live on separate
//! cache lines.

use std::marker::PhantomData;
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Result, VernetError};

const CACHE_LINE_SIZE: usize = 64;

/// Producer-side positions: the write index and the producer's cached copy
/// of the read index share one cache line, isolated from the consumer's.
#[repr(align(64))]
#[derive(Debug)]
struct ProducerPos {
    write_idx: AtomicUsize,
    read_idx_cache: AtomicUsize,
}

/// Consumer-side positions, mirror of [`ProducerPos`].
#[repr(align(64))]
#[derive(Debug)]
struct ConsumerPos {
    read_idx: AtomicUsize,
    write_idx_cache: AtomicUsize,
}

/// Bounded SPSC FIFO of `T`.
///
/// All methods take `&self`; the single-producer/single-consumer discipline
/// is the caller's contract: at most one thread may call the producer
/// operations (`push`) and at most one thread the consumer operations
/// (`front`/`pop`) at any time. The observers are safe from either side but
/// only approximate while traffic is in flight.
#[derive(Debug)]
pub struct SpscRing<T> {
    /// Slot storage, `slot_count + 2 * pad` elements; live slots start at `pad`
    slots: NonNull<T>,
    /// Number of ring slots including the slack slot
    slot_count: usize,
    /// Head/tail padding, one cache line worth of `T` on each end
    pad: usize,
    prod: ProducerPos,
    cons: ConsumerPos,
    _marker: PhantomData<T>,
}

impl<T> SpscRing<T> {
    /// Create a ring that holds up to `capacity` elements.
    ///
    /// A capacity of zero is rounded up to one. Allocation happens once,
    /// here; the ring never allocates afterwards.
    pub fn new(capacity: usize) -> Result<Self> {
        let capacity = capacity.max(1);
        let slot_count = capacity + 1; // one slack slot distinguishes empty from full

        let elem_size = std::mem::size_of::<T>().max(1);
        let pad = (CACHE_LINE_SIZE - 1) / elem_size + 1;

        let layout = std::alloc::Layout::array::<T>(slot_count + 2 * pad)
            .map_err(|_| VernetError::memory("slot layout overflow"))?;
        let slots = unsafe {
            let p = std::alloc::alloc(layout) as *mut T;
            NonNull::new(p).ok_or_else(|| VernetError::memory("failed to allocate ring slots"))?
        };

        Ok(Self {
            slots,
            slot_count,
            pad,
            prod: ProducerPos {
                write_idx: AtomicUsize::new(0),
                read_idx_cache: AtomicUsize::new(0),
            },
            cons: ConsumerPos {
                read_idx: AtomicUsize::new(0),
                write_idx_cache: AtomicUsize::new(0),
            },
            _marker: PhantomData,
        })
    }

    #[inline]
    fn slot(&self, idx: usize) -> *mut T {
        unsafe { self.slots.as_ptr().add(self.pad + idx) }
    }

    /// Push a value. Producer side only.
    ///
    /// Returns false (dropping `value`) if the ring is full.
    #[inline]
    pub fn push(&self, value: T) -> bool {
        let w = self.prod.write_idx.load(Ordering::Relaxed);
        let mut next = w + 1;
        if next == self.slot_count {
            next = 0;
        }

        if next == self.prod.read_idx_cache.load(Ordering::Relaxed) {
            let fresh = self.cons.read_idx.load(Ordering::Acquire);
            self.prod.read_idx_cache.store(fresh, Ordering::Relaxed);
            if next == fresh {
                return false; // full
            }
        }

        unsafe { ptr::write(self.slot(w), value) };
        self.prod.write_idx.store(next, Ordering::Release);
        true
    }

    /// Peek at the oldest element. Consumer side only.
    #[inline]
    pub fn front(&self) -> Option<&T> {
        let r = self.cons.read_idx.load(Ordering::Relaxed);
        if r == self.cons.write_idx_cache.load(Ordering::Relaxed) {
            let fresh = self.prod.write_idx.load(Ordering::Acquire);
            self.cons.write_idx_cache.store(fresh, Ordering::Relaxed);
            if r == fresh {
                return None; // empty
            }
        }
        Some(unsafe { &*self.slot(r) })
    }

    /// Take the oldest element. Consumer side only.
    #[inline]
    pub fn pop(&self) -> Option<T> {
        let r = self.cons.read_idx.load(Ordering::Relaxed);
        if r == self.cons.write_idx_cache.load(Ordering::Relaxed) {
            let fresh = self.prod.write_idx.load(Ordering::Acquire);
            self.cons.write_idx_cache.store(fresh, Ordering::Relaxed);
            if r == fresh {
                return None; // empty
            }
        }

        let value = unsafe { ptr::read(self.slot(r)) };
        let mut next = r + 1;
        if next == self.slot_count {
            next = 0;
        }
        self.cons.read_idx.store(next, Ordering::Release);
        Some(value)
    }

    /// Number of queued elements. Approximate across threads.
    pub fn len(&self) -> usize {
        let w = self.prod.write_idx.load(Ordering::Acquire);
        let r = self.cons.read_idx.load(Ordering::Acquire);
        let diff = w as isize - r as isize;
        if diff < 0 {
            (diff + self.slot_count as isize) as usize
        } else {
            diff as usize
        }
    }

    /// Whether the ring is empty. Approximate across threads.
    pub fn is_empty(&self) -> bool {
        self.prod.write_idx.load(Ordering::Acquire) == self.cons.read_idx.load(Ordering::Acquire)
    }

    /// Number of elements that can be pushed before the ring is full.
    /// Approximate across threads.
    pub fn write_available(&self) -> usize {
        let w = self.prod.write_idx.load(Ordering::Acquire);
        let r = self.cons.read_idx.load(Ordering::Acquire);
        let diff = r as isize - w as isize - 1; // slack slot is never writable
        if diff < 0 {
            (diff + self.slot_count as isize) as usize
        } else {
            diff as usize
        }
    }

    /// Maximum number of queued elements
    pub fn capacity(&self) -> usize {
        self.slot_count - 1
    }
}

impl<T> Drop for SpscRing<T> {
    fn drop(&mut self) {
        while self.pop().is_some() {}
        let layout = std::alloc::Layout::array::<T>(self.slot_count + 2 * self.pad).unwrap();
        unsafe { std::alloc::dealloc(self.slots.as_ptr() as *mut u8, layout) };
    }
}

// One producer thread and one consumer thread may operate concurrently;
// see the type-level contract.
unsafe impl<T: Send> Send for SpscRing<T> {}
unsafe impl<T: Send> Sync for SpscRing<T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_capacity_rounding() {
        let ring: SpscRing<u64> = SpscRing::new(0).unwrap();
        assert_eq!(ring.capacity(), 1);

        let ring: SpscRing<u64> = SpscRing::new(16).unwrap();
        assert_eq!(ring.capacity(), 16);
    }

    #[test]
    fn test_round_trip_in_order() {
        let ring: SpscRing<u64> = SpscRing::new(8).unwrap();
        for i in 0..8 {
            assert!(ring.push(i));
        }
        for i in 0..8 {
            assert_eq!(ring.pop(), Some(i));
        }
        assert_eq!(ring.pop(), None);
    }

    #[test]
    fn test_full_rejects_push() {
        let ring: SpscRing<u32> = SpscRing::new(4).unwrap();
        for i in 0..4 {
            assert!(ring.push(i));
        }
        // Fifth push fails and leaves state unchanged
        assert!(!ring.push(99));
        assert_eq!(ring.len(), 4);
        assert_eq!(ring.write_available(), 0);
        for i in 0..4 {
            assert_eq!(ring.pop(), Some(i));
        }
    }

    #[test]
    fn test_observers() {
        let ring: SpscRing<u32> = SpscRing::new(4).unwrap();
        assert!(ring.is_empty());
        assert_eq!(ring.len(), 0);
        assert_eq!(ring.write_available(), 4);

        assert!(ring.push(7));
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.write_available(), 3);
        assert_eq!(ring.front(), Some(&7));
    }

    #[test]
    fn test_wrap_around() {
        let ring: SpscRing<u32> = SpscRing::new(2).unwrap();
        for round in 0..100u32 {
            assert!(ring.push(round));
            assert_eq!(ring.pop(), Some(round));
        }
        assert!(ring.is_empty());
    }

    #[test]
    fn test_drop_drains_residual_elements() {
        struct Counted(Arc<AtomicUsize>);
        impl Drop for Counted {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::Relaxed);
            }
        }

        let drops = Arc::new(AtomicUsize::new(0));
        {
            let ring: SpscRing<Counted> = SpscRing::new(8).unwrap();
            for _ in 0..5 {
                assert!(ring.push(Counted(drops.clone())));
            }
            assert_eq!(ring.pop().is_some(), true);
            assert_eq!(drops.load(Ordering::Relaxed), 1);
        }
        // Remaining 4 destroyed by ring drop
        assert_eq!(drops.load(Ordering::Relaxed), 5);
    }

    #[test]
    fn test_two_thread_order() {
        const N: u64 = 100_000;
        let ring: Arc<SpscRing<u64>> = Arc::new(SpscRing::new(64).unwrap());

        let producer = {
            let ring = ring.clone();
            thread::spawn(move || {
                for i in 0..N {
                    while !ring.push(i) {
                        thread::yield_now();
                    }
                }
            })
        };

        let consumer = {
            let ring = ring.clone();
            thread::spawn(move || {
                let mut expected = 0u64;
                while expected < N {
                    if let Some(v) = ring.pop() {
                        assert_eq!(v, expected);
                        expected += 1;
                    }
                }
            })
        };

        producer.join().unwrap();
        consumer.join().unwrap();
    }
}
