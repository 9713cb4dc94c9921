//! The underlying ring storage for the MPSC queue.
//!
//! Uses per-cell sequence numbers to coordinate multiple producers and
//! a single consumer without locks.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::ptr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;

/// A cell in the sequenced ring.
///
/// The sequence number encodes the cell's state for logical position `pos`:
/// - `sequence == pos`: cell is empty/writable at `pos`
/// - `sequence == pos + 1`: cell contains data, readable at `pos`
/// - `sequence == pos + capacity`: cell recycled, writable next lap
#[repr(C)]
pub(crate) struct Cell<T> {
    pub(crate) sequence: AtomicUsize,
    pub(crate) payload: UnsafeCell<MaybeUninit<T>>,
}

/// The backing storage for an MPSC queue.
///
/// Memory layout:
/// ```text
/// ┌───────────────────────────────────────────────────────┐
/// │ head (cache-line padded) - producer claim position    │
/// ├───────────────────────────────────────────────────────┤
/// │ tail (cache-line padded) - consumer read position     │
/// ├───────────────────────────────────────────────────────┤
/// │ push_count / pop_count (cache-line padded)            │
/// ├───────────────────────────────────────────────────────┤
/// │ Cell[0]: { sequence, payload } (cache-line padded)    │
/// │ Cell[1]: { sequence, payload }                        │
/// │ ...                                                   │
/// └───────────────────────────────────────────────────────┘
/// ```
///
/// The queue contains elements in range [tail, head).
/// - Producers claim at head (via CAS), then write and publish
/// - The consumer reads at tail, then re-arms the cell for the next lap
///
/// Cells are individually cache-line padded: under contention a producer
/// publishing into cell `i` must not invalidate the line the consumer is
/// reading from cell `i - 1`.
pub(crate) struct Ring<T> {
    /// Producer claim position. Multiple producers CAS on this.
    head: CachePadded<AtomicUsize>,
    /// Consumer read position.
    tail: CachePadded<AtomicUsize>,

    /// Successful pushes. Best-effort; exact only once all workers quiesce.
    push_count: CachePadded<AtomicU64>,
    /// Successful pops.
    pop_count: CachePadded<AtomicU64>,

    cells: Box<[CachePadded<Cell<T>>]>,
    mask: usize,
}

// Safety: the sequence protocol grants each payload slot to exactly one
// thread at a time, so the ring may be shared as long as T can move
// between threads.
unsafe impl<T: Send> Send for Ring<T> {}
unsafe impl<T: Send> Sync for Ring<T> {}

impl<T> Ring<T> {
    /// Builds a ring of `capacity` cells with `cell[i].sequence = i`.
    ///
    /// Capacity validation happens in the caller; this expects a power of
    /// two >= 2.
    pub(crate) fn new(capacity: usize) -> Self {
        debug_assert!(capacity >= 2 && capacity.is_power_of_two());

        let cells: Box<[CachePadded<Cell<T>>]> = (0..capacity)
            .map(|i| {
                CachePadded::new(Cell {
                    sequence: AtomicUsize::new(i),
                    payload: UnsafeCell::new(MaybeUninit::uninit()),
                })
            })
            .collect();

        Self {
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
            push_count: CachePadded::new(AtomicU64::new(0)),
            pop_count: CachePadded::new(AtomicU64::new(0)),
            cells,
            mask: capacity - 1,
        }
    }

    /// Returns the cell at the given logical position (automatically masked).
    #[inline(always)]
    pub(crate) fn cell(&self, pos: usize) -> &Cell<T> {
        &self.cells[pos & self.mask]
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.cells.len()
    }

    // === Index operations ===

    /// Loads the producer claim position.
    #[inline(always)]
    pub(crate) fn load_head(&self) -> usize {
        self.head.load(Ordering::Acquire)
    }

    /// Loads the consumer read position.
    #[inline(always)]
    pub(crate) fn load_tail(&self) -> usize {
        self.tail.load(Ordering::Acquire)
    }

    /// Attempts to advance head from `pos` to `pos + 1`, claiming the
    /// position for one producer. On failure returns the head observed by
    /// the failed exchange.
    #[inline(always)]
    pub(crate) fn claim_head(&self, pos: usize) -> Result<(), usize> {
        self.head
            .compare_exchange(
                pos,
                pos.wrapping_add(1),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
    }

    /// Attempts to advance tail from `pos` to `pos + 1`.
    ///
    /// The single consumer cannot lose this exchange; it is kept as a guard
    /// against accidental multi-consumer use.
    #[inline(always)]
    pub(crate) fn claim_tail(&self, pos: usize) -> Result<(), usize> {
        self.tail
            .compare_exchange(
                pos,
                pos.wrapping_add(1),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
    }

    // === Telemetry ===

    #[inline(always)]
    pub(crate) fn record_push(&self) {
        self.push_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub(crate) fn record_pop(&self) {
        self.pop_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn push_count(&self) -> u64 {
        self.push_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn pop_count(&self) -> u64 {
        self.pop_count.load(Ordering::Relaxed)
    }
}

impl<T> Drop for Ring<T> {
    fn drop(&mut self) {
        // Drop still runs single-threaded: anything published but unpopped
        // sits in [tail, head) with sequence == pos + 1. Positions claimed
        // but never published cannot exist here, as every push completed
        // before the owner could be dropped.
        let head = self.head.load(Ordering::Relaxed);
        let mut pos = self.tail.load(Ordering::Relaxed);

        while pos != head {
            let cell = &self.cells[pos & self.mask];
            if cell.sequence.load(Ordering::Relaxed) == pos.wrapping_add(1) {
                unsafe {
                    ptr::drop_in_place((*cell.payload.get()).as_mut_ptr());
                }
            }
            pos = pos.wrapping_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_sequence_initialization() {
        let ring = Ring::<u64>::new(8);

        for i in 0..8 {
            assert_eq!(ring.cell(i).sequence.load(Ordering::Relaxed), i);
        }
        assert_eq!(ring.load_head(), 0);
        assert_eq!(ring.load_tail(), 0);
    }

    #[test]
    fn cell_addressing_wraps_by_mask() {
        let ring = Ring::<u64>::new(8);

        // Position 9 maps to the same cell as position 1.
        let a = ring.cell(1) as *const _;
        let b = ring.cell(9) as *const _;
        assert_eq!(a, b);
    }
}
