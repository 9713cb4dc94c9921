//! Multi-producer single-consumer (MPSC) bounded queue.
//!
//! Any number of producers may push concurrently; exactly one consumer pops.
//! Per-cell sequence numbers coordinate producers and consumer, so the only
//! shared write contention is the producers' CAS on the head index.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//!
//! use kestrel_queue::mpsc::MpscQueue;
//!
//! let queue = Arc::new(MpscQueue::<u64>::with_capacity(1024).unwrap());
//!
//! let handles: Vec<_> = (0..2)
//!     .map(|p| {
//!         let queue = Arc::clone(&queue);
//!         thread::spawn(move || {
//!             for i in 0..100 {
//!                 while queue.push(p * 1000 + i).is_err() {
//!                     std::hint::spin_loop();
//!                 }
//!             }
//!         })
//!     })
//!     .collect();
//!
//! let mut received = Vec::new();
//! while received.len() < 200 {
//!     if let Some(val) = queue.pop() {
//!         received.push(val);
//!     }
//! }
//!
//! for h in handles {
//!     h.join().unwrap();
//! }
//!
//! assert_eq!(received.len(), 200);
//! ```
//!
//! # Ordering guarantees
//!
//! The consumer observes values in the order their producers committed them
//! (the release-store publishing each cell). A single producer's pushes are
//! therefore seen in program order, and a pop of value `v` happens-after the
//! push that produced `v`.
//!
//! # Non-blocking
//!
//! Neither operation ever suspends the caller. `push` loops only while
//! another producer is mid-claim on the same position; `pop` is wait-free
//! for the single consumer. A full queue reports [`Full`] and an empty
//! queue reports `None` — both are ordinary outcomes, not errors.

mod ring;

use std::fmt;
use std::sync::atomic::Ordering;

use crossbeam_utils::Backoff;

use crate::{CapacityError, Full};
use ring::Ring;

/// A bounded lock-free MPSC ring queue.
///
/// One queue value is shared by reference (typically behind an `Arc`) among
/// all producer threads and the single consumer thread. Capacity is fixed at
/// construction: a power of two, at least 2.
///
/// # Example
///
/// ```
/// use kestrel_queue::mpsc::MpscQueue;
///
/// let queue = MpscQueue::<u32>::with_capacity(8).unwrap();
///
/// queue.push(1).unwrap();
/// queue.push(2).unwrap();
///
/// assert_eq!(queue.pop(), Some(1));
/// assert_eq!(queue.pop(), Some(2));
/// assert_eq!(queue.pop(), None);
/// ```
pub struct MpscQueue<T> {
    ring: Ring<T>,
}

impl<T> MpscQueue<T> {
    /// Creates a queue with the given capacity.
    ///
    /// # Errors
    ///
    /// Returns [`CapacityError`] if `capacity` is below 2 or not a power of
    /// two. Capacity is never rounded: slot addressing relies on a bit-mask,
    /// and silently growing the ring would change the memory bound the
    /// caller asked for.
    ///
    /// # Example
    ///
    /// ```
    /// use kestrel_queue::{mpsc::MpscQueue, CapacityError};
    ///
    /// assert!(MpscQueue::<u64>::with_capacity(512).is_ok());
    /// assert_eq!(
    ///     MpscQueue::<u64>::with_capacity(1).unwrap_err(),
    ///     CapacityError::TooSmall(1),
    /// );
    /// assert_eq!(
    ///     MpscQueue::<u64>::with_capacity(3).unwrap_err(),
    ///     CapacityError::NotPowerOfTwo(3),
    /// );
    /// ```
    pub fn with_capacity(capacity: usize) -> Result<Self, CapacityError> {
        if capacity < 2 {
            return Err(CapacityError::TooSmall(capacity));
        }
        if !capacity.is_power_of_two() {
            return Err(CapacityError::NotPowerOfTwo(capacity));
        }

        Ok(Self {
            ring: Ring::new(capacity),
        })
    }

    /// Attempts to enqueue `value` at the current logical head.
    ///
    /// Never blocks, never overwrites an unread cell, never drops a
    /// committed element.
    ///
    /// # Errors
    ///
    /// Returns [`Full`] with the value if the candidate cell has not yet
    /// been consumed for the previous lap — the queue is full from this
    /// producer's viewpoint.
    ///
    /// # Example
    ///
    /// ```
    /// use kestrel_queue::{mpsc::MpscQueue, Full};
    ///
    /// let queue = MpscQueue::<u32>::with_capacity(2).unwrap();
    ///
    /// queue.push(1).unwrap();
    /// queue.push(2).unwrap();
    ///
    /// // Queue is now full; ownership of the value comes back.
    /// assert_eq!(queue.push(3), Err(Full(3)));
    /// ```
    #[inline]
    pub fn push(&self, value: T) -> Result<(), Full<T>> {
        let backoff = Backoff::new();
        let mut pos = self.ring.load_head();

        loop {
            let cell = self.ring.cell(pos);
            let seq = cell.sequence.load(Ordering::Acquire);
            // Signed difference under unsigned wrap: negative means the
            // cell is still occupied from an earlier lap.
            let diff = seq.wrapping_sub(pos) as isize;

            if diff == 0 {
                // Cell is empty at `pos`; race other producers for it.
                match self.ring.claim_head(pos) {
                    Ok(()) => break,
                    Err(current) => {
                        pos = current;
                        backoff.spin();
                    }
                }
            } else if diff < 0 {
                return Err(Full(value));
            } else {
                // Another producer already claimed this position.
                pos = self.ring.load_head();
                backoff.spin();
            }
        }

        // The successful CAS grants exclusive access to this cell until the
        // release-store below publishes it.
        let cell = self.ring.cell(pos);
        debug_assert_eq!(cell.sequence.load(Ordering::Relaxed), pos);
        unsafe {
            cell.payload.get().cast::<T>().write(value);
        }
        cell.sequence
            .store(pos.wrapping_add(1), Ordering::Release);

        self.ring.record_push();
        Ok(())
    }

    /// Attempts to dequeue the element at the current logical tail.
    ///
    /// Returns `None` if no element at the current tail has been fully
    /// published. Elements come out in the order producers committed them.
    ///
    /// Must only be called from one consumer thread at a time; the internal
    /// tail CAS exists to catch accidental concurrent consumers, not to
    /// support them.
    #[inline]
    pub fn pop(&self) -> Option<T> {
        let backoff = Backoff::new();
        let mut pos = self.ring.load_tail();

        loop {
            let cell = self.ring.cell(pos);
            let seq = cell.sequence.load(Ordering::Acquire);
            let diff = seq.wrapping_sub(pos.wrapping_add(1)) as isize;

            if diff == 0 {
                match self.ring.claim_tail(pos) {
                    Ok(()) => break,
                    Err(current) => {
                        pos = current;
                        backoff.spin();
                    }
                }
            } else if diff < 0 {
                // Not yet published for this position.
                return None;
            } else {
                // Stale observation of tail.
                pos = self.ring.load_tail();
                backoff.spin();
            }
        }

        let cell = self.ring.cell(pos);
        debug_assert_eq!(
            cell.sequence.load(Ordering::Relaxed),
            pos.wrapping_add(1)
        );
        let value = unsafe { (*cell.payload.get()).assume_init_read() };

        // Re-arm the cell for the next lap: this physical slot is next used
        // at logical position `pos + capacity`.
        cell.sequence.store(
            pos.wrapping_add(self.ring.capacity()),
            Ordering::Release,
        );

        self.ring.record_pop();
        Some(value)
    }

    /// Returns the fixed capacity of the queue.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Number of successful pushes so far.
    ///
    /// Best-effort: exact only once all producers have quiesced (e.g. after
    /// joining their threads).
    #[inline]
    pub fn push_count(&self) -> u64 {
        self.ring.push_count()
    }

    /// Number of successful pops so far. Best-effort, like [`push_count`].
    ///
    /// [`push_count`]: MpscQueue::push_count
    #[inline]
    pub fn pop_count(&self) -> u64 {
        self.ring.pop_count()
    }
}

impl<T> fmt::Debug for MpscQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MpscQueue")
            .field("capacity", &self.capacity())
            .field("push_count", &self.push_count())
            .field("pop_count", &self.pop_count())
            .finish_non_exhaustive()
    }
}
