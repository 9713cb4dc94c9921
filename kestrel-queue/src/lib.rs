//! Bounded lock-free MPSC queue for latency-critical applications.
//!
//! `kestrel-queue` provides a bounded multi-producer, single-consumer ring
//! queue built for inter-thread hand-off of fixed-layout messages, such as
//! order-book events in a trading system.
//!
//! # Quick Start
//!
//! ```
//! use kestrel_queue::mpsc::MpscQueue;
//!
//! let queue = MpscQueue::<u64>::with_capacity(1024).unwrap();
//!
//! queue.push(42).unwrap();
//! assert_eq!(queue.pop(), Some(42));
//! ```
//!
//! # Design
//!
//! The queue is a flat ring of cells, each carrying a payload slot and an
//! atomic sequence word. The sequence word is the sole synchronizer: a cell
//! whose sequence equals logical position `pos` is writable at `pos`, and a
//! cell whose sequence equals `pos + 1` is readable at `pos`. Producers claim
//! positions by compare-and-swap on a shared head index; the single consumer
//! advances a tail index. No operation blocks — both `push` and `pop` only
//! loop while another producer is mid-claim.
//!
//! Capacity is fixed at construction and must be a power of two (minimum 2)
//! so slot addressing is a bit-mask. The queue never overwrites an unread
//! slot and never drops a committed element: a full queue reports
//! [`Full`] back to the pusher with the value intact.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, missing_debug_implementations)]

use core::fmt;

pub mod mpsc;

/// Outcome of a push against a full ring.
///
/// Carries the rejected value back to the producer untouched: the ring
/// never overwrites an unread cell, so declining the push is the only way
/// to keep the memory bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Full<T>(pub T);

impl<T> Full<T> {
    /// Recovers the value the queue refused to take.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: fmt::Debug> fmt::Display for Full<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ring is full, rejected value {:?}", self.0)
    }
}

impl<T: fmt::Debug> std::error::Error for Full<T> {}

/// Error returned when constructing a queue with an unusable capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityError {
    /// The requested capacity was below the minimum of 2.
    TooSmall(usize),
    /// The requested capacity was not a power of two.
    NotPowerOfTwo(usize),
}

impl fmt::Display for CapacityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooSmall(cap) => write!(f, "capacity {cap} is below the minimum of 2"),
            Self::NotPowerOfTwo(cap) => write!(f, "capacity {cap} is not a power of two"),
        }
    }
}

impl std::error::Error for CapacityError {}
