//! The benchmark harness: N producers and one consumer spinning on a
//! shared queue for a fixed wall-clock window.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use kestrel_queue::mpsc::MpscQueue;
use kestrel_queue::CapacityError;
use tracing::info;

use crate::event::OrderEvent;

/// Parameters for one benchmark run.
#[derive(Debug, Clone, Copy)]
pub struct RunParams {
    /// Queue capacity in elements. Must satisfy the queue's capacity rules.
    pub capacity: usize,
    /// Number of producer threads.
    pub producers: usize,
    /// Measurement window.
    pub duration: Duration,
}

/// Aggregate counters collected after one run.
#[derive(Debug, Clone, Copy)]
pub struct RunStats {
    /// Producer thread count used for the run.
    pub producer_count: usize,
    /// Queue capacity in elements.
    pub capacity: usize,
    /// Queue memory footprint in bytes: capacity x element size.
    pub queue_bytes: usize,
    /// Total pop attempts by the consumer, successful or not.
    pub total_pops: u64,
    /// Pops that returned an element.
    pub successful_pops: u64,
    /// Queue-side successful push telemetry.
    pub push_count: u64,
    /// Queue-side successful pop telemetry.
    pub pop_count: u64,
}

/// Runs one benchmark: spawn producers and consumer, release them together,
/// let them spin for the window, stop, join, aggregate.
///
/// Producers push counter-stamped [`OrderEvent`]s and ignore `Full`; the
/// consumer tallies every pop attempt. Join order is consumer first, then
/// producers.
pub fn run(params: &RunParams) -> Result<RunStats, CapacityError> {
    let queue = Arc::new(MpscQueue::<OrderEvent>::with_capacity(params.capacity)?);

    // One slot per worker plus the harness itself: everyone starts together.
    let gate = Arc::new(Barrier::new(params.producers + 2));
    let stop = Arc::new(AtomicBool::new(false));

    let producers: Vec<_> = (0..params.producers)
        .map(|_| {
            let queue = Arc::clone(&queue);
            let gate = Arc::clone(&gate);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                gate.wait();
                let mut seq = 0u64;
                while !stop.load(Ordering::Acquire) {
                    let _ = queue.push(OrderEvent::stamped(seq));
                    seq = seq.wrapping_add(1);
                }
            })
        })
        .collect();

    let consumer = {
        let queue = Arc::clone(&queue);
        let gate = Arc::clone(&gate);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            gate.wait();
            let mut total = 0u64;
            let mut successful = 0u64;
            while !stop.load(Ordering::Acquire) {
                total += 1;
                if queue.pop().is_some() {
                    successful += 1;
                }
            }
            (total, successful)
        })
    };

    gate.wait();
    thread::sleep(params.duration);
    stop.store(true, Ordering::Release);

    let (total_pops, successful_pops) = consumer
        .join()
        .expect("consumer thread panicked");
    for p in producers {
        p.join().expect("producer thread panicked");
    }

    let stats = RunStats {
        producer_count: params.producers,
        capacity: params.capacity,
        queue_bytes: params.capacity * std::mem::size_of::<OrderEvent>(),
        total_pops,
        successful_pops,
        push_count: queue.push_count(),
        pop_count: queue.pop_count(),
    };

    info!(
        producers = stats.producer_count,
        queue_size = stats.capacity,
        "benchmark config"
    );
    info!(
        total_pops = stats.total_pops,
        successful_pops = stats.successful_pops,
        push_count = stats.push_count,
        pop_count = stats.pop_count,
        "benchmark totals"
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoke_run_upholds_counter_laws() {
        let stats = run(&RunParams {
            capacity: 64,
            producers: 2,
            duration: Duration::from_millis(50),
        })
        .unwrap();

        assert_eq!(stats.producer_count, 2);
        assert_eq!(stats.queue_bytes, 64 * std::mem::size_of::<OrderEvent>());
        assert!(stats.successful_pops <= stats.total_pops);
        assert!(stats.successful_pops <= stats.push_count);
        assert_eq!(stats.successful_pops, stats.pop_count);
    }

    #[test]
    fn invalid_capacity_is_surfaced() {
        let err = run(&RunParams {
            capacity: 31,
            producers: 1,
            duration: Duration::from_millis(1),
        })
        .unwrap_err();

        assert_eq!(err, CapacityError::NotPowerOfTwo(31));
    }
}
