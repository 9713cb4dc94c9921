//! Benchmark support library for the kestrel MPSC queue.
//!
//! The binary in `main.rs` drives three pieces:
//!
//! - [`harness`]: spawns N producers + 1 consumer against one shared queue,
//!   releases them through a start gate, and aggregates counters after a
//!   timed window.
//! - [`platform`]: one-shot CPU/cache topology probe attached to results.
//! - [`report`]: the append-only JSON results document.

pub mod event;
pub mod harness;
pub mod platform;
pub mod report;

pub use event::OrderEvent;
pub use harness::{run, RunParams, RunStats};
pub use platform::{cpu_info, CacheInfo, CpuInfo};
pub use report::{append_records, BenchmarkRecord, ResultsFile};
