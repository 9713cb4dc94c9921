//! Contention benchmark executable for the kestrel MPSC ring queue.
//!
//! Runs N producers and one consumer against a shared queue for a fixed
//! window and appends the aggregated counters to a JSON results file:
//!
//! ```bash
//! kestrel-bench -q 1024 -p 8 -r results/benchmark_results.json
//! kestrel-bench --sweep            # full queue-size x producer matrix
//! RUST_LOG=debug kestrel-bench -q 64 -p 2
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use kestrel_bench::harness::{self, RunParams};
use kestrel_bench::platform;
use kestrel_bench::report::{self, BenchmarkRecord};

/// Queue capacities the harness accepts. All powers of two: slot addressing
/// in the queue is a bit-mask, so the original sweep's 10240 is rejected.
const ALLOWED_QUEUE_SIZES: [usize; 9] = [32, 64, 128, 256, 512, 1024, 2048, 4096, 8192];

/// Producer counts exercised by `--sweep`.
const SWEEP_PRODUCER_COUNTS: [usize; 7] = [1, 2, 4, 8, 16, 32, 64];

#[derive(Parser, Debug)]
#[command(version, about = "Contention benchmark for the kestrel MPSC ring queue")]
struct Args {
    /// Queue capacity in elements (a power of two in 32..=8192)
    #[arg(
        short = 'q',
        long = "queue-size",
        value_parser = parse_queue_size,
        required_unless_present = "sweep",
        conflicts_with = "sweep"
    )]
    queue_size: Option<usize>,

    /// Producer thread count
    #[arg(
        short = 'p',
        long = "producer-count",
        value_parser = parse_producer_count,
        required_unless_present = "sweep",
        conflicts_with = "sweep"
    )]
    producer_count: Option<usize>,

    /// Results file, created or appended to
    #[arg(
        short = 'r',
        long = "results-path",
        default_value = "results/benchmark_results.json"
    )]
    results_path: PathBuf,

    /// Measurement window per run, in seconds
    #[arg(short = 'd', long = "duration-secs", default_value_t = 1)]
    duration_secs: u64,

    /// Run the full queue-size x producer-count matrix
    #[arg(long)]
    sweep: bool,
}

fn parse_queue_size(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("`{s}` is not a valid queue size"))?;
    if !ALLOWED_QUEUE_SIZES.contains(&value) {
        return Err(format!(
            "queue size must be a power of two from {:?}",
            ALLOWED_QUEUE_SIZES
        ));
    }
    Ok(value)
}

fn parse_producer_count(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("`{s}` is not a valid producer count"))?;
    if value == 0 {
        return Err("producer count must be at least 1".to_string());
    }
    Ok(value)
}

fn main() -> ExitCode {
    init_tracing();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let exit = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
            let _ = err.print();
            return exit;
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("benchmark failed: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();
}

fn run(args: Args) -> Result<()> {
    let cpu = platform::cpu_info();
    info!(
        vendor = %cpu.vendor,
        uarch = %cpu.uarch,
        cores_per_socket = cpu.cores_per_socket,
        "probed cpu topology"
    );

    let duration = Duration::from_secs(args.duration_secs);
    let runs: Vec<(usize, usize)> = match (args.sweep, args.queue_size, args.producer_count) {
        (true, _, _) => ALLOWED_QUEUE_SIZES
            .iter()
            .flat_map(|&q| SWEEP_PRODUCER_COUNTS.iter().map(move |&p| (q, p)))
            .collect(),
        (false, Some(q), Some(p)) => vec![(q, p)],
        _ => bail!("--queue-size and --producer-count are required without --sweep"),
    };

    let mut records = Vec::with_capacity(runs.len());
    for (capacity, producers) in runs {
        let stats = harness::run(&RunParams {
            capacity,
            producers,
            duration,
        })
        .context("benchmark run failed")?;
        records.push(BenchmarkRecord::from(&stats));
    }

    report::append_records(&args.results_path, records, cpu)?;
    info!(path = %args.results_path.display(), "benchmark results saved");

    Ok(())
}
