//! The result sink: one JSON document per results path, appended to
//! across invocations.
//!
//! Layout:
//!
//! ```json
//! {
//!   "benchmarkResults": [
//!     { "producerCount": 4, "queueSize": 49152, "totalPops": 1, "successfulPops": 1 }
//!   ],
//!   "cpuInfo": { ... }
//! }
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::harness::RunStats;
use crate::platform::CpuInfo;

/// One benchmark run as it appears in the results file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkRecord {
    /// Producer thread count.
    pub producer_count: usize,
    /// Queue memory footprint in bytes (capacity x element size).
    pub queue_size: usize,
    /// Total pop attempts by the consumer.
    pub total_pops: u64,
    /// Pops that returned an element.
    pub successful_pops: u64,
}

impl From<&RunStats> for BenchmarkRecord {
    fn from(stats: &RunStats) -> Self {
        Self {
            producer_count: stats.producer_count,
            queue_size: stats.queue_bytes,
            total_pops: stats.total_pops,
            successful_pops: stats.successful_pops,
        }
    }
}

/// The whole results document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsFile {
    /// Every recorded run, oldest first.
    pub benchmark_results: Vec<BenchmarkRecord>,
    /// Topology of the machine that produced the latest records.
    pub cpu_info: CpuInfo,
}

/// Appends `records` to the document at `path`, preserving previously
/// recorded runs. The `cpuInfo` block is refreshed from the current
/// process's probe.
pub fn append_records(
    path: &Path,
    records: Vec<BenchmarkRecord>,
    cpu_info: &CpuInfo,
) -> Result<()> {
    let mut all_records = if path.exists() {
        let file = File::open(path)
            .with_context(|| format!("failed to open existing results file {}", path.display()))?;
        let existing: ResultsFile = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("results file {} is not valid", path.display()))?;
        existing.benchmark_results
    } else {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create results directory {}", parent.display())
                })?;
            }
        }
        Vec::new()
    };
    all_records.extend(records);

    let document = ResultsFile {
        benchmark_results: all_records,
        cpu_info: cpu_info.clone(),
    };

    let file = File::create(path)
        .with_context(|| format!("failed to open results file {} for writing", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &document)
        .with_context(|| format!("failed to serialize results to {}", path.display()))?;
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform;

    fn record(producers: usize) -> BenchmarkRecord {
        BenchmarkRecord {
            producer_count: producers,
            queue_size: 1024 * 48,
            total_pops: 1_000,
            successful_pops: 900,
        }
    }

    #[test]
    fn creates_then_appends_preserving_prior_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        let cpu = platform::cpu_info();

        append_records(&path, vec![record(1)], cpu).unwrap();
        append_records(&path, vec![record(2), record(4)], cpu).unwrap();

        let parsed: ResultsFile =
            serde_json::from_reader(BufReader::new(File::open(&path).unwrap())).unwrap();
        assert_eq!(parsed.benchmark_results.len(), 3);
        assert_eq!(
            parsed
                .benchmark_results
                .iter()
                .map(|r| r.producer_count)
                .collect::<Vec<_>>(),
            vec![1, 2, 4]
        );
        assert_eq!(&parsed.cpu_info, cpu);
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results").join("benchmark_results.json");

        append_records(&path, vec![record(8)], platform::cpu_info()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn rejects_malformed_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        std::fs::write(&path, "not json").unwrap();

        let err = append_records(&path, vec![record(1)], platform::cpu_info()).unwrap_err();
        assert!(err.to_string().contains("not valid"));
    }

    #[test]
    fn record_keys_match_contract() {
        let value = serde_json::to_value(record(16)).unwrap();
        let obj = value.as_object().unwrap();

        for key in ["producerCount", "queueSize", "totalPops", "successfulPops"] {
            assert!(obj.contains_key(key), "missing key {key}");
        }
    }

    #[test]
    fn document_has_stable_top_level_fields() {
        let document = ResultsFile {
            benchmark_results: vec![record(1)],
            cpu_info: platform::cpu_info().clone(),
        };
        let value = serde_json::to_value(&document).unwrap();
        let obj = value.as_object().unwrap();

        assert!(obj.contains_key("benchmarkResults"));
        assert!(obj.contains_key("cpuInfo"));
    }
}
