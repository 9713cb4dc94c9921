//! CPU and cache topology probe for benchmark context.
//!
//! Queried once per process and attached to every results file. Purely
//! observational: missing information degrades to zeros/"Unknown" rather
//! than failing the run.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Parameters of one cache level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheInfo {
    /// Total size in bytes.
    pub size: u64,
    /// Ways of associativity.
    pub associativity: u32,
    /// Line size in bytes.
    pub line_size: u32,
}

/// CPU/cache topology snapshot for one machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuInfo {
    /// CPU vendor ("Intel", "AMD", ...).
    pub vendor: String,
    /// Microarchitecture / model description string.
    pub uarch: String,
    /// L1 instruction cache.
    pub l1i_cache: CacheInfo,
    /// L1 data cache.
    pub l1d_cache: CacheInfo,
    /// L2 cache.
    pub l2_cache: CacheInfo,
    /// L3 cache.
    pub l3_cache: CacheInfo,
    /// Physical cores on one package.
    pub cores_per_socket: usize,
    /// OS page size in bytes.
    pub page_size: u64,
}

/// Returns the memoized topology snapshot for this process.
pub fn cpu_info() -> &'static CpuInfo {
    static INFO: OnceLock<CpuInfo> = OnceLock::new();
    INFO.get_or_init(detect)
}

fn detect() -> CpuInfo {
    let (vendor, uarch, cores_per_socket) = detect_identity();
    let [l1i_cache, l1d_cache, l2_cache, l3_cache] = detect_caches();

    CpuInfo {
        vendor,
        uarch,
        l1i_cache,
        l1d_cache,
        l2_cache,
        l3_cache,
        cores_per_socket,
        page_size: page_size(),
    }
}

#[cfg(target_os = "linux")]
fn detect_identity() -> (String, String, usize) {
    let cpuinfo = std::fs::read_to_string("/proc/cpuinfo").unwrap_or_default();

    let vendor = cpuinfo
        .lines()
        .find(|l| l.starts_with("vendor_id"))
        .and_then(|l| l.split(':').nth(1))
        .map(|s| vendor_name(s.trim()))
        .unwrap_or_else(|| "Unknown".to_string());

    let uarch = cpuinfo
        .lines()
        .find(|l| l.starts_with("model name"))
        .and_then(|l| l.split(':').nth(1))
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    let cores_per_socket = cpuinfo
        .lines()
        .find(|l| l.starts_with("cpu cores"))
        .and_then(|l| l.split(':').nth(1))
        .and_then(|s| s.trim().parse::<usize>().ok())
        .unwrap_or_else(num_cpus::get_physical);

    (vendor, uarch, cores_per_socket)
}

#[cfg(not(target_os = "linux"))]
fn detect_identity() -> (String, String, usize) {
    (
        "Unknown".to_string(),
        "Unknown".to_string(),
        num_cpus::get_physical(),
    )
}

/// Maps an x86 vendor id string to the usual vendor name; other ids pass
/// through unchanged.
#[cfg(target_os = "linux")]
fn vendor_name(vendor_id: &str) -> String {
    match vendor_id {
        "GenuineIntel" => "Intel",
        "AuthenticAMD" => "AMD",
        "CentaurHauls" => "Centaur",
        "HygonGenuine" => "Hygon",
        other => other,
    }
    .to_string()
}

/// Reads [l1i, l1d, l2, l3] from sysfs, assuming cpu0's caches are
/// representative of every core.
#[cfg(target_os = "linux")]
fn detect_caches() -> [CacheInfo; 4] {
    let mut caches = [CacheInfo::default(); 4];

    for index in 0..8 {
        let base = format!("/sys/devices/system/cpu/cpu0/cache/index{index}");
        let Some(level) = read_sysfs_u32(&format!("{base}/level")) else {
            break;
        };
        let kind = std::fs::read_to_string(format!("{base}/type")).unwrap_or_default();

        let cache = CacheInfo {
            size: read_sysfs_size(&format!("{base}/size")).unwrap_or(0),
            associativity: read_sysfs_u32(&format!("{base}/ways_of_associativity")).unwrap_or(0),
            line_size: read_sysfs_u32(&format!("{base}/coherency_line_size")).unwrap_or(0),
        };

        let slot = match (level, kind.trim()) {
            (1, "Instruction") => 0,
            (1, "Data") => 1,
            (2, _) => 2,
            (3, _) => 3,
            _ => continue,
        };
        caches[slot] = cache;
    }

    caches
}

#[cfg(not(target_os = "linux"))]
fn detect_caches() -> [CacheInfo; 4] {
    [CacheInfo::default(); 4]
}

#[cfg(target_os = "linux")]
fn read_sysfs_u32(path: &str) -> Option<u32> {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|s| s.trim().parse().ok())
}

/// Parses sysfs cache sizes ("32K", "1M", or raw bytes) into bytes.
#[cfg(target_os = "linux")]
fn read_sysfs_size(path: &str) -> Option<u64> {
    let raw = std::fs::read_to_string(path).ok()?;
    let s = raw.trim();
    if let Some(kb) = s.strip_suffix('K') {
        kb.parse::<u64>().ok().map(|v| v * 1024)
    } else if let Some(mb) = s.strip_suffix('M') {
        mb.parse::<u64>().ok().map(|v| v * 1024 * 1024)
    } else {
        s.parse::<u64>().ok()
    }
}

#[cfg(unix)]
fn page_size() -> u64 {
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 {
        size as u64
    } else {
        4096
    }
}

#[cfg(not(unix))]
fn page_size() -> u64 {
    4096
}
