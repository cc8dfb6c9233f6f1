//! Parsers for `/proc`, `/sys` and `/etc` text files.
//!
//! These are pure functions over file contents so they can be tested with
//! string inputs.

use std::collections::HashSet;

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Parsed data from `/proc/meminfo`, in kB.
#[derive(Debug, Clone, Default)]
pub struct MemInfo {
    pub mem_total: u64,
    pub mem_free: u64,
    pub mem_available: u64,
    pub buffers: u64,
    pub cached: u64,
    pub active: u64,
}

impl MemInfo {
    /// Memory in use: total minus available.
    ///
    /// Kernels older than 3.14 have no `MemAvailable`; free + buffers + cached
    /// stands in for it there.
    pub fn used(&self) -> u64 {
        let available = if self.mem_available > 0 {
            self.mem_available
        } else {
            self.mem_free + self.buffers + self.cached
        };
        self.mem_total.saturating_sub(available)
    }
}

/// Parses `/proc/meminfo` content.
pub fn parse_meminfo(content: &str) -> Result<MemInfo, ParseError> {
    let mut info = MemInfo::default();
    let mut seen_total = false;

    let parse_kb = |line: &str| -> u64 {
        line.split_whitespace()
            .nth(1)
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    };

    for line in content.lines() {
        if line.starts_with("MemTotal:") {
            info.mem_total = parse_kb(line);
            seen_total = true;
        } else if line.starts_with("MemFree:") {
            info.mem_free = parse_kb(line);
        } else if line.starts_with("MemAvailable:") {
            info.mem_available = parse_kb(line);
        } else if line.starts_with("Buffers:") {
            info.buffers = parse_kb(line);
        } else if line.starts_with("Cached:") {
            info.cached = parse_kb(line);
        } else if line.starts_with("Active:") {
            info.active = parse_kb(line);
        }
    }

    if !seen_total {
        return Err(ParseError::new("missing MemTotal in meminfo"));
    }
    Ok(info)
}

/// Aggregate CPU jiffies from the `cpu` line of `/proc/stat`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuTimes {
    pub fn total(&self) -> u64 {
        self.busy() + self.idle_total()
    }

    pub fn idle_total(&self) -> u64 {
        self.idle + self.iowait
    }

    pub fn busy(&self) -> u64 {
        self.user + self.nice + self.system + self.irq + self.softirq + self.steal
    }

    /// Busy share between `self` (earlier) and `later`, in percent.
    ///
    /// `None` when no jiffies elapsed in between.
    pub fn usage_since(&self, later: &CpuTimes) -> Option<f64> {
        let total = later.total().checked_sub(self.total())?;
        if total == 0 {
            return None;
        }
        let busy = later.busy().saturating_sub(self.busy());
        Some((busy as f64 / total as f64 * 100.0).clamp(0.0, 100.0))
    }
}

/// The parts of `/proc/stat` the dashboard uses.
#[derive(Debug, Clone, Default)]
pub struct GlobalStat {
    pub cpu: CpuTimes,
    pub btime: u64,
}

/// Parses `/proc/stat` content.
pub fn parse_global_stat(content: &str) -> Result<GlobalStat, ParseError> {
    let mut stat = GlobalStat::default();
    let mut seen_cpu = false;

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(&key) = parts.first() else {
            continue;
        };
        let get_val =
            |idx: usize| -> u64 { parts.get(idx).and_then(|s| s.parse().ok()).unwrap_or(0) };

        if key == "cpu" {
            stat.cpu = CpuTimes {
                user: get_val(1),
                nice: get_val(2),
                system: get_val(3),
                idle: get_val(4),
                iowait: get_val(5),
                irq: get_val(6),
                softirq: get_val(7),
                steal: get_val(8),
            };
            seen_cpu = true;
        } else if key == "btime" {
            stat.btime = get_val(1);
        }
    }

    if !seen_cpu {
        return Err(ParseError::new("missing aggregate cpu line in stat"));
    }
    Ok(stat)
}

/// Processor description from `/proc/cpuinfo`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpuInfo {
    /// `model name` of the first processor, empty when the kernel omits it
    /// (common on ARM).
    pub model_name: String,
    pub physical_cores: usize,
    pub logical_cores: usize,
}

/// Parses `/proc/cpuinfo` content.
///
/// Physical cores are counted as distinct `(physical id, core id)` pairs.
/// Kernels that report neither (ARM) get one physical core per logical one.
pub fn parse_cpuinfo(content: &str) -> CpuInfo {
    let mut info = CpuInfo::default();
    let mut cores: HashSet<(String, String)> = HashSet::new();
    let mut physical_id = String::new();

    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "processor" => info.logical_cores += 1,
            "model name" if info.model_name.is_empty() => info.model_name = value.to_string(),
            "physical id" => physical_id = value.to_string(),
            "core id" => {
                cores.insert((physical_id.clone(), value.to_string()));
            }
            _ => {}
        }
    }

    info.physical_cores = if cores.is_empty() {
        info.logical_cores
    } else {
        cores.len()
    };
    info
}

/// Distribution identity from `/etc/os-release`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsRelease {
    pub id: String,
    pub version_id: String,
}

/// Parses `/etc/os-release` content, stripping shell quoting.
pub fn parse_os_release(content: &str) -> OsRelease {
    let mut release = OsRelease::default();
    for line in content.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"').trim_matches('\'');
        match key.trim() {
            "ID" => release.id = value.to_string(),
            "VERSION_ID" => release.version_id = value.to_string(),
            _ => {}
        }
    }
    release
}

/// Parses a hwmon `temp*_input` value (millidegrees Celsius).
pub fn parse_millidegrees(content: &str) -> Result<f64, ParseError> {
    content
        .trim()
        .parse::<i64>()
        .map(|m| m as f64 / 1000.0)
        .map_err(|_| ParseError::new(format!("invalid temperature '{}'", content.trim())))
}
