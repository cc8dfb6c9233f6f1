//! The telemetry snapshot handed from the collector to the dashboard.
//!
//! A [`Snapshot`] is built from scratch on every refresh tick and never
//! mutated after it leaves the collector. Fields whose query failed hold
//! their default (empty string, zero, `None`, empty list).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of the host and its operating system.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct HostInfo {
    pub host_name: String,
    /// Distribution id from `/etc/os-release` (`debian`, `raspbian`, ...).
    pub platform: String,
    pub platform_version: String,
    /// Kernel family (`linux`).
    pub os: String,
    pub kernel_version: String,
    /// Machine architecture (`aarch64`, `x86_64`, ...).
    pub kernel_arch: String,
}

/// Processor summary.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct CpuSummary {
    pub model: String,
    pub physical_cores: usize,
    pub logical_cores: usize,
    /// Busy share across all cores over the sampling window.
    pub usage_percent: f64,
    /// SoC temperature in °C, when the configured sensor exists.
    pub temperature: Option<f64>,
}

/// Memory summary in bytes.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct MemorySummary {
    pub used: u64,
    pub total: u64,
    pub usage_percent: f64,
}

impl MemorySummary {
    pub fn new(used: u64, total: u64) -> Self {
        let usage_percent = if total > 0 {
            used as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        Self {
            used,
            total,
            usage_percent,
        }
    }
}

/// One address bound to a network interface, `addr/prefix`.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct InterfaceAddress {
    pub name: String,
    pub address: String,
}

impl fmt::Display for InterfaceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.address)
    }
}

/// An active login session, independent of where it was read from.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Session {
    pub user: String,
    pub host: String,
    pub terminal: String,
    /// Login time (Unix seconds). Not every source records it.
    pub started: Option<i64>,
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} {}", self.user, self.host, self.terminal)
    }
}

/// Where the session list of a snapshot came from.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub enum SessionOrigin {
    /// C library session enumeration (`getutxent`).
    Native,
    /// Login database decoded from disk.
    LoginDatabase,
    #[default]
    Unavailable,
}

/// Complete telemetry for one refresh tick.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct Snapshot {
    /// Collection time (Unix seconds).
    pub timestamp: i64,
    pub host: HostInfo,
    /// Boot time (Unix seconds).
    pub boot_time: Option<i64>,
    pub cpu: CpuSummary,
    pub memory: MemorySummary,
    pub interfaces: Vec<InterfaceAddress>,
    pub sessions: Vec<Session>,
    pub session_origin: SessionOrigin,
}
