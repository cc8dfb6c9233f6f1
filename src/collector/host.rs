//! Host telemetry queries.
//!
//! [`TelemetryProvider`] is the seam between the snapshot collector and the
//! machine it runs on. [`HostProvider`] answers every query from `/proc`,
//! `/sys` and `/etc` through a [`FileSystem`], plus two C library calls for
//! the session list and interface addresses.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::collector::native;
use crate::collector::procfs::{
    CpuInfo, CpuTimes, parse_cpuinfo, parse_global_stat, parse_meminfo, parse_millidegrees,
    parse_os_release,
};
use crate::collector::traits::FileSystem;
use crate::collector::CollectError;
use crate::model::{InterfaceAddress, MemorySummary, Session};

/// Operating system identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsInfo {
    pub platform: String,
    pub platform_version: String,
    pub os: String,
    pub kernel_version: String,
}

/// One temperature sensor reading.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureReading {
    /// `{device}_{label}`, e.g. `cpu_thermal_input`.
    pub key: String,
    pub celsius: f64,
}

/// Source of raw host telemetry.
///
/// Each query is independent: a failure in one must not affect the others.
pub trait TelemetryProvider: Send {
    fn kernel_arch(&self) -> Result<String, CollectError>;
    fn host_name(&self) -> Result<String, CollectError>;
    fn os_info(&self) -> Result<OsInfo, CollectError>;
    fn cpu_info(&self) -> Result<CpuInfo, CollectError>;

    /// Busy percentage across all cores, sampled over `window`.
    fn cpu_percent(&mut self, window: Duration) -> Result<f64, CollectError>;

    fn memory(&self) -> Result<MemorySummary, CollectError>;

    /// Boot time, Unix seconds.
    fn boot_time(&self) -> Result<i64, CollectError>;

    /// Logged-in users as reported by the platform's native facility.
    fn users(&self) -> Result<Vec<Session>, CollectError>;

    fn temperatures(&self) -> Result<Vec<TemperatureReading>, CollectError>;
    fn network_interfaces(&self) -> Result<Vec<InterfaceAddress>, CollectError>;
}

/// [`TelemetryProvider`] backed by the Linux pseudo-filesystems.
pub struct HostProvider<F: FileSystem> {
    fs: F,
    proc_path: PathBuf,
    sys_path: PathBuf,
    etc_path: PathBuf,
    /// Last stat sample that moved; used when a sampling window is too short
    /// for the kernel counters to tick.
    last_cpu: Option<CpuTimes>,
}

impl<F: FileSystem> HostProvider<F> {
    /// Creates a provider reading `/proc`, `/sys` and `/etc`.
    pub fn new(fs: F) -> Self {
        Self::with_paths(fs, "/proc", "/sys", "/etc")
    }

    /// Creates a provider with custom mount points (containers, fixtures).
    pub fn with_paths(
        fs: F,
        proc_path: impl Into<PathBuf>,
        sys_path: impl Into<PathBuf>,
        etc_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
            sys_path: sys_path.into(),
            etc_path: etc_path.into(),
            last_cpu: None,
        }
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    #[cfg(test)]
    pub(crate) fn fs_mut(&mut self) -> &mut F {
        &mut self.fs
    }

    fn read_trimmed(&self, path: &Path) -> Result<String, CollectError> {
        Ok(self.fs.read_to_string(path)?.trim().to_string())
    }

    fn kernel_file(&self, name: &str) -> Result<String, CollectError> {
        self.read_trimmed(&self.proc_path.join("sys/kernel").join(name))
    }

    fn sample_cpu(&self) -> Result<CpuTimes, CollectError> {
        let content = self.fs.read_to_string(&self.proc_path.join("stat"))?;
        Ok(parse_global_stat(&content)?.cpu)
    }

    /// Reads every `temp*_input` of one hwmon device.
    fn hwmon_readings(&self, dir: &Path, out: &mut Vec<TemperatureReading>) {
        let Ok(device) = self.read_trimmed(&dir.join("name")) else {
            return;
        };
        let Ok(mut entries) = self.fs.read_dir(dir) else {
            return;
        };
        entries.sort();

        for entry in entries {
            let Some(file) = entry.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(sensor) = file
                .strip_prefix("temp")
                .and_then(|rest| rest.strip_suffix("_input"))
            else {
                continue;
            };
            let celsius = match self
                .fs
                .read_to_string(&entry)
                .map_err(CollectError::from)
                .and_then(|c| parse_millidegrees(&c).map_err(CollectError::from))
            {
                Ok(c) => c,
                Err(e) => {
                    tracing::debug!(path = %entry.display(), error = %e, "skipping sensor");
                    continue;
                }
            };
            let label = self
                .read_trimmed(&dir.join(format!("temp{}_label", sensor)))
                .ok()
                .filter(|l| !l.is_empty())
                .map(|l| l.replace(' ', "_"))
                .unwrap_or_else(|| "input".to_string());
            out.push(TemperatureReading {
                key: format!("{}_{}", device, label),
                celsius,
            });
        }
    }
}

impl<F: FileSystem> TelemetryProvider for HostProvider<F> {
    fn kernel_arch(&self) -> Result<String, CollectError> {
        match self.kernel_file("arch") {
            Ok(arch) if !arch.is_empty() => Ok(arch),
            // Older kernels lack the arch sysctl; the build target is the
            // same machine for a native binary.
            _ => Ok(std::env::consts::ARCH.to_string()),
        }
    }

    fn host_name(&self) -> Result<String, CollectError> {
        self.kernel_file("hostname")
    }

    fn os_info(&self) -> Result<OsInfo, CollectError> {
        let release = self
            .fs
            .read_to_string(&self.etc_path.join("os-release"))
            .map(|c| parse_os_release(&c))
            .unwrap_or_default();
        Ok(OsInfo {
            platform: release.id,
            platform_version: release.version_id,
            os: self.kernel_file("ostype")?.to_lowercase(),
            kernel_version: self.kernel_file("osrelease")?,
        })
    }

    fn cpu_info(&self) -> Result<CpuInfo, CollectError> {
        let content = self.fs.read_to_string(&self.proc_path.join("cpuinfo"))?;
        Ok(parse_cpuinfo(&content))
    }

    fn cpu_percent(&mut self, window: Duration) -> Result<f64, CollectError> {
        let first = self.sample_cpu()?;
        std::thread::sleep(window);
        let second = self.sample_cpu()?;

        let baseline = self.last_cpu;
        if baseline.is_none_or(|b| second.total() > b.total()) {
            self.last_cpu = Some(second);
        }

        Ok(first
            .usage_since(&second)
            .or_else(|| baseline.and_then(|b| b.usage_since(&second)))
            .unwrap_or(0.0))
    }

    fn memory(&self) -> Result<MemorySummary, CollectError> {
        let content = self.fs.read_to_string(&self.proc_path.join("meminfo"))?;
        let info = parse_meminfo(&content)?;
        Ok(MemorySummary::new(info.used() * 1024, info.mem_total * 1024))
    }

    fn boot_time(&self) -> Result<i64, CollectError> {
        let content = self.fs.read_to_string(&self.proc_path.join("stat"))?;
        let stat = parse_global_stat(&content)?;
        if stat.btime == 0 {
            return Err(CollectError::Parse("missing btime in stat".to_string()));
        }
        Ok(stat.btime as i64)
    }

    fn users(&self) -> Result<Vec<Session>, CollectError> {
        native::native_sessions()
    }

    fn temperatures(&self) -> Result<Vec<TemperatureReading>, CollectError> {
        let mut devices = self.fs.read_dir(&self.sys_path.join("class/hwmon"))?;
        devices.sort();

        let mut readings = Vec::new();
        for dir in devices {
            self.hwmon_readings(&dir, &mut readings);
        }
        Ok(readings)
    }

    fn network_interfaces(&self) -> Result<Vec<InterfaceAddress>, CollectError> {
        native::interface_addresses()
    }
}
