//! Builds one [`Snapshot`] from live host telemetry.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, trace};

use crate::collector::host::{HostProvider, TelemetryProvider};
use crate::collector::session::{SessionPolicy, SessionSource};
use crate::collector::traits::{FileSystem, RealFs};
use crate::collector::utmp::{DEFAULT_UTMP_PATH, SessionStoreReader};
use crate::collector::CollectError;
use crate::model::{CpuSummary, HostInfo, MemorySummary, Session, SessionOrigin, Snapshot};
use crate::provider::SnapshotSource;

/// Sensor read for the CPU temperature (Raspberry Pi SoC).
pub const DEFAULT_TEMPERATURE_SENSOR: &str = "cpu_thermal_input";

/// CPU usage sampling window.
pub const DEFAULT_CPU_WINDOW: Duration = Duration::from_millis(3);

/// Collector settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectorConfig {
    pub proc_path: PathBuf,
    pub sys_path: PathBuf,
    pub etc_path: PathBuf,
    pub utmp_path: PathBuf,
    pub session_policy: SessionPolicy,
    pub cpu_window: Duration,
    pub temperature_sensor: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            proc_path: PathBuf::from("/proc"),
            sys_path: PathBuf::from("/sys"),
            etc_path: PathBuf::from("/etc"),
            utmp_path: PathBuf::from(DEFAULT_UTMP_PATH),
            session_policy: SessionPolicy::Auto,
            cpu_window: DEFAULT_CPU_WINDOW,
            temperature_sensor: DEFAULT_TEMPERATURE_SENSOR.to_string(),
        }
    }
}

/// Telemetry aggregator.
///
/// Every call to [`Collector::collect`] queries the host again; nothing is
/// cached between snapshots, including the choice of session source.
pub struct Collector<P: TelemetryProvider, F: FileSystem + Clone> {
    provider: P,
    /// Filesystem the login database is read through.
    fs: F,
    config: CollectorConfig,
}

impl Collector<HostProvider<RealFs>, RealFs> {
    /// Collector for the machine this process runs on.
    pub fn for_host(config: CollectorConfig) -> Self {
        let provider = HostProvider::with_paths(
            RealFs::new(),
            config.proc_path.clone(),
            config.sys_path.clone(),
            config.etc_path.clone(),
        );
        Self::new(provider, RealFs::new(), config)
    }
}

impl<P: TelemetryProvider, F: FileSystem + Clone> Collector<P, F> {
    pub fn new(provider: P, fs: F, config: CollectorConfig) -> Self {
        Self {
            provider,
            fs,
            config,
        }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Collects a complete snapshot. Failed queries leave their fields at
    /// the default value.
    pub fn collect(&mut self) -> Snapshot {
        let kernel_arch = or_default(self.provider.kernel_arch(), "kernel arch");
        let os = or_default(self.provider.os_info(), "os info");
        let host = HostInfo {
            host_name: or_default(self.provider.host_name(), "host name"),
            platform: os.platform,
            platform_version: os.platform_version,
            os: os.os,
            kernel_version: os.kernel_version,
            kernel_arch: kernel_arch.clone(),
        };

        let cpu_info = or_default(self.provider.cpu_info(), "cpu info");
        let usage_percent = or_default(
            self.provider.cpu_percent(self.config.cpu_window),
            "cpu usage",
        );
        let cpu = CpuSummary {
            model: if cpu_info.model_name.is_empty() {
                kernel_arch.clone()
            } else {
                cpu_info.model_name
            },
            physical_cores: cpu_info.physical_cores,
            logical_cores: cpu_info.logical_cores,
            usage_percent,
            temperature: self.temperature(),
        };

        let memory: MemorySummary = or_default(self.provider.memory(), "memory");
        let boot_time = self
            .provider
            .boot_time()
            .inspect_err(|e| debug!(query = "boot time", error = %e, "telemetry query failed"))
            .ok();
        let interfaces = or_default(self.provider.network_interfaces(), "network interfaces");
        let (sessions, session_origin) = self.sessions(&kernel_arch);

        Snapshot {
            timestamp: Utc::now().timestamp(),
            host,
            boot_time,
            cpu,
            memory,
            interfaces,
            sessions,
            session_origin,
        }
    }

    fn temperature(&self) -> Option<f64> {
        let readings = or_default(self.provider.temperatures(), "temperatures");
        let wanted = &self.config.temperature_sensor;
        let found = readings.into_iter().find(|r| &r.key == wanted);
        if found.is_none() {
            trace!(sensor = %wanted, "temperature sensor not present");
        }
        found.map(|r| r.celsius)
    }

    fn sessions(&self, kernel_arch: &str) -> (Vec<Session>, SessionOrigin) {
        let source = SessionSource::select(
            self.config.session_policy,
            kernel_arch,
            &self.config.utmp_path,
        );
        debug!(%source, "session source");

        match source {
            SessionSource::Native => match self.provider.users() {
                Ok(sessions) => (sessions, SessionOrigin::Native),
                Err(e) => {
                    debug!(query = "users", error = %e, "telemetry query failed");
                    (Vec::new(), SessionOrigin::Unavailable)
                }
            },
            SessionSource::LoginDatabase { path, layout } => {
                let reader = SessionStoreReader::new(self.fs.clone(), path, layout);
                let sessions = reader.active_records().iter().map(Session::from).collect();
                (sessions, SessionOrigin::LoginDatabase)
            }
        }
    }
}

impl<P: TelemetryProvider, F: FileSystem + Clone> SnapshotSource for Collector<P, F> {
    fn collect_snapshot(&mut self) -> Snapshot {
        self.collect()
    }
}

fn or_default<T: Default>(result: Result<T, CollectError>, what: &str) -> T {
    result.unwrap_or_else(|e| {
        debug!(query = what, error = %e, "telemetry query failed");
        T::default()
    })
}
