use std::fmt;
use std::fmt::Display;

use chrono::{Local, TimeZone};
use serde::Serialize;

use crate::model::Snapshot;
use crate::util::{bytes_to_mb, format_timestamp_in};

/// Which panel a [`PanelView`] fills; decides placement and colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PanelKind {
    SystemInfo,
    Users,
    Network,
}

impl PanelKind {
    pub fn title(self) -> &'static str {
        match self {
            PanelKind::SystemInfo => "System Info",
            PanelKind::Users => "Users",
            PanelKind::Network => "Network Interfaces",
        }
    }
}

/// Title and text lines of one panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelView {
    pub kind: PanelKind,
    pub lines: Vec<String>,
}

impl PanelView {
    pub fn title(&self) -> &'static str {
        self.kind.title()
    }
}

/// Text of all three panels for one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardView {
    pub system_info: PanelView,
    pub users: PanelView,
    pub network: PanelView,
}

impl DashboardView {
    /// Builds the view with times in the local zone.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self::from_snapshot_in(snapshot, &Local)
    }

    pub fn from_snapshot_in<Tz: TimeZone>(snapshot: &Snapshot, tz: &Tz) -> Self
    where
        Tz::Offset: Display,
    {
        Self {
            system_info: PanelView {
                kind: PanelKind::SystemInfo,
                lines: system_info_lines(snapshot, tz),
            },
            users: PanelView {
                kind: PanelKind::Users,
                lines: std::iter::once(snapshot.host.host_name.clone())
                    .chain(snapshot.sessions.iter().map(|s| s.to_string()))
                    .collect(),
            },
            network: PanelView {
                kind: PanelKind::Network,
                lines: snapshot.interfaces.iter().map(|i| i.to_string()).collect(),
            },
        }
    }

    pub fn panels(&self) -> [&PanelView; 3] {
        [&self.system_info, &self.users, &self.network]
    }
}

fn system_info_lines<Tz: TimeZone>(snapshot: &Snapshot, tz: &Tz) -> Vec<String>
where
    Tz::Offset: Display,
{
    let host = &snapshot.host;
    let cpu = &snapshot.cpu;
    let mem = &snapshot.memory;

    let temperature = cpu
        .temperature
        .map(|t| format!("{:.2}°C ", t))
        .unwrap_or_default();
    let boot = snapshot
        .boot_time
        .map(|b| format_timestamp_in(b, tz))
        .unwrap_or_default();

    vec![
        format!("date: {}", format_timestamp_in(snapshot.timestamp, tz)),
        format!("boot: {}", boot),
        format!("name: {} {}", host.platform, host.platform_version),
        format!("os  : {}-{}", host.os, host.kernel_version),
        format!("cpu : {}", cpu.model),
        format!(
            "core: {}/{} ({}{:.2}%)",
            cpu.physical_cores, cpu.logical_cores, temperature, cpu.usage_percent
        ),
        format!(
            "ram : {}/{} MB ({:.2}%)",
            bytes_to_mb(mem.used),
            bytes_to_mb(mem.total),
            mem.usage_percent
        ),
    ]
}

impl fmt::Display for DashboardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, panel) in self.panels().into_iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "[{}]", panel.title())?;
            for line in &panel.lines {
                writeln!(f, "{}", line)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        CpuSummary, HostInfo, InterfaceAddress, MemorySummary, Session, SessionOrigin,
    };
    use chrono::Utc;

    fn pi_snapshot() -> Snapshot {
        Snapshot {
            timestamp: 1_700_003_600,
            host: HostInfo {
                host_name: "raspberrypi".into(),
                platform: "debian".into(),
                platform_version: "12".into(),
                os: "linux".into(),
                kernel_version: "6.6.31+rpt-rpi-v8".into(),
                kernel_arch: "aarch64".into(),
            },
            boot_time: Some(1_700_000_000),
            cpu: CpuSummary {
                model: "aarch64".into(),
                physical_cores: 4,
                logical_cores: 4,
                usage_percent: 3.5,
                temperature: Some(48.686),
            },
            memory: MemorySummary::new(970_752 * 1024, 3_884_376 * 1024),
            interfaces: vec![
                InterfaceAddress {
                    name: "lo".into(),
                    address: "127.0.0.1/8".into(),
                },
                InterfaceAddress {
                    name: "wlan0".into(),
                    address: "192.168.1.10/24".into(),
                },
            ],
            sessions: vec![Session {
                user: "pi".into(),
                host: "".into(),
                terminal: "tty1".into(),
                started: Some(1_700_000_030),
            }],
            session_origin: SessionOrigin::LoginDatabase,
        }
    }

    #[test]
    fn test_system_info_panel() {
        let view = DashboardView::from_snapshot_in(&pi_snapshot(), &Utc);
        assert_eq!(
            view.system_info.lines,
            vec![
                "date: 2023-11-14 23:13:20",
                "boot: 2023-11-14 22:13:20",
                "name: debian 12",
                "os  : linux-6.6.31+rpt-rpi-v8",
                "cpu : aarch64",
                "core: 4/4 (48.69°C 3.50%)",
                "ram : 948/3793 MB (24.99%)",
            ]
        );
    }

    #[test]
    fn test_users_panel_starts_with_host_name() {
        let view = DashboardView::from_snapshot_in(&pi_snapshot(), &Utc);
        assert_eq!(view.users.lines, vec!["raspberrypi", "pi@ tty1"]);
    }

    #[test]
    fn test_network_panel() {
        let view = DashboardView::from_snapshot_in(&pi_snapshot(), &Utc);
        assert_eq!(
            view.network.lines,
            vec!["lo: 127.0.0.1/8", "wlan0: 192.168.1.10/24"]
        );
        assert_eq!(view.network.title(), "Network Interfaces");
    }

    #[test]
    fn test_empty_snapshot_is_blank_not_error() {
        let view = DashboardView::from_snapshot_in(&Snapshot::default(), &Utc);
        assert_eq!(view.system_info.lines[1], "boot: ");
        assert_eq!(view.system_info.lines[5], "core: 0/0 (0.00%)");
        assert_eq!(view.system_info.lines[6], "ram : 0/0 MB (0.00%)");
        assert_eq!(view.users.lines, vec![""]);
        assert!(view.network.lines.is_empty());
    }

    #[test]
    fn test_display() {
        let text = DashboardView::from_snapshot_in(&pi_snapshot(), &Utc).to_string();
        assert!(text.starts_with("[System Info]\ndate: "));
        assert!(text.contains("\n\n[Users]\nraspberrypi\npi@ tty1\n"));
        assert!(text.ends_with("[Network Interfaces]\nlo: 127.0.0.1/8\nwlan0: 192.168.1.10/24\n"));
    }
}
