//! Choosing where the session list comes from.
//!
//! The C library's `getutxent` does not work on every host (notably 64-bit
//! ARM builds with a mismatched libc), so on those the login database is
//! decoded directly.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::collector::utmp::{LoginRecord, RecordLayout};
use crate::model::Session;

/// User preference for the session source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPolicy {
    /// Login database on aarch64, C library elsewhere.
    #[default]
    Auto,
    Native,
    /// Always decode the login database.
    Utmp,
}

impl FromStr for SessionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(SessionPolicy::Auto),
            "native" => Ok(SessionPolicy::Native),
            "utmp" => Ok(SessionPolicy::Utmp),
            other => Err(format!(
                "unknown session source '{}', expected auto, native or utmp",
                other
            )),
        }
    }
}

/// Resolved session source for one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSource {
    Native,
    LoginDatabase {
        path: PathBuf,
        layout: &'static RecordLayout,
    },
}

/// Whether `arch` should bypass the C library under [`SessionPolicy::Auto`].
fn prefers_login_database(arch: &str) -> bool {
    matches!(arch, "aarch64" | "arm64")
}

impl SessionSource {
    /// Picks the source for a host reporting `kernel_arch`.
    ///
    /// The login database needs a known record layout; without one the
    /// C library is used whatever the policy says.
    pub fn select(policy: SessionPolicy, kernel_arch: &str, utmp_path: &Path) -> Self {
        let wants_db = match policy {
            SessionPolicy::Auto => prefers_login_database(kernel_arch),
            SessionPolicy::Native => false,
            SessionPolicy::Utmp => true,
        };
        if !wants_db {
            return SessionSource::Native;
        }

        match RecordLayout::for_arch(kernel_arch) {
            Some(layout) => SessionSource::LoginDatabase {
                path: utmp_path.to_path_buf(),
                layout,
            },
            None => {
                tracing::debug!(
                    arch = kernel_arch,
                    "no login record layout for architecture, using C library"
                );
                SessionSource::Native
            }
        }
    }
}

impl fmt::Display for SessionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionSource::Native => write!(f, "getutxent"),
            SessionSource::LoginDatabase { path, layout } => {
                write!(f, "{} ({} layout)", path.display(), layout.arch)
            }
        }
    }
}

impl From<&LoginRecord> for Session {
    fn from(record: &LoginRecord) -> Self {
        Session {
            user: record.user.clone(),
            host: record.host.clone(),
            terminal: record.line.clone(),
            started: record.time.to_datetime().map(|t| t.timestamp()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::utmp::layout::{DEFAULT_UTMP_PATH, LINUX_AARCH64, LINUX_X86_64};
    use crate::collector::utmp::{RecordType, TimeVal};

    fn utmp() -> &'static Path {
        Path::new(DEFAULT_UTMP_PATH)
    }

    #[test]
    fn test_auto_on_aarch64_reads_database() {
        assert_eq!(
            SessionSource::select(SessionPolicy::Auto, "aarch64", utmp()),
            SessionSource::LoginDatabase {
                path: PathBuf::from("/var/run/utmp"),
                layout: &LINUX_AARCH64,
            }
        );
    }

    #[test]
    fn test_auto_elsewhere_is_native() {
        for arch in ["x86_64", "armv7l", "riscv64", ""] {
            assert_eq!(
                SessionSource::select(SessionPolicy::Auto, arch, utmp()),
                SessionSource::Native,
                "{}",
                arch
            );
        }
    }

    #[test]
    fn test_forced_policies() {
        assert_eq!(
            SessionSource::select(SessionPolicy::Native, "aarch64", utmp()),
            SessionSource::Native
        );
        assert_eq!(
            SessionSource::select(SessionPolicy::Utmp, "x86_64", Path::new("/tmp/utmp")),
            SessionSource::LoginDatabase {
                path: PathBuf::from("/tmp/utmp"),
                layout: &LINUX_X86_64,
            }
        );
        // No layout for the architecture.
        assert_eq!(
            SessionSource::select(SessionPolicy::Utmp, "mips", utmp()),
            SessionSource::Native
        );
    }

    #[test]
    fn test_display() {
        let source = SessionSource::select(SessionPolicy::Utmp, "aarch64", utmp());
        assert_eq!(source.to_string(), "/var/run/utmp (aarch64 layout)");
        assert_eq!(SessionSource::Native.to_string(), "getutxent");
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("AUTO".parse::<SessionPolicy>().unwrap(), SessionPolicy::Auto);
        assert_eq!("utmp".parse::<SessionPolicy>().unwrap(), SessionPolicy::Utmp);
        assert!("wtmp".parse::<SessionPolicy>().is_err());
    }

    #[test]
    fn test_session_from_record() {
        let record = LoginRecord {
            record_type: RecordType::UserProcess,
            pid: 1,
            line: "pts/0".into(),
            id: "ts/0".into(),
            user: "admin".into(),
            host: "10.0.0.2".into(),
            termination: 0,
            exit: 0,
            session: 0,
            time: TimeVal {
                sec: 1_700_000_600,
                usec: 0,
            },
            address: [0; 4],
        };
        let session = Session::from(&record);
        assert_eq!(session.to_string(), "admin@10.0.0.2 pts/0");
        assert_eq!(session.started, Some(1_700_000_600));

        let zero = LoginRecord {
            time: TimeVal::default(),
            ..record
        };
        assert_eq!(Session::from(&zero).started, None);
    }
}
