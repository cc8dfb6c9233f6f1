//! Pre-built host fixtures.

use super::filesystem::MockFs;
use super::login_db::LoginDbBuilder;
use crate::collector::utmp::layout::{DEFAULT_UTMP_PATH, LINUX_AARCH64};

/// Boot time written into every scenario's `/proc/stat`.
pub const SCENARIO_BTIME: i64 = 1_700_000_000;

const X86_CPUINFO: &str = "\
processor\t: 0
vendor_id\t: GenuineIntel
model name\t: Intel(R) Core(TM) i5-8250U CPU @ 1.60GHz
physical id\t: 0
core id\t\t: 0

processor\t: 1
model name\t: Intel(R) Core(TM) i5-8250U CPU @ 1.60GHz
physical id\t: 0
core id\t\t: 1

processor\t: 2
model name\t: Intel(R) Core(TM) i5-8250U CPU @ 1.60GHz
physical id\t: 0
core id\t\t: 0

processor\t: 3
model name\t: Intel(R) Core(TM) i5-8250U CPU @ 1.60GHz
physical id\t: 0
core id\t\t: 1
";

const PI_CPUINFO: &str = "\
processor\t: 0
BogoMIPS\t: 108.00
Features\t: fp asimd evtstrm crc32 cpuid
CPU implementer\t: 0x41

processor\t: 1
BogoMIPS\t: 108.00

processor\t: 2
BogoMIPS\t: 108.00

processor\t: 3
BogoMIPS\t: 108.00

Hardware\t: BCM2835
Model\t\t: Raspberry Pi 4 Model B Rev 1.4
";

fn stat(user: u64, idle: u64) -> String {
    format!(
        "cpu  {user} 0 {sys} {idle} 10 0 5 0 0 0\n\
         cpu0 {user} 0 {sys} {idle} 10 0 5 0 0 0\n\
         intr 123456\n\
         ctxt 987654\n\
         btime {btime}\n\
         processes 4321\n",
        user = user,
        sys = user / 4,
        idle = idle,
        btime = SCENARIO_BTIME,
    )
}

fn add_common(fs: &mut MockFs, hostname: &str, arch: &str, release: &str) {
    fs.add_file("/proc/sys/kernel/hostname", format!("{}\n", hostname));
    fs.add_file("/proc/sys/kernel/ostype", "Linux\n");
    fs.add_file("/proc/sys/kernel/osrelease", format!("{}\n", release));
    fs.add_file("/proc/sys/kernel/arch", format!("{}\n", arch));
    fs.add_file("/proc/stat", stat(40_000, 160_000));
}

/// A four-thread x86_64 workstation running Ubuntu, with no login database
/// and an ACPI temperature sensor.
pub fn typical_system() -> MockFs {
    let mut fs = MockFs::new();
    add_common(&mut fs, "workstation", "x86_64", "6.8.0-45-generic");
    fs.add_file(
        "/etc/os-release",
        "NAME=\"Ubuntu\"\nID=ubuntu\nVERSION_ID=\"24.04\"\n",
    );
    fs.add_file(
        "/proc/meminfo",
        "MemTotal:       16305104 kB\n\
         MemFree:         2117640 kB\n\
         MemAvailable:    8152552 kB\n\
         Buffers:          412360 kB\n\
         Cached:          5893720 kB\n\
         Active:          7004112 kB\n",
    );
    fs.add_file("/proc/cpuinfo", X86_CPUINFO);
    fs.add_hwmon("/sys", 0, "acpitz", 45_000);
    fs
}

/// A Raspberry Pi 4 on aarch64 with a `cpu_thermal` sensor and two
/// logged-in users in the login database.
pub fn raspberry_pi() -> MockFs {
    let mut fs = MockFs::new();
    add_common(&mut fs, "raspberrypi", "aarch64", "6.6.31+rpt-rpi-v8");
    fs.add_file(
        "/etc/os-release",
        "PRETTY_NAME=\"Debian GNU/Linux 12 (bookworm)\"\nID=debian\nVERSION_ID=\"12\"\n",
    );
    fs.add_file(
        "/proc/meminfo",
        "MemTotal:        3884376 kB\n\
         MemFree:          912340 kB\n\
         MemAvailable:    2936524 kB\n\
         Buffers:          112244 kB\n\
         Cached:          1850028 kB\n\
         Active:          1104332 kB\n",
    );
    fs.add_file("/proc/cpuinfo", PI_CPUINFO);
    fs.add_hwmon("/sys", 0, "cpu_thermal", 48_686);
    fs.add_hwmon("/sys", 1, "rpi_volt", 0);
    fs.add_file(
        DEFAULT_UTMP_PATH,
        LoginDbBuilder::new(&LINUX_AARCH64)
            .boot(SCENARIO_BTIME as u32)
            .record(6, "LOGIN", "", "tty2", SCENARIO_BTIME as u32 + 10)
            .user("pi", "", "tty1", SCENARIO_BTIME as u32 + 30)
            .user("admin", "192.168.1.20", "pts/0", SCENARIO_BTIME as u32 + 600)
            .build(),
    );
    fs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::traits::FileSystem;
    use std::path::Path;

    #[test]
    fn test_typical_system_files() {
        let fs = typical_system();
        assert!(fs.exists(Path::new("/proc/meminfo")));
        assert!(fs.exists(Path::new("/sys/class/hwmon/hwmon0/temp1_input")));
        assert!(!fs.exists(Path::new(DEFAULT_UTMP_PATH)));
    }

    #[test]
    fn test_raspberry_pi_login_db_size() {
        let fs = raspberry_pi();
        let data = fs.read(Path::new(DEFAULT_UTMP_PATH)).unwrap();
        assert_eq!(data.len(), 4 * LINUX_AARCH64.size);
    }
}
