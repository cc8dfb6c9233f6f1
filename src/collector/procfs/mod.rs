//! Text parsers for the Linux `/proc` filesystem and friends.

pub mod parser;

pub use parser::{
    CpuInfo, CpuTimes, GlobalStat, MemInfo, OsRelease, ParseError, parse_cpuinfo,
    parse_global_stat, parse_meminfo, parse_millidegrees, parse_os_release,
};
