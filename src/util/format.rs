use std::fmt::Display;
use std::net::IpAddr;

use chrono::{DateTime, Local, TimeZone};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats Unix seconds as `YYYY-MM-DD HH:MM:SS` in local time.
///
/// Out-of-range values format as an empty string.
pub fn format_timestamp(secs: i64) -> String {
    format_timestamp_in(secs, &Local)
}

/// Like [`format_timestamp`] with an explicit time zone.
pub fn format_timestamp_in<Tz: TimeZone>(secs: i64, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    DateTime::from_timestamp(secs, 0)
        .map(|utc| utc.with_timezone(tz).format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}

/// Whole mebibytes, rounded down.
pub fn bytes_to_mb(bytes: u64) -> u64 {
    bytes / 1024 / 1024
}

/// Prefix length of a netmask (`255.255.255.0` → 24).
///
/// Counts leading one bits; a non-contiguous mask stops at the first zero.
pub fn netmask_prefix(mask: IpAddr) -> u8 {
    let ones = match mask {
        IpAddr::V4(v4) => u32::from(v4).leading_ones(),
        IpAddr::V6(v6) => u128::from(v6).leading_ones(),
    };
    ones as u8
}
