//! Formatting helpers shared by the dashboard and the one-shot output.

mod format;

pub use format::{bytes_to_mb, format_timestamp, format_timestamp_in, netmask_prefix};
