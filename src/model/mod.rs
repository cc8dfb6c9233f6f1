//! Data model shared by the collector, the refresh loop and the dashboard.

mod snapshot;

pub use snapshot::{
    CpuSummary, HostInfo, InterfaceAddress, MemorySummary, Session, SessionOrigin, Snapshot,
};
