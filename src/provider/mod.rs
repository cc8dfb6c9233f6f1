//! Snapshot delivery to the dashboard.
//!
//! A [`SnapshotSource`] computes snapshots on demand; the [`RefreshScheduler`]
//! calls it once per interval on a background thread and hands each result
//! to the consumer over a channel.

mod scheduler;

pub use scheduler::{RefreshHandle, RefreshScheduler, SchedulerState, run_refresh_loop};

use crate::model::Snapshot;

/// Anything that can produce a fresh snapshot.
///
/// Implementations query live state on every call; the scheduler never
/// caches a result.
pub trait SnapshotSource: Send {
    fn collect_snapshot(&mut self) -> Snapshot;
}
