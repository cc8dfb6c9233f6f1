//! Host telemetry collection.
//!
//! Raw queries go through [`TelemetryProvider`]; [`Collector`] turns them into
//! a [`Snapshot`](crate::model::Snapshot), reading sessions either from the C
//! library or straight from the login database.

pub mod aggregator;
pub mod error;
pub mod host;
pub mod mock;
mod native;
pub mod procfs;
pub mod session;
pub mod traits;
pub mod utmp;

pub use aggregator::{Collector, CollectorConfig, DEFAULT_CPU_WINDOW, DEFAULT_TEMPERATURE_SENSOR};
pub use error::CollectError;
pub use host::{HostProvider, OsInfo, TelemetryProvider, TemperatureReading};
pub use session::{SessionPolicy, SessionSource};
pub use traits::{FileSystem, RealFs};
