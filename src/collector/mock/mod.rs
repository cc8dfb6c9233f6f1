//! Mock filesystem and fixtures for testing.
//!
//! This module provides `MockFs`, pre-built host scenarios and login database
//! builders, so collectors can be exercised without a real Linux host.

mod filesystem;
mod login_db;
mod scenarios;

pub use filesystem::MockFs;
pub use login_db::{FIXTURE_PID, LoginDbBuilder, encode_slot};
pub use scenarios::{SCENARIO_BTIME, raspberry_pi, typical_system};
