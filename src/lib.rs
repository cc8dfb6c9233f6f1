//! hostdash - host telemetry dashboard library.
//!
//! The `hostdash` binary wires these together: [`collector`] gathers a
//! snapshot, [`provider`] refreshes it on a timer, [`view`] turns it into
//! panel text and [`tui`] draws it.

pub mod collector;
pub mod model;
pub mod provider;
pub mod tui;
pub mod util;
pub mod view;
