//! Terminal dashboard.
//!
//! Three panels (System Info, Users, Network Interfaces) redrawn whenever the
//! refresh loop delivers a snapshot. Any key exits.

mod app;
mod event;
mod render;
mod style;
mod widgets;

pub use app::App;
pub use render::{panel_areas, render};
