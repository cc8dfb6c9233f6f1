//! UI-agnostic view model of the dashboard.
//!
//! [`DashboardView`] turns a [`Snapshot`](crate::model::Snapshot) into the text of the three panels.
//! The TUI maps it to widgets; `--once` prints it as plain text.

mod dashboard;

pub use dashboard::{DashboardView, PanelKind, PanelView};
