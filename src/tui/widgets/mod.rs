//! Dashboard widgets.

mod panel;

pub use panel::render_panel;
