//! Screen layout.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};

use crate::view::DashboardView;

use super::widgets::render_panel;

/// Areas of the three panels: System Info and Users share the top half,
/// Network takes the bottom half.
pub fn panel_areas(area: Rect) -> [Rect; 3] {
    let rows = Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)]).split(area);
    let top = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);
    [top[0], top[1], rows[1]]
}

/// Main render function.
pub fn render(frame: &mut Frame, view: &DashboardView) {
    let [system_info, users, network] = panel_areas(frame.area());
    render_panel(frame, system_info, &view.system_info);
    render_panel(frame, users, &view.users);
    render_panel(frame, network, &view.network);
}
