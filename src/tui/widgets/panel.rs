//! A titled, coloured text panel.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::tui::style::Styles;
use crate::view::PanelView;

/// Renders one dashboard panel. Lines that do not fit are clipped.
pub fn render_panel(frame: &mut Frame, area: Rect, panel: &PanelView) {
    let style = Styles::panel(panel.kind);
    let block = Block::default()
        .title(Span::styled(panel.title(), Styles::title(panel.kind)))
        .borders(Borders::ALL)
        .border_style(style);

    let lines: Vec<Line> = panel.lines.iter().map(|l| Line::raw(l.as_str())).collect();
    let paragraph = Paragraph::new(lines).block(block).style(style);
    frame.render_widget(paragraph, area);
}
