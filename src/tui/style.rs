//! Colour scheme.

use ratatui::style::{Color, Modifier, Style};

use crate::view::PanelKind;

/// Dashboard palette, one colour per panel.
pub struct Theme;

impl Theme {
    pub const BG: Color = Color::Reset;

    pub const SYSTEM_INFO: Color = Color::Yellow;
    pub const USERS: Color = Color::Green;
    pub const NETWORK: Color = Color::Red;

    pub fn panel(kind: PanelKind) -> Color {
        match kind {
            PanelKind::SystemInfo => Self::SYSTEM_INFO,
            PanelKind::Users => Self::USERS,
            PanelKind::Network => Self::NETWORK,
        }
    }
}

/// Pre-defined styles.
pub struct Styles;

impl Styles {
    /// Border and body text of a panel.
    pub fn panel(kind: PanelKind) -> Style {
        Style::default().fg(Theme::panel(kind)).bg(Theme::BG)
    }

    /// Panel title.
    pub fn title(kind: PanelKind) -> Style {
        Self::panel(kind).add_modifier(Modifier::BOLD)
    }
}
