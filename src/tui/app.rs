//! Main TUI application.

use std::io;

use crossbeam_channel::select;
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use tracing::debug;

use crate::model::Snapshot;
use crate::provider::RefreshHandle;
use crate::view::DashboardView;

use super::event::{Event, EventHandler};
use super::render::render;

/// Main TUI application.
pub struct App {
    view: DashboardView,
}

impl App {
    /// Creates the app showing `initial` until the first tick arrives.
    pub fn new(initial: &Snapshot) -> Self {
        Self {
            view: DashboardView::from_snapshot(initial),
        }
    }

    /// Runs until a key is pressed or the refresh loop stops.
    ///
    /// The terminal is restored and the refresh loop stopped on every exit
    /// path, including errors while drawing.
    pub fn run(mut self, refresh: RefreshHandle) -> io::Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e);
        }
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = match Terminal::new(backend) {
            Ok(terminal) => terminal,
            Err(e) => {
                let _ = execute!(io::stdout(), LeaveAlternateScreen);
                let _ = disable_raw_mode();
                return Err(e);
            }
        };

        let events = EventHandler::new();
        let result = self.event_loop(&mut terminal, &refresh, &events);

        let delivered = refresh.stop();
        debug!(delivered, "dashboard closed");

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        refresh: &RefreshHandle,
        events: &EventHandler,
    ) -> io::Result<()> {
        loop {
            terminal.draw(|frame| render(frame, &self.view))?;

            select! {
                recv(refresh.snapshots()) -> msg => match msg {
                    Ok(snapshot) => self.apply_snapshot(&snapshot),
                    // Cancelled from outside (Ctrl-C handler).
                    Err(_) => return Ok(()),
                },
                recv(events.receiver()) -> msg => match msg {
                    Ok(Event::Key(_)) => return Ok(()),
                    // Redrawn at the top of the loop.
                    Ok(Event::Resize(..)) => {}
                    Err(_) => return Ok(()),
                },
            }
        }
    }

    fn apply_snapshot(&mut self, snapshot: &Snapshot) {
        self.view = DashboardView::from_snapshot(snapshot);
    }
}
