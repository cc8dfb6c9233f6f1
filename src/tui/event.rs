//! Terminal input on a background thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};
use crossterm::event::{self, KeyEvent, KeyEventKind};

/// How often the reader checks whether it should stop.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Terminal events the dashboard reacts to.
#[derive(Debug, Clone, Copy)]
pub enum Event {
    Key(KeyEvent),
    Resize(u16, u16),
}

/// Reads terminal events and forwards them over a channel.
///
/// The reader thread exits when the handler is dropped or the terminal can
/// no longer be read; in the latter case the channel disconnects.
pub struct EventHandler {
    rx: Receiver<Event>,
    stop: Arc<AtomicBool>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();
        thread::spawn(move || read_events(tx, thread_stop));
        Self { rx, stop }
    }

    pub fn receiver(&self) -> &Receiver<Event> {
        &self.rx
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

fn read_events(tx: Sender<Event>, stop: Arc<AtomicBool>) {
    while !stop.load(Ordering::Relaxed) {
        let forwarded = match event::poll(POLL_INTERVAL).and_then(|ready| {
            if ready { event::read().map(Some) } else { Ok(None) }
        }) {
            Ok(Some(event::Event::Key(key))) if key.kind == KeyEventKind::Press => {
                Event::Key(key)
            }
            Ok(Some(event::Event::Resize(w, h))) => Event::Resize(w, h),
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!(error = %e, "terminal input unavailable");
                return;
            }
        };
        if tx.send(forwarded).is_err() {
            return;
        }
    }
}
