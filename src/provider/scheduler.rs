//! Timer-driven refresh loop.
//!
//! States: Running after [`RefreshScheduler::start`] returns, Stopped once
//! cancellation is observed. Stopped is terminal.

use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, bounded, select, tick};
use tracing::{debug, trace};

use super::SnapshotSource;
use crate::model::Snapshot;

/// Lifecycle of a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Running,
    Stopped,
}

/// Builds the refresh loop for a source.
pub struct RefreshScheduler<S: SnapshotSource + 'static> {
    source: S,
    interval: Duration,
}

impl<S: SnapshotSource + 'static> RefreshScheduler<S> {
    pub fn new(source: S, interval: Duration) -> Self {
        Self { source, interval }
    }

    /// Computes the first snapshot on the calling thread, then starts the
    /// timer loop in the background.
    ///
    /// The first snapshot is returned directly so the dashboard can draw
    /// before the first tick.
    pub fn start(mut self) -> std::io::Result<(Snapshot, RefreshHandle)> {
        let initial = self.source.collect_snapshot();

        // Rendezvous: a snapshot is built only after the previous one has
        // been taken.
        let (snapshot_tx, snapshot_rx) = bounded(0);
        let (cancel_tx, cancel_rx) = bounded(1);

        let interval = self.interval;
        let source = self.source;
        let worker = std::thread::Builder::new()
            .name("refresh".to_string())
            .spawn(move || run_refresh_loop(source, interval, snapshot_tx, cancel_rx))?;

        debug!(?interval, "refresh scheduler running");
        Ok((
            initial,
            RefreshHandle {
                snapshots: snapshot_rx,
                cancel: cancel_tx,
                worker: Some(worker),
            },
        ))
    }
}

/// Consumer side of a running scheduler.
///
/// Dropping the handle also stops the loop: the cancel channel disconnects.
pub struct RefreshHandle {
    snapshots: Receiver<Snapshot>,
    cancel: Sender<()>,
    worker: Option<JoinHandle<usize>>,
}

impl RefreshHandle {
    /// Snapshots in chronological order, one per tick.
    ///
    /// Disconnects once the loop stops.
    pub fn snapshots(&self) -> &Receiver<Snapshot> {
        &self.snapshots
    }

    /// A sender for other cancellation sources (signal handlers).
    pub fn cancel_sender(&self) -> Sender<()> {
        self.cancel.clone()
    }

    /// Signals the loop to stop. Idempotent; does not wait.
    pub fn cancel(&self) {
        let _ = self.cancel.try_send(());
    }

    pub fn state(&self) -> SchedulerState {
        match &self.worker {
            Some(worker) if !worker.is_finished() => SchedulerState::Running,
            _ => SchedulerState::Stopped,
        }
    }

    /// Cancels and waits for the loop to exit.
    ///
    /// Returns the number of snapshots delivered by ticks (the initial one
    /// is not counted).
    pub fn stop(mut self) -> usize {
        self.cancel();
        let delivered = self
            .worker
            .take()
            .and_then(|worker| worker.join().ok())
            .unwrap_or(0);
        debug!(delivered, "refresh scheduler stopped");
        delivered
    }
}

/// Runs until cancelled, delivering one snapshot per tick.
///
/// Cancellation is a message on `cancel` or all its senders being dropped.
/// A recompute in progress always finishes, but its result is discarded if
/// cancellation arrives while waiting for the consumer. Ticks missed during
/// a slow recompute or delivery collapse into one. Returns the number of
/// snapshots delivered.
pub fn run_refresh_loop<S: SnapshotSource>(
    mut source: S,
    interval: Duration,
    snapshots: Sender<Snapshot>,
    cancel: Receiver<()>,
) -> usize {
    let ticker = tick(interval);
    let mut delivered = 0;

    loop {
        select! {
            recv(cancel) -> _ => break,
            recv(ticker) -> _ => {
                // Both may be ready at once; cancellation wins.
                if !cancel.is_empty() {
                    break;
                }
                let snapshot = source.collect_snapshot();
                trace!(timestamp = snapshot.timestamp, "snapshot ready");
                select! {
                    send(snapshots, snapshot) -> res => {
                        if res.is_err() {
                            // Consumer went away.
                            break;
                        }
                        delivered += 1;
                    }
                    recv(cancel) -> _ => break,
                }
            }
        }
    }

    delivered
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    /// Source numbering its snapshots through `timestamp`.
    struct CountingSource {
        calls: Arc<AtomicUsize>,
    }

    impl CountingSource {
        fn new() -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    impl SnapshotSource for CountingSource {
        fn collect_snapshot(&mut self) -> Snapshot {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Snapshot {
                timestamp: n as i64,
                ..Default::default()
            }
        }
    }

    #[test]
    fn test_immediate_cancel_delivers_one() {
        let (source, _) = CountingSource::new();
        let (initial, handle) = RefreshScheduler::new(source, Duration::from_secs(1))
            .start()
            .unwrap();
        assert_eq!(initial.timestamp, 0);

        let snapshots = handle.snapshots().clone();
        assert_eq!(handle.stop(), 0);
        assert!(snapshots.try_recv().is_err());
    }

    #[test]
    fn test_snapshots_in_order() {
        let (source, _) = CountingSource::new();
        let (initial, handle) = RefreshScheduler::new(source, Duration::from_millis(5))
            .start()
            .unwrap();

        let mut last = initial.timestamp;
        for _ in 0..5 {
            let snapshot = handle.snapshots().recv().unwrap();
            assert!(snapshot.timestamp > last);
            last = snapshot.timestamp;
        }
        assert_eq!(handle.state(), SchedulerState::Running);
        assert_eq!(handle.stop(), 5);
    }

    #[test]
    fn test_rate_bounded_by_interval() {
        let interval = Duration::from_millis(20);
        let window = Duration::from_millis(300);
        let (source, _) = CountingSource::new();

        let begin = Instant::now();
        let (_, handle) = RefreshScheduler::new(source, interval).start().unwrap();
        let mut received = 1;
        while let Some(left) = window.checked_sub(begin.elapsed()) {
            if handle.snapshots().recv_timeout(left).is_ok() {
                received += 1;
            }
        }
        handle.stop();

        let max = (window.as_millis() / interval.as_millis()) as usize + 1;
        assert!(received <= max, "{} snapshots, at most {}", received, max);
        assert!(received >= max / 2, "{} snapshots, expected about {}", received, max);
    }

    #[test]
    fn test_slow_consumer_coalesces_ticks() {
        let interval = Duration::from_millis(5);
        let (source, calls) = CountingSource::new();
        let (_, handle) = RefreshScheduler::new(source, interval).start().unwrap();

        // Ten intervals without reading: at most one recompute is waiting.
        std::thread::sleep(interval * 10);
        assert!(calls.load(Ordering::SeqCst) <= 2);

        handle.snapshots().recv().unwrap();
        handle.stop();
    }

    #[test]
    fn test_drop_handle_stops_loop() {
        let (source, _) = CountingSource::new();
        let (snapshot_tx, snapshot_rx) = bounded(0);
        let (cancel_tx, cancel_rx) = bounded::<()>(1);
        let worker = std::thread::spawn(move || {
            run_refresh_loop(source, Duration::from_secs(60), snapshot_tx, cancel_rx)
        });

        drop(cancel_tx);
        assert_eq!(worker.join().unwrap(), 0);
        assert!(snapshot_rx.recv().is_err());
    }

    #[test]
    fn test_external_cancel_sender() {
        let (source, _) = CountingSource::new();
        let (_, handle) = RefreshScheduler::new(source, Duration::from_millis(5))
            .start()
            .unwrap();
        handle.cancel_sender().send(()).unwrap();

        // The loop exits and disconnects the snapshot channel.
        while handle.snapshots().recv().is_ok() {}
        handle.stop();
    }
}
