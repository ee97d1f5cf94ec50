//! Quiet-period debouncing for bursts of events

use std::time::Duration;

use tokio::{sync::mpsc, time::sleep};
use tokio_util::sync::CancellationToken;

/// Quiet period before a resize burst re-renders the page
pub const RESIZE_QUIET_PERIOD: Duration = Duration::from_millis(200);

/// Delays an action until triggers stop arriving for `quiet`.
///
/// Each trigger cancels the pending timer and schedules a new one; only the
/// last timer of a burst delivers its event.
#[derive(Debug)]
pub struct Debouncer {
    quiet: Duration,
    pending: Option<(u64, CancellationToken)>,
    next_id: u64,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
            next_id: 0,
        }
    }

    /// (Re)start the quiet period. When it elapses, `make(id)` is sent on `events`.
    pub fn trigger<T, F>(&mut self, events: mpsc::UnboundedSender<T>, make: F)
    where
        T: Send + 'static,
        F: FnOnce(u64) -> T + Send + 'static,
    {
        self.cancel();
        self.next_id += 1;
        let id = self.next_id;
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let quiet = self.quiet;

        tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {}
                _ = sleep(quiet) => {
                    let _ = events.send(make(id));
                }
            }
        });

        self.pending = Some((id, token));
    }

    /// Accept the event for `id` if it belongs to the pending timer
    pub fn settle(&mut self, id: u64) -> bool {
        match &self.pending {
            Some((pending, _)) if *pending == id => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        if let Some((_, token)) = self.pending.take() {
            token.cancel();
        }
    }

    #[cfg(test)]
    fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
