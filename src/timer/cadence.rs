//! Repeating scheduled callbacks driving the countdown and the main tick

use std::time::Duration;

use tokio::{
    sync::mpsc,
    time::{self, Instant},
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Which cadence fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CadenceKind {
    Countdown,
    Tick,
}

/// One firing of a cadence, tagged with the handle that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CadenceEvent {
    pub kind: CadenceKind,
    pub id: u64,
}

/// Handle to a spawned repeating task. Dropping it cancels the task.
#[derive(Debug)]
pub struct Cadence {
    kind: CadenceKind,
    id: u64,
    token: CancellationToken,
}

impl Cadence {
    /// Spawn a task that sends a `CadenceEvent` every `period`, first one after one period
    pub fn spawn(
        kind: CadenceKind,
        id: u64,
        period: Duration,
        events: mpsc::UnboundedSender<CadenceEvent>,
    ) -> Self {
        let token = CancellationToken::new();
        let cancelled = token.clone();

        tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => {
                        debug!("{:?} cadence {} cancelled", kind, id);
                        break;
                    }
                    _ = interval.tick() => {
                        if events.send(CadenceEvent { kind, id }).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Self { kind, id, token }
    }

    /// Whether this handle drives the countdown or the main timer
    pub fn kind(&self) -> CadenceKind {
        self.kind
    }

    /// Whether `event` came from this handle
    pub fn owns(&self, event: &CadenceEvent) -> bool {
        self.kind == event.kind && self.id == event.id
    }

    /// Stop the tick task; events already queued are left to the owner
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl Drop for Cadence {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
