//! Timer state machine: Stopped, Counting, Running, Paused

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

use super::cadence::{Cadence, CadenceEvent, CadenceKind};
use crate::state::{TimerConfig, TimerPhase, TimerState};

/// Main tick period; every tick takes one tenth of a second off
pub const TICK_PERIOD: Duration = Duration::from_millis(100);
pub const COUNTDOWN_PERIOD: Duration = Duration::from_secs(1);
const TICK_STEP_TENTHS: i64 = 1;

/// Owns the timer state and the single active cadence.
///
/// At most one cadence exists, and only while the phase is Counting or
/// Running. Replacing or cancelling the handle drops the previous one, which
/// stops its task; events still in flight from it are told apart by id.
#[derive(Debug)]
pub struct TimerEngine {
    state: TimerState,
    cadence: Option<Cadence>,
    next_cadence_id: u64,
    events: mpsc::UnboundedSender<CadenceEvent>,
}

impl TimerEngine {
    pub fn new(config: &TimerConfig, events: mpsc::UnboundedSender<CadenceEvent>) -> Self {
        Self {
            state: TimerState::stopped(config),
            cadence: None,
            next_cadence_id: 0,
            events,
        }
    }

    /// Current phase, remaining time and countdown value
    pub fn state(&self) -> &TimerState {
        &self.state
    }

    /// Kind of the cadence currently ticking, if any
    pub fn active_cadence(&self) -> Option<CadenceKind> {
        self.cadence.as_ref().map(Cadence::kind)
    }

    /// Start from Stopped or Paused. Returns false when already counting or running.
    pub fn start(&mut self, config: &TimerConfig) -> bool {
        if self.state.phase.is_active() {
            return false;
        }
        if config.countdown_enabled && self.state.is_fresh(config) {
            self.begin_countdown(config);
        } else {
            self.begin_running();
        }
        true
    }

    /// Pause a counting or running timer. Returns false otherwise.
    pub fn pause(&mut self) -> bool {
        if !self.state.phase.is_active() {
            return false;
        }
        self.cancel_cadence();
        self.state.phase = TimerPhase::Paused;
        info!("Timer paused at {:.1}s", self.state.remaining_seconds());
        true
    }

    /// Resume from Paused. Replays the countdown only if not a single tick was taken.
    pub fn resume(&mut self, config: &TimerConfig) -> bool {
        if self.state.phase != TimerPhase::Paused {
            return false;
        }
        if config.countdown_enabled && self.state.is_fresh(config) {
            self.begin_countdown(config);
        } else {
            self.begin_running();
        }
        true
    }

    /// Stop the cadence and go back to the full configured total
    pub fn reset(&mut self, config: &TimerConfig) {
        self.cancel_cadence();
        self.state = TimerState::stopped(config);
        debug!("Timer reset to {}s", config.total_duration_seconds);
    }

    /// Apply one cadence firing. Returns true when the state changed.
    pub fn on_cadence(&mut self, event: CadenceEvent) -> bool {
        if !self.cadence.as_ref().is_some_and(|c| c.owns(&event)) {
            debug!("Dropping stale {:?} event {}", event.kind, event.id);
            return false;
        }

        match (event.kind, self.state.phase) {
            (CadenceKind::Countdown, TimerPhase::Counting) => {
                self.state.countdown_remaining = self.state.countdown_remaining.saturating_sub(1);
                if self.state.countdown_remaining == 0 {
                    // straight into Running so a countdown of 0 is never observable
                    self.begin_running();
                }
                true
            }
            (CadenceKind::Tick, TimerPhase::Running) => {
                self.tick();
                true
            }
            _ => false,
        }
    }

    fn tick(&mut self) {
        self.state.remaining_tenths -= TICK_STEP_TENTHS;
        if self.state.remaining_tenths == 0 {
            info!("Time is up, counting overtime");
        }
    }

    fn begin_countdown(&mut self, config: &TimerConfig) {
        self.state.phase = TimerPhase::Counting;
        self.state.countdown_remaining = config.countdown_seconds;
        self.replace_cadence(CadenceKind::Countdown, COUNTDOWN_PERIOD);
        info!("Countdown started from {}", config.countdown_seconds);
    }

    fn begin_running(&mut self) {
        self.state.phase = TimerPhase::Running;
        self.state.countdown_remaining = 0;
        self.replace_cadence(CadenceKind::Tick, TICK_PERIOD);
        info!("Timer running with {:.1}s left", self.state.remaining_seconds());
    }

    fn replace_cadence(&mut self, kind: CadenceKind, period: Duration) {
        self.cancel_cadence();
        self.next_cadence_id += 1;
        self.cadence = Some(Cadence::spawn(
            kind,
            self.next_cadence_id,
            period,
            self.events.clone(),
        ));
    }

    fn cancel_cadence(&mut self) {
        if let Some(cadence) = self.cadence.take() {
            cadence.cancel();
        }
    }
}
