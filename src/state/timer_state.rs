//! Timer configuration and timer state structures

use serde::{Deserialize, Serialize};

use crate::error::ConfigValidationError;

/// User-editable timer settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    pub total_duration_seconds: u32,
    pub countdown_enabled: bool,
    pub countdown_seconds: u32,
}

impl TimerConfig {
    /// Build a config, rejecting non-positive durations
    pub fn new(
        total_duration_seconds: i64,
        countdown_enabled: bool,
        countdown_seconds: i64,
    ) -> Result<Self, ConfigValidationError> {
        Ok(Self {
            total_duration_seconds: validate_total(total_duration_seconds)?,
            countdown_enabled,
            countdown_seconds: validate_countdown(countdown_seconds)?,
        })
    }

    /// Total duration in tenths of a second, the unit the tick cadence counts in
    pub fn total_tenths(&self) -> i64 {
        i64::from(self.total_duration_seconds) * 10
    }

    /// Apply a partial update. Every field is validated before any is written,
    /// so a rejected update leaves the config untouched.
    pub fn apply(&mut self, update: &ConfigUpdate) -> Result<ConfigChange, ConfigValidationError> {
        let total = update.total_duration_seconds.map(validate_total).transpose()?;
        let countdown = update.countdown_seconds.map(validate_countdown).transpose()?;

        let mut change = ConfigChange::default();
        if let Some(total) = total {
            change.total_set = true;
            self.total_duration_seconds = total;
        }
        if let Some(enabled) = update.countdown_enabled {
            self.countdown_enabled = enabled;
        }
        if let Some(countdown) = countdown {
            self.countdown_seconds = countdown;
        }
        Ok(change)
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            total_duration_seconds: 60,
            countdown_enabled: true,
            countdown_seconds: 3,
        }
    }
}

fn validate_total(value: i64) -> Result<u32, ConfigValidationError> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or(ConfigValidationError::TotalDuration(value))
}

fn validate_countdown(value: i64) -> Result<u32, ConfigValidationError> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or(ConfigValidationError::CountdownDuration(value))
}

/// Partial config update as sent by the settings panel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigUpdate {
    #[serde(default)]
    pub total_duration_seconds: Option<i64>,
    #[serde(default)]
    pub countdown_enabled: Option<bool>,
    #[serde(default)]
    pub countdown_seconds: Option<i64>,
}

/// What an accepted update touched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigChange {
    /// The total duration was written, even if to the same value
    pub total_set: bool,
}

/// Timer phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    Stopped,
    Counting,
    Running,
    Paused,
}

impl TimerPhase {
    /// Phases during which exactly one cadence is scheduled
    pub fn is_active(&self) -> bool {
        matches!(self, TimerPhase::Counting | TimerPhase::Running)
    }
}

/// The one timer instance.
///
/// Remaining time is kept in whole tenths so repeated 0.1s steps never drift
/// and "never decremented" can be checked with exact equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerState {
    pub phase: TimerPhase,
    pub remaining_tenths: i64,
    pub countdown_remaining: u32,
}

impl TimerState {
    /// Stopped at full duration
    pub fn stopped(config: &TimerConfig) -> Self {
        Self {
            phase: TimerPhase::Stopped,
            remaining_tenths: config.total_tenths(),
            countdown_remaining: 0,
        }
    }

    pub fn remaining_seconds(&self) -> f64 {
        self.remaining_tenths as f64 / 10.0
    }

    /// True until the first tick has been taken off the full duration
    pub fn is_fresh(&self, config: &TimerConfig) -> bool {
        self.remaining_tenths == config.total_tenths()
    }

    pub fn is_overtime(&self) -> bool {
        self.remaining_tenths <= 0
    }
}
