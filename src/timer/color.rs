//! Remaining-time to color mapping

use serde::Serialize;

use crate::state::TimerPhase;

pub const HUE_GREEN: f64 = 120.0;
pub const HUE_YELLOW: f64 = 60.0;
pub const HUE_RED: f64 = 0.0;
pub const SATURATION: u8 = 90;
pub const LIGHTNESS: u8 = 55;
pub const ALPHA: f64 = 0.5;

// Hue curve breakpoints in seconds
const GREEN_UNTIL: f64 = 11.0;
const YELLOW_FROM: f64 = 10.0;
const YELLOW_UNTIL: f64 = 5.0;
const RED_FROM: f64 = 4.0;

/// Clamped linear interpolation of `value` from `[in_min, in_max]` onto `[out_min, out_max]`
pub fn map_range(value: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    if in_max == in_min {
        return out_min;
    }
    let clamped = value.max(in_min).min(in_max);
    let ratio = (clamped - in_min) / (in_max - in_min);
    ratio * (out_max - out_min) + out_min
}

/// Hue for a running or paused timer. Negative time stays red.
pub fn hue_for(remaining_seconds: f64) -> f64 {
    if remaining_seconds > GREEN_UNTIL {
        HUE_GREEN
    } else if remaining_seconds > YELLOW_FROM {
        map_range(remaining_seconds, YELLOW_FROM, GREEN_UNTIL, HUE_YELLOW, HUE_GREEN)
    } else if remaining_seconds > YELLOW_UNTIL {
        HUE_YELLOW
    } else if remaining_seconds > RED_FROM {
        map_range(remaining_seconds, RED_FROM, YELLOW_UNTIL, HUE_RED, HUE_YELLOW)
    } else {
        HUE_RED
    }
}

/// Timer color
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimerColor {
    /// Countdown overlay is showing
    Idle,
    /// Stopped at full duration
    NotStarted,
    Hue { hue: f64 },
}

impl TimerColor {
    /// Hue in degrees, `None` for the fixed idle colors
    pub fn hue(&self) -> Option<f64> {
        match self {
            TimerColor::Hue { hue } => Some(*hue),
            _ => None,
        }
    }

    /// Opacity of the translucent channel
    pub fn alpha(&self) -> f64 {
        ALPHA
    }

    /// Solid channel, CSS value
    pub fn solid_css(&self) -> String {
        match self {
            TimerColor::Idle => "rgb(236, 240, 241)".to_string(),
            TimerColor::NotStarted => "var(--color-gray)".to_string(),
            TimerColor::Hue { hue } => format!("hsl({}, {}%, {}%)", hue, SATURATION, LIGHTNESS),
        }
    }

    /// Translucent channel, CSS value
    pub fn translucent_css(&self) -> String {
        match self {
            TimerColor::Idle => format!("rgba(236, 240, 241, {})", ALPHA),
            TimerColor::NotStarted => format!("rgba(52, 73, 94, {})", ALPHA),
            TimerColor::Hue { hue } => {
                format!("hsla({}, {}%, {}%, {})", hue, SATURATION, LIGHTNESS, ALPHA)
            }
        }
    }
}

/// Color for the given time and phase
pub fn color_for(remaining_seconds: f64, phase: TimerPhase, total_seconds: f64) -> TimerColor {
    match phase {
        TimerPhase::Counting => TimerColor::Idle,
        TimerPhase::Stopped if remaining_seconds == total_seconds => TimerColor::NotStarted,
        _ => TimerColor::Hue {
            hue: hue_for(remaining_seconds),
        },
    }
}
