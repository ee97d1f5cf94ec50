//! Pure projection of presenter state into what the browser displays

use serde::{Deserialize, Serialize};

use crate::{
    state::{PageState, TimerConfig, TimerPhase, TimerState},
    timer::color_for,
};

/// Delay before the countdown overlay starts fading in
pub const OVERLAY_FADE_IN_MS: u64 = 10;
/// Fade-out time before the countdown overlay is hidden
pub const OVERLAY_FADE_OUT_MS: u64 = 200;

/// Visual mode flags, mutually exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualMode {
    Running,
    Paused,
    Over,
    Stopped,
    Counting,
}

impl VisualMode {
    pub fn css_class(&self) -> &'static str {
        match self {
            VisualMode::Running => "timer-running",
            VisualMode::Paused => "timer-paused",
            VisualMode::Over => "timer-over",
            VisualMode::Stopped => "timer-stopped",
            VisualMode::Counting => "timer-countdown",
        }
    }
}

/// The two color custom properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorChannels {
    /// `--timer-color`
    pub solid: String,
    /// `--timer-color-alpha`
    pub translucent: String,
    pub hue: Option<f64>,
    pub alpha: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownOverlay {
    pub visible: bool,
    pub value: Option<u32>,
    pub transition_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsPanel {
    pub open: bool,
    /// Current values to fill the panel with, present while open
    pub config: Option<TimerConfig>,
}

/// Everything the display needs, rebuilt after every transition and tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub phase: TimerPhase,
    pub display_seconds: i64,
    pub time_text: String,
    pub color: ColorChannels,
    pub mode: VisualMode,
    pub countdown: CountdownOverlay,
    pub document_loaded: bool,
    pub pages: Option<PageState>,
    pub loading: bool,
    pub drag_overlay: bool,
    pub settings: SettingsPanel,
}

/// Borrowed view of the state a projection is computed from
#[derive(Debug, Clone, Copy)]
pub struct ProjectionInput<'a> {
    pub timer: &'a TimerState,
    pub config: &'a TimerConfig,
    pub pages: Option<&'a PageState>,
    pub loading: bool,
    pub settings_open: bool,
    pub dragging: bool,
}

/// Whole seconds to show. Rounds up so "1" covers the last partial second
/// and overtime counts 0, -1, -2 as each full second past expiry elapses.
pub fn display_seconds(remaining_seconds: f64) -> i64 {
    // `as` maps -0.0 to 0
    remaining_seconds.ceil() as i64
}

pub fn visual_mode(timer: &TimerState) -> VisualMode {
    match timer.phase {
        TimerPhase::Running if timer.is_overtime() => VisualMode::Over,
        TimerPhase::Running => VisualMode::Running,
        TimerPhase::Counting => VisualMode::Counting,
        TimerPhase::Paused => VisualMode::Paused,
        TimerPhase::Stopped => VisualMode::Stopped,
    }
}

pub fn countdown_overlay(timer: &TimerState) -> CountdownOverlay {
    if timer.phase == TimerPhase::Counting && timer.countdown_remaining > 0 {
        CountdownOverlay {
            visible: true,
            value: Some(timer.countdown_remaining),
            transition_ms: OVERLAY_FADE_IN_MS,
        }
    } else {
        CountdownOverlay {
            visible: false,
            value: None,
            transition_ms: OVERLAY_FADE_OUT_MS,
        }
    }
}

pub fn project(input: &ProjectionInput<'_>) -> Projection {
    let remaining = input.timer.remaining_seconds();
    let seconds = display_seconds(remaining);
    let color = color_for(
        remaining,
        input.timer.phase,
        f64::from(input.config.total_duration_seconds),
    );

    Projection {
        phase: input.timer.phase,
        display_seconds: seconds,
        time_text: seconds.to_string(),
        color: ColorChannels {
            solid: color.solid_css(),
            translucent: color.translucent_css(),
            hue: color.hue(),
            alpha: color.alpha(),
        },
        mode: visual_mode(input.timer),
        countdown: countdown_overlay(input.timer),
        document_loaded: input.pages.is_some(),
        pages: input.pages.cloned(),
        loading: input.loading,
        drag_overlay: input.dragging,
        settings: SettingsPanel {
            open: input.settings_open,
            config: input.settings_open.then_some(*input.config),
        },
    }
}
