//! Timer module
//!
//! The timer state machine, its cadence tasks and the time-to-color mapping.

pub mod cadence;
pub mod color;
pub mod engine;

pub use cadence::{Cadence, CadenceEvent, CadenceKind};
pub use color::{color_for, map_range, TimerColor};
pub use engine::TimerEngine;
