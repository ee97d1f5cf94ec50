//! UI module
//!
//! Input routing and the state-to-display projection. Neither touches a display.

pub mod input;
pub mod projector;

pub use input::{Action, DragEvent, InputRouter, KeyBindings, KeyInput, KeyOutcome, RouteContext};
pub use projector::{project, Projection, ProjectionInput, VisualMode};
