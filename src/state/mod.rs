//! State management module
//! 
//! This module contains the owned state structures shared by the presenter components.

pub mod app_state;
pub mod page_state;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use page_state::{ContainerSize, PageSize, PageState, RenderedFrame, Viewport};
pub use timer_state::{ConfigChange, ConfigUpdate, TimerConfig, TimerPhase, TimerState};
