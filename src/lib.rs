//! Podium Timer - A presentation timer that drives a PDF slide viewer
//! 
//! This library coordinates a countdown timer, page navigation with
//! cancellable rendering, keyboard routing and the color/display projection
//! a browser front end renders, all owned by one presenter task.

pub mod config;
pub mod error;
pub mod state;
pub mod timer;
pub mod document;
pub mod ui;
pub mod tasks;
pub mod api;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use document::PdfOutlineBackend;
pub use state::AppState;
pub use tasks::{Presenter, PresenterHandle};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
