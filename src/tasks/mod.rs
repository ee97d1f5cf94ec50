//! Background tasks module
//! 
//! This module contains the presenter task that runs alongside the HTTP server.

pub mod commands;
pub mod presenter;

// Re-export main types
pub use commands::{ClientEffect, Command, DocumentInfo, KeyReply, TimerCommand};
pub use presenter::{Presenter, PresenterHandle};
