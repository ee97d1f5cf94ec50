//! Document module
//!
//! Loading, page navigation and render-task management for the presented document.

pub mod backend;
pub mod controller;
pub mod debounce;
pub mod pdf;

pub use backend::{Document, DocumentBackend, RenderOutcome};
pub use controller::{DocumentChange, DocumentEvent, DocumentSource, PageController};
pub use pdf::PdfOutlineBackend;
