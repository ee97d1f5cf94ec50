//! Document decoding and page rendering collaborators

use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{
    error::DecodeError,
    state::{PageSize, RenderedFrame, Viewport},
};

/// Result of one render task. Cancellation is an expected outcome, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    Completed(RenderedFrame),
    Cancelled,
    Failed(String),
}

/// Turns raw bytes into a document
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    async fn open(&self, bytes: Vec<u8>) -> Result<Arc<dyn Document>, DecodeError>;
}

/// A decoded document
#[async_trait]
pub trait Document: Send + Sync + Debug {
    fn page_count(&self) -> u32;

    /// Unscaled size of a 1-based page
    fn page_size(&self, page: u32) -> Option<PageSize>;

    /// Produce the drawing-surface output for `page`. Implementations should
    /// watch `cancel` and return `RenderOutcome::Cancelled` once it fires.
    async fn render(
        &self,
        page: u32,
        viewport: Viewport,
        cancel: CancellationToken,
    ) -> RenderOutcome;
}
