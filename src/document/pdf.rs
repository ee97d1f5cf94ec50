//! Built-in PDF backend.
//!
//! Resolves the page tree through the cross-reference data, so incremental
//! updates and compressed object streams are read the way a viewer reads
//! them. Pixels are painted by the browser; a render here produces the
//! canvas frame (page, size, scale) the browser is told to paint.

use std::sync::Arc;

use async_trait::async_trait;
use lopdf::{Dictionary, Object, ObjectId};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::backend::{Document, DocumentBackend, RenderOutcome};
use crate::{
    error::DecodeError,
    state::{PageSize, RenderedFrame, Viewport},
};

const HEADER: &[u8] = b"%PDF-";
const TRAILER: &[u8] = b"%%EOF";
// Readers accept junk before the header and after the trailer within this window
const SCAN_WINDOW: usize = 1024;
// Bound on the /Parent walk for inherited page attributes
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Backend decoding PDFs into a `PdfOutline`
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfOutlineBackend;

#[async_trait]
impl DocumentBackend for PdfOutlineBackend {
    async fn open(&self, bytes: Vec<u8>) -> Result<Arc<dyn Document>, DecodeError> {
        let outline = tokio::task::spawn_blocking(move || PdfOutline::parse(&bytes))
            .await
            .map_err(|e| DecodeError::Backend(e.to_string()))??;
        Ok(Arc::new(outline))
    }
}

/// Page geometry of every page in a PDF, in page order
#[derive(Debug, Clone, PartialEq)]
pub struct PdfOutline {
    page_sizes: Vec<PageSize>,
}

impl PdfOutline {
    pub fn parse(bytes: &[u8]) -> Result<Self, DecodeError> {
        let head = &bytes[..bytes.len().min(SCAN_WINDOW)];
        if find(head, HEADER).is_none() {
            return Err(DecodeError::MissingHeader);
        }
        let tail = &bytes[bytes.len().saturating_sub(SCAN_WINDOW)..];
        if find(tail, TRAILER).is_none() {
            return Err(DecodeError::Truncated);
        }

        let document =
            lopdf::Document::load_mem(bytes).map_err(|e| DecodeError::Backend(e.to_string()))?;
        let page_sizes: Vec<PageSize> = document
            .page_iter()
            .map(|page| media_box(&document, page).unwrap_or(PageSize::LETTER))
            .collect();
        if page_sizes.is_empty() {
            return Err(DecodeError::NoPages);
        }

        debug!(
            "Parsed PDF {}: {} pages, first {:?}",
            document.version,
            page_sizes.len(),
            page_sizes[0]
        );
        Ok(Self { page_sizes })
    }
}

#[async_trait]
impl Document for PdfOutline {
    fn page_count(&self) -> u32 {
        u32::try_from(self.page_sizes.len()).unwrap_or(u32::MAX)
    }

    fn page_size(&self, page: u32) -> Option<PageSize> {
        let index = usize::try_from(page).ok()?.checked_sub(1)?;
        self.page_sizes.get(index).copied()
    }

    async fn render(
        &self,
        page: u32,
        viewport: Viewport,
        cancel: CancellationToken,
    ) -> RenderOutcome {
        if self.page_size(page).is_none() {
            return RenderOutcome::Failed(format!("page {} out of range", page));
        }
        tokio::task::yield_now().await;
        if cancel.is_cancelled() {
            return RenderOutcome::Cancelled;
        }
        RenderOutcome::Completed(RenderedFrame::new(page, viewport))
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// `/MediaBox` of a page, inherited from its ancestors when the page has none
fn media_box(document: &lopdf::Document, page: ObjectId) -> Option<PageSize> {
    let mut node: &Dictionary = document.get_dictionary(page).ok()?;
    for _ in 0..MAX_INHERITANCE_DEPTH {
        if let Ok(value) = node.get(b"MediaBox") {
            return rectangle(document, value);
        }
        let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = document.get_dictionary(parent).ok()?;
    }
    None
}

fn rectangle(document: &lopdf::Document, value: &Object) -> Option<PageSize> {
    let (_, value) = document.dereference(value).ok()?;
    let numbers: Vec<f64> = value
        .as_array()
        .ok()?
        .iter()
        .map(|n| {
            let (_, n) = document.dereference(n).ok()?;
            n.as_float().ok().map(f64::from)
        })
        .collect::<Option<_>>()?;
    let [x0, y0, x1, y1] = numbers.as_slice() else {
        return None;
    };

    let width = (x1 - x0).abs();
    let height = (y1 - y0).abs();
    (width > 0.0 && height > 0.0).then_some(PageSize { width, height })
}
