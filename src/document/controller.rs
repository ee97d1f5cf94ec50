//! Page controller: document lifecycle, render tasks and resize handling

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{
    backend::{Document, DocumentBackend, RenderOutcome},
    debounce::{Debouncer, RESIZE_QUIET_PERIOD},
};
use crate::{
    error::{DecodeError, DocumentError},
    state::{ContainerSize, PageState, RenderedFrame, Viewport},
};

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Bytes handed over by a file picker or a drop
#[derive(Debug, Clone)]
pub struct DocumentSource {
    pub media_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl DocumentSource {
    pub fn new(media_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self { media_type, bytes }
    }

    pub fn is_pdf(&self) -> bool {
        self.media_type
            .as_deref()
            .and_then(|m| m.split(';').next())
            .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(PDF_MEDIA_TYPE))
    }
}

/// Completion of one of the controller's tasks
#[derive(Debug)]
pub enum DocumentEvent {
    Decoded {
        id: u64,
        result: Result<Arc<dyn Document>, DecodeError>,
    },
    Rendered {
        id: u64,
        page: u32,
        outcome: RenderOutcome,
    },
    ResizeSettled {
        id: u64,
    },
}

/// What an accepted event changed
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentChange {
    Loaded { load_id: u64, page_count: u32 },
    LoadFailed { load_id: u64, error: DecodeError },
    Rendered(RenderedFrame),
    RenderCancelled { page: u32 },
    RenderFailed { page: u32, reason: String },
    ResizeSettled { rendering: bool },
}

#[derive(Debug)]
struct Task {
    id: u64,
    token: CancellationToken,
}

impl Task {
    fn new(id: u64) -> Self {
        Self {
            id,
            token: CancellationToken::new(),
        }
    }
}

/// Owns the loaded document, its page state and the single drawing surface.
///
/// At most one decode and one render are outstanding. A new request cancels
/// the outstanding one, and completions from superseded tasks are dropped.
pub struct PageController {
    backend: Arc<dyn DocumentBackend>,
    document: Option<Arc<dyn Document>>,
    pages: Option<PageState>,
    container: ContainerSize,
    decode: Option<Task>,
    render: Option<Task>,
    resize: Debouncer,
    next_task_id: u64,
    events: mpsc::UnboundedSender<DocumentEvent>,
}

impl PageController {
    pub fn new(
        backend: Arc<dyn DocumentBackend>,
        container: ContainerSize,
        events: mpsc::UnboundedSender<DocumentEvent>,
    ) -> Self {
        Self {
            backend,
            document: None,
            pages: None,
            container,
            decode: None,
            render: None,
            resize: Debouncer::new(RESIZE_QUIET_PERIOD),
            next_task_id: 0,
            events,
        }
    }

    /// A document has finished decoding
    pub fn is_loaded(&self) -> bool {
        self.document.is_some()
    }

    /// Page position of the loaded document
    pub fn pages(&self) -> Option<&PageState> {
        self.pages.as_ref()
    }

    /// Container size pages are currently fitted into
    pub fn container(&self) -> ContainerSize {
        self.container
    }

    /// A decode or render is outstanding
    pub fn is_busy(&self) -> bool {
        self.decode.is_some() || self.render.is_some()
    }

    /// Begin loading a new document and return the load id.
    ///
    /// Non-PDF input is refused without touching the current document.
    /// Otherwise the current document is dropped right away and the decode
    /// result arrives later as `DocumentEvent::Decoded`.
    pub fn load_document(&mut self, source: DocumentSource) -> Result<u64, DocumentError> {
        if !source.is_pdf() {
            warn!("Refusing document with media type {:?}", source.media_type);
            return Err(DocumentError::InvalidInput {
                media_type: source.media_type,
            });
        }

        self.cancel_decode();
        self.cancel_render();
        self.resize.cancel();
        if self.document.take().is_some() {
            info!("Closed previous document");
        }
        self.pages = None;

        let task = Task::new(self.next_id());
        let (id, token) = (task.id, task.token.clone());
        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        let bytes = source.bytes;
        info!("Decoding document {} ({} bytes)", id, bytes.len());

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => debug!("Decode {} cancelled", id),
                result = backend.open(bytes) => {
                    let _ = events.send(DocumentEvent::Decoded { id, result });
                }
            }
        });

        self.decode = Some(task);
        Ok(id)
    }

    /// Navigate to `page` and render it. False when no document or out of range.
    pub fn go_to(&mut self, page: u32) -> bool {
        match self.pages.as_mut() {
            Some(pages) if pages.contains(page) => pages.current_page = page,
            _ => return false,
        }
        self.render(page)
    }

    /// Start rendering `page`, cancelling the render in flight
    pub fn render(&mut self, page: u32) -> bool {
        let Some(document) = self.document.clone() else {
            return false;
        };
        if !self.pages.as_ref().is_some_and(|p| p.contains(page)) {
            debug!("Ignoring render of page {} outside the document", page);
            return false;
        }
        let Some(size) = document.page_size(page) else {
            return false;
        };

        self.cancel_render();
        let viewport = Viewport::fit(size, self.container);
        let task = Task::new(self.next_id());
        let (id, token) = (task.id, task.token.clone());
        let events = self.events.clone();
        debug!("Render {} of page {} at scale {:.3}", id, page, viewport.scale);

        tokio::spawn(async move {
            let outcome = document.render(page, viewport, token).await;
            let _ = events.send(DocumentEvent::Rendered { id, page, outcome });
        });

        self.render = Some(task);
        true
    }

    /// Record the new container size and schedule a debounced re-render.
    /// False when the size is unusable.
    pub fn resize(&mut self, container: ContainerSize) -> bool {
        if !container.is_usable() {
            warn!("Ignoring unusable container size {:?}", container);
            return false;
        }
        self.container = container;
        if self.is_loaded() {
            self.resize
                .trigger(self.events.clone(), |id| DocumentEvent::ResizeSettled { id });
        }
        true
    }

    /// Apply a task completion. `None` when the event was stale.
    pub fn on_event(&mut self, event: DocumentEvent) -> Option<DocumentChange> {
        match event {
            DocumentEvent::Decoded { id, result } => {
                if !self.decode.as_ref().is_some_and(|t| t.id == id) {
                    debug!("Dropping result of superseded decode {}", id);
                    return None;
                }
                self.decode = None;
                match result {
                    Ok(document) => Some(self.install(id, document)),
                    Err(error) => {
                        warn!("Decode {} failed: {}", id, error);
                        Some(DocumentChange::LoadFailed { load_id: id, error })
                    }
                }
            }
            DocumentEvent::Rendered { id, page, outcome } => {
                if !self.render.as_ref().is_some_and(|t| t.id == id) {
                    debug!("Dropping completion of superseded render {} (page {})", id, page);
                    return None;
                }
                self.render = None;
                match outcome {
                    RenderOutcome::Completed(frame) => {
                        if let Some(pages) = self.pages.as_mut() {
                            pages.displayed_page = Some(page);
                            pages.frame = Some(frame);
                        }
                        Some(DocumentChange::Rendered(frame))
                    }
                    RenderOutcome::Cancelled => Some(DocumentChange::RenderCancelled { page }),
                    RenderOutcome::Failed(reason) => {
                        error!("Failed to render page {}: {}", page, reason);
                        Some(DocumentChange::RenderFailed { page, reason })
                    }
                }
            }
            DocumentEvent::ResizeSettled { id } => {
                if !self.resize.settle(id) {
                    return None;
                }
                let current = self.pages.as_ref().map(|p| p.current_page)?;
                Some(DocumentChange::ResizeSettled {
                    rendering: self.render(current),
                })
            }
        }
    }

    fn install(&mut self, load_id: u64, document: Arc<dyn Document>) -> DocumentChange {
        let page_count = document.page_count();
        if page_count == 0 {
            return DocumentChange::LoadFailed {
                load_id,
                error: DecodeError::NoPages,
            };
        }

        info!("Loaded document {} with {} pages", load_id, page_count);
        self.document = Some(document);
        self.pages = Some(PageState::new(page_count));
        self.render(1);
        DocumentChange::Loaded {
            load_id,
            page_count,
        }
    }

    fn cancel_decode(&mut self) {
        if let Some(task) = self.decode.take() {
            debug!("Cancelling decode {}", task.id);
            task.token.cancel();
        }
    }

    fn cancel_render(&mut self) {
        if let Some(task) = self.render.take() {
            debug!("Cancelling render {}", task.id);
            task.token.cancel();
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_task_id += 1;
        self.next_task_id
    }
}

impl std::fmt::Debug for PageController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageController")
            .field("document", &self.document)
            .field("pages", &self.pages)
            .field("container", &self.container)
            .field("decode", &self.decode)
            .field("render", &self.render)
            .finish_non_exhaustive()
    }
}
