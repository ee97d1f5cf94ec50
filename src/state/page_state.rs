//! Document, page and viewport structures

use serde::{Deserialize, Serialize};

/// Unscaled page size in PDF points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    /// US Letter, used when a document does not say
    pub const LETTER: PageSize = PageSize {
        width: 612.0,
        height: 792.0,
    };
}

/// Space available for the page, in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContainerSize {
    pub width: f64,
    pub height: f64,
}

impl ContainerSize {
    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

impl Default for ContainerSize {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

/// Scaled page placement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub scale: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    /// Largest scale that fits the whole page into the container, aspect preserved
    pub fn fit(page: PageSize, container: ContainerSize) -> Self {
        let scale = (container.width / page.width).min(container.height / page.height);
        Self {
            scale,
            width: page.width * scale,
            height: page.height * scale,
        }
    }
}

/// Output of a completed render: what the drawing surface now shows
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderedFrame {
    pub page: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub scale: f64,
}

impl RenderedFrame {
    pub fn new(page: u32, viewport: Viewport) -> Self {
        Self {
            page,
            canvas_width: viewport.width.floor() as u32,
            canvas_height: viewport.height.floor() as u32,
            scale: viewport.scale,
        }
    }
}

/// Page state of the loaded document, replaced wholesale on every load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageState {
    pub page_count: u32,
    /// Last requested page
    pub current_page: u32,
    /// Last page whose render completed
    pub displayed_page: Option<u32>,
    pub frame: Option<RenderedFrame>,
}

impl PageState {
    pub fn new(page_count: u32) -> Self {
        Self {
            page_count,
            current_page: 1,
            displayed_page: None,
            frame: None,
        }
    }

    pub fn contains(&self, page: u32) -> bool {
        (1..=self.page_count).contains(&page)
    }
}
