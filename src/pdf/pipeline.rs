//! Render pipeline - sizes the surface and hands rasterized pages to it

use log::debug;

use super::sizer::fit_page;
use super::types::{ContainerSize, ImageData, PageInfo, Viewport};
use crate::host::Surface;

/// Work the render worker has to do for one render
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderJob {
    pub page: usize,
    pub viewport: Viewport,
}

/// Owns the drawing surface and the layout parameters used to size it
pub struct RenderPipeline<S> {
    surface: S,
    chrome_height: u32,
}

impl<S: Surface> RenderPipeline<S> {
    #[must_use]
    pub fn new(surface: S, chrome_height: u32) -> Self {
        Self {
            surface,
            chrome_height,
        }
    }

    /// Size the surface for `page` and describe the rasterization to run.
    ///
    /// Returns `None` when the page would not be visible at all; the caller
    /// treats that render as already finished.
    pub fn begin(&mut self, page: &PageInfo, container: ContainerSize) -> Option<RenderJob> {
        let viewport = fit_page(page.size, container, self.chrome_height);
        if viewport.is_empty() {
            debug!(
                "Skipping render of page {}: empty viewport for {container:?}",
                page.number
            );
            return None;
        }

        self.surface.resize(viewport.width, viewport.height);
        Some(RenderJob {
            page: page.number,
            viewport,
        })
    }

    /// Draw a finished rasterization
    pub fn complete(&mut self, image: &ImageData) {
        self.surface.draw(image);
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }
}
