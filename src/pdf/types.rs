//! Core types for PDF rendering

/// Intrinsic page dimensions in PDF points
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Width over height, `None` for degenerate pages
    #[must_use]
    pub fn aspect(self) -> Option<f32> {
        if self.width > 0.0 && self.height > 0.0 {
            Some(self.width / self.height)
        } else {
            None
        }
    }
}

/// Space available to the viewer, in surface pixels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContainerSize {
    pub width: u32,
    pub height: u32,
}

impl ContainerSize {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Scale and pixel dimensions a page is rasterized at
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub scale: f32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Descriptor of the page the worker currently holds
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageInfo {
    /// Page number (1-indexed)
    pub number: usize,
    /// Unscaled page size
    pub size: PageSize,
}

/// Raw rasterized page.
///
/// RGB pixel data, 3 bytes per pixel, rows packed without padding.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageData {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl ImageData {
    /// A blank (white) image of the given size
    #[must_use]
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            pixels: vec![0xFF; width as usize * height as usize * 3],
            width,
            height,
        }
    }

    /// RGB triple at `(x, y)`, `None` outside the image
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<(u8, u8, u8)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 3;
        let px = self.pixels.get(offset..offset + 3)?;
        Some((px[0], px[1], px[2]))
    }
}

impl std::fmt::Debug for ImageData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageData")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Lifecycle of a viewer as seen by the host
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ViewerStatus {
    /// Constructed, document not requested yet
    #[default]
    Idle,
    /// Document or first page is loading
    Loading,
    /// At least one page has loaded
    Ready,
    /// Document could not be shown
    Failed(String),
    /// Document handle released, viewer still alive
    Closed,
    /// Torn down; all input is ignored
    ShutDown,
}

impl ViewerStatus {
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        matches!(self, Self::ShutDown)
    }
}
