//! Half-block pixel surface for terminal hosts
//!
//! Each terminal cell shows two vertically stacked pixels: the upper one as
//! the foreground of `▀`, the lower one as its background.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::widgets::Widget;

use crate::host::Surface;
use crate::pdf::{ContainerSize, ImageData};

const UPPER_HALF_BLOCK: &str = "▀";

/// RGB pixel buffer the viewer renders into
#[derive(Debug, Default)]
pub struct PixelCanvas {
    image: Option<ImageData>,
}

impl PixelCanvas {
    #[must_use]
    pub fn image(&self) -> Option<&ImageData> {
        self.image.as_ref()
    }

    /// Pixel size of a terminal area
    #[must_use]
    pub fn container_for(area: Rect) -> ContainerSize {
        ContainerSize::new(u32::from(area.width), u32::from(area.height) * 2)
    }
}

impl Surface for PixelCanvas {
    fn resize(&mut self, width: u32, height: u32) {
        self.image = Some(ImageData::blank(width, height));
    }

    fn draw(&mut self, image: &ImageData) {
        let Some(target) = self.image.as_mut() else {
            self.image = Some(image.clone());
            return;
        };
        if target.width == image.width && target.height == image.height {
            target.pixels.copy_from_slice(&image.pixels);
            return;
        }

        // engine rounding can differ from the sized surface by a pixel
        let width = target.width.min(image.width) as usize;
        let height = target.height.min(image.height) as usize;
        let target_stride = target.width as usize * 3;
        let image_stride = image.width as usize * 3;
        for y in 0..height {
            let dst = y * target_stride;
            let src = y * image_stride;
            target.pixels[dst..dst + width * 3]
                .copy_from_slice(&image.pixels[src..src + width * 3]);
        }
    }
}

/// Renders a [`PixelCanvas`] centered horizontally in the area
pub struct HalfBlockView<'a> {
    canvas: &'a PixelCanvas,
}

impl<'a> HalfBlockView<'a> {
    #[must_use]
    pub fn new(canvas: &'a PixelCanvas) -> Self {
        Self { canvas }
    }
}

impl Widget for HalfBlockView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(image) = self.canvas.image() else {
            return;
        };

        let cols = u16::try_from(image.width).unwrap_or(u16::MAX).min(area.width);
        let rows = u16::try_from(image.height.div_ceil(2))
            .unwrap_or(u16::MAX)
            .min(area.height);
        let left = area.x + (area.width - cols) / 2;

        for row in 0..rows {
            for col in 0..cols {
                let x = u32::from(col);
                let y = u32::from(row) * 2;
                let upper = image.pixel(x, y).map_or(Color::Reset, rgb);
                let lower = image.pixel(x, y + 1).map_or(Color::Reset, rgb);

                if let Some(cell) = buf.cell_mut((left + col, area.y + row)) {
                    cell.set_symbol(UPPER_HALF_BLOCK).set_fg(upper).set_bg(lower);
                }
            }
        }
    }
}

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(r, g, b)
}
