//! Viewport sizing
//!
//! Fits a page into the container: as wide as the container allows, unless
//! the implied height would exceed the height budget (container height minus
//! the host's fixed chrome). Aspect ratio is always preserved.

use super::types::{ContainerSize, PageSize, Viewport};

/// Compute the viewport for `page` inside `container`.
///
/// `chrome_height` is subtracted from the container height to form the height
/// budget. When the budget is empty, only the width constraint applies.
#[must_use]
pub fn fit_page(page: PageSize, container: ContainerSize, chrome_height: u32) -> Viewport {
    let max_width = container.width as f32;
    let max_height = container.height as f32 - chrome_height as f32;

    let desired_width = desired_width(page, max_width, max_height);
    let scale = if page.width > 0.0 {
        desired_width / page.width
    } else {
        0.0
    };

    Viewport {
        scale,
        width: (page.width * scale).max(0.0).floor() as u32,
        height: (page.height * scale).max(0.0).floor() as u32,
    }
}

fn desired_width(page: PageSize, max_width: f32, max_height: f32) -> f32 {
    let Some(pdf_aspect) = page.aspect() else {
        return max_width;
    };
    if max_height <= 0.0 {
        return max_width;
    }

    let max_aspect = max_width / max_height;
    if !max_aspect.is_finite() || max_aspect <= 0.0 {
        return max_width;
    }

    max_width.min(max_width * (pdf_aspect / max_aspect))
}
