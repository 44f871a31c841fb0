//! MuPDF-backed document engine

use mupdf::{Colorspace, Document, Matrix, Page, Pixmap};

use super::engine::{DocumentEngine, PdfDocument, PdfPage};
use super::request::WorkerFault;
use super::types::{ImageData, PageSize, Viewport};

const PDF_MIME: &str = "application/pdf";

#[derive(Clone, Copy, Debug, Default)]
pub struct MupdfEngine;

impl DocumentEngine for MupdfEngine {
    type Document = MupdfDocument;

    fn open(&mut self, bytes: Vec<u8>) -> Result<MupdfDocument, WorkerFault> {
        let doc = Document::from_bytes(&bytes, PDF_MIME)?;
        let page_count = doc.page_count()?;
        Ok(MupdfDocument {
            doc,
            page_count: usize::try_from(page_count).unwrap_or(0),
        })
    }
}

pub struct MupdfDocument {
    doc: Document,
    page_count: usize,
}

impl PdfDocument for MupdfDocument {
    type Page = MupdfPage;

    fn page_count(&self) -> usize {
        self.page_count
    }

    fn load_page(&self, number: usize) -> Result<MupdfPage, WorkerFault> {
        let index = number
            .checked_sub(1)
            .and_then(|i| i32::try_from(i).ok())
            .ok_or(WorkerFault::PageOutOfRange {
                page: number,
                count: self.page_count,
            })?;

        let page = self.doc.load_page(index)?;
        let bounds = page.bounds()?;
        Ok(MupdfPage {
            page,
            size: PageSize::new(bounds.x1 - bounds.x0, bounds.y1 - bounds.y0),
        })
    }
}

pub struct MupdfPage {
    page: Page,
    size: PageSize,
}

impl PdfPage for MupdfPage {
    fn size(&self) -> PageSize {
        self.size
    }

    fn rasterize(&self, viewport: &Viewport) -> Result<ImageData, WorkerFault> {
        let transform = Matrix::new_scale(viewport.scale, viewport.scale);
        let rgb = Colorspace::device_rgb();
        let pixmap = self.page.to_pixmap(&transform, &rgb, false, false)?;

        Ok(ImageData {
            pixels: pixmap_to_rgb(&pixmap)?,
            width: pixmap.width(),
            height: pixmap.height(),
        })
    }
}

fn pixmap_to_rgb(pixmap: &Pixmap) -> Result<Vec<u8>, WorkerFault> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(WorkerFault::generic(format!(
            "Unsupported pixmap format: {n} channels"
        )));
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = width * n;
    if samples.len() < stride.saturating_mul(height) || row_bytes > stride {
        return Err(WorkerFault::generic("Pixmap buffer size mismatch"));
    }

    let mut out = Vec::with_capacity(width * height * 3);
    for row in samples.chunks(stride).take(height) {
        let row = &row[..row_bytes];
        if n == 3 {
            out.extend_from_slice(row);
        } else {
            for px in row.chunks_exact(n) {
                out.extend_from_slice(&px[..3]);
            }
        }
    }

    Ok(out)
}
