//! Document engine abstraction
//!
//! The viewer never parses or rasterizes PDF data itself. An engine opens a
//! document from raw bytes, hands out page handles, and rasterizes a page at a
//! requested viewport. Engines run on the render worker thread, so only the
//! engine value itself has to be `Send`; documents and pages stay on that
//! thread.

use super::request::WorkerFault;
use super::types::{ImageData, PageSize, Viewport};

/// Opens documents. Moved into the render worker at viewer construction.
pub trait DocumentEngine: Send + 'static {
    type Document: PdfDocument;

    fn open(&mut self, bytes: Vec<u8>) -> Result<Self::Document, WorkerFault>;
}

/// An open document
pub trait PdfDocument {
    type Page: PdfPage;

    fn page_count(&self) -> usize;

    /// Load a page by 1-indexed number
    fn load_page(&self, number: usize) -> Result<Self::Page, WorkerFault>;

    /// Release decoder resources. Dropping the document has the same effect;
    /// engines override this when closing can fail or needs logging.
    fn close(self)
    where
        Self: Sized,
    {
    }
}

/// A loaded page
pub trait PdfPage {
    /// Unscaled page size
    fn size(&self) -> PageSize;

    fn rasterize(&self, viewport: &Viewport) -> Result<ImageData, WorkerFault>;
}
