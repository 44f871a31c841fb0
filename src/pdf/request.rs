//! Render request and response types

use std::sync::Arc;

use super::types::{ImageData, PageInfo, Viewport};

/// Unique identifier for worker requests
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl RequestId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Request sent to the render worker
#[derive(Debug)]
pub enum RenderRequest {
    /// Fetch and open the document
    LoadDocument { id: RequestId, source: String },

    /// Load a page, replacing the current page handle
    LoadPage { id: RequestId, page: usize },

    /// Rasterize a page at the given viewport
    Render {
        id: RequestId,
        page: usize,
        viewport: Viewport,
    },

    /// Drop the document and page handles
    CloseDocument,

    /// Shutdown the worker
    Shutdown,
}

/// Errors from the render worker
#[derive(Debug, thiserror::Error)]
pub enum WorkerFault {
    #[cfg(feature = "pdf")]
    #[error("PDF engine: {0}")]
    Pdf(#[from] mupdf::error::Error),

    #[error("fetching {source_name}: {detail}")]
    Fetch { source_name: String, detail: String },

    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("page {page} is out of range (document has {count} pages)")]
    PageOutOfRange { page: usize, count: usize },

    #[error("no document is open")]
    NoDocument,

    #[error("{detail}")]
    Generic { detail: String },
}

impl WorkerFault {
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic { detail: msg.into() }
    }

    pub fn fetch(source: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Fetch {
            source_name: source.into(),
            detail: detail.into(),
        }
    }
}

/// Response from the render worker
#[derive(Debug)]
pub enum RenderResponse {
    /// Document opened
    DocumentLoaded { id: RequestId, page_count: usize },

    /// Page handle loaded
    PageLoaded { id: RequestId, page: PageInfo },

    /// Page rasterized
    Rendered {
        id: RequestId,
        page: usize,
        image: Arc<ImageData>,
    },

    /// Error while serving a request
    Error { id: RequestId, error: WorkerFault },
}

impl RenderResponse {
    #[must_use]
    pub fn id(&self) -> RequestId {
        match self {
            Self::DocumentLoaded { id, .. }
            | Self::PageLoaded { id, .. }
            | Self::Rendered { id, .. }
            | Self::Error { id, .. } => *id,
        }
    }
}
