//! PDF viewing infrastructure

use std::time::Duration;

mod engine;
#[cfg(feature = "pdf")]
mod mupdf_engine;
mod pipeline;
mod request;
mod service;
pub mod sizer;
mod source;
mod state;
mod types;
mod worker;

pub use engine::{DocumentEngine, PdfDocument, PdfPage};
#[cfg(feature = "pdf")]
pub use mupdf_engine::{MupdfDocument, MupdfEngine, MupdfPage};
pub use pipeline::{RenderJob, RenderPipeline};
pub use request::{RenderRequest, RenderResponse, RequestId, WorkerFault};
pub use service::{PdfViewer, ViewerConfig};
pub use sizer::fit_page;
pub use source::{DefaultSourceLoader, SourceKind, SourceLoader};
pub use state::{Command, Effect, ViewerState};
pub use types::*;
pub use worker::render_worker;

/// Host chrome (toolbar, page controls) reserved below the page, in pixels
pub const DEFAULT_CHROME_HEIGHT: u32 = 172;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Remote documents larger than this are rejected
pub const MAX_DOCUMENT_BYTES: u64 = 256 * 1024 * 1024;
