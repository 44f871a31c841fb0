//! Fakes for exercising the viewer without a real PDF engine

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::host::Surface;
use crate::pdf::{
    DocumentEngine, ImageData, PageSize, PdfDocument, PdfPage, SourceLoader, Viewport,
    WorkerFault,
};

/// Engine operation, as recorded by [`CallLog`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineCall {
    Open,
    LoadPage(usize),
    Render(usize),
    Close,
}

/// Shared record of engine calls, readable from the test thread
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<EngineCall>>>);

impl CallLog {
    fn push(&self, call: EngineCall) {
        self.0
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(call);
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.0
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Page numbers passed to `load_page`, in order
    pub fn loaded_pages(&self) -> Vec<usize> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::LoadPage(page) => Some(page),
                _ => None,
            })
            .collect()
    }

    pub fn rendered_pages(&self) -> Vec<usize> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::Render(page) => Some(page),
                _ => None,
            })
            .collect()
    }
}

/// In-memory engine with uniform pages
#[derive(Clone)]
pub struct FakeEngine {
    page_count: usize,
    page_size: PageSize,
    failing_loads: HashSet<usize>,
    failing_renders: HashSet<usize>,
    fail_open: bool,
    log: CallLog,
}

impl FakeEngine {
    pub fn with_pages(page_count: usize, page_size: PageSize) -> Self {
        Self {
            page_count,
            page_size,
            failing_loads: HashSet::new(),
            failing_renders: HashSet::new(),
            fail_open: false,
            log: CallLog::default(),
        }
    }

    /// `load_page(page)` will fail
    pub fn failing_load(mut self, page: usize) -> Self {
        self.failing_loads.insert(page);
        self
    }

    /// Rasterizing `page` will fail
    pub fn failing_render(mut self, page: usize) -> Self {
        self.failing_renders.insert(page);
        self
    }

    /// Opening any document will fail
    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn call_log(&self) -> CallLog {
        self.log.clone()
    }
}

impl DocumentEngine for FakeEngine {
    type Document = FakeDocument;

    fn open(&mut self, _bytes: Vec<u8>) -> Result<FakeDocument, WorkerFault> {
        if self.fail_open {
            return Err(WorkerFault::generic("malformed document"));
        }
        self.log.push(EngineCall::Open);
        Ok(FakeDocument {
            engine: self.clone(),
        })
    }
}

pub struct FakeDocument {
    engine: FakeEngine,
}

impl PdfDocument for FakeDocument {
    type Page = FakePage;

    fn page_count(&self) -> usize {
        self.engine.page_count
    }

    fn load_page(&self, number: usize) -> Result<FakePage, WorkerFault> {
        self.engine.log.push(EngineCall::LoadPage(number));
        if self.engine.failing_loads.contains(&number) {
            return Err(WorkerFault::generic(format!("page {number} is corrupt")));
        }
        Ok(FakePage {
            number,
            size: self.engine.page_size,
            fail_render: self.engine.failing_renders.contains(&number),
            log: self.engine.log.clone(),
        })
    }
}

impl Drop for FakeDocument {
    fn drop(&mut self) {
        self.engine.log.push(EngineCall::Close);
    }
}

pub struct FakePage {
    number: usize,
    size: PageSize,
    fail_render: bool,
    log: CallLog,
}

impl PdfPage for FakePage {
    fn size(&self) -> PageSize {
        self.size
    }

    fn rasterize(&self, viewport: &Viewport) -> Result<ImageData, WorkerFault> {
        self.log.push(EngineCall::Render(self.number));
        if self.fail_render {
            return Err(WorkerFault::generic("rasterizer out of memory"));
        }
        Ok(ImageData::blank(viewport.width, viewport.height))
    }
}

/// Serves a fixed byte string for every source except [`MemoryLoader::MISSING`]
#[derive(Clone, Default)]
pub struct MemoryLoader;

impl MemoryLoader {
    pub const MISSING: &'static str = "missing.pdf";
}

impl SourceLoader for MemoryLoader {
    fn fetch(&self, source: &str) -> Result<Vec<u8>, WorkerFault> {
        if source == Self::MISSING {
            return Err(WorkerFault::fetch(source, "404 Not Found"));
        }
        Ok(b"%PDF-1.7 fake".to_vec())
    }
}

/// Surface that only records what was asked of it
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub resizes: Vec<(u32, u32)>,
    pub draws: Vec<(u32, u32)>,
}

impl Surface for RecordingSurface {
    fn resize(&mut self, width: u32, height: u32) {
        self.resizes.push((width, height));
    }

    fn draw(&mut self, image: &ImageData) {
        self.draws.push((image.width, image.height));
    }
}
