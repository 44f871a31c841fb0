//! PDF render worker - runs in a separate thread
//!
//! Owns the engine, the open document and the current page handle. Requests
//! are served strictly in order, one at a time.

use std::sync::Arc;

use flume::{Receiver, Sender};
use log::{debug, error, info, warn};

use super::engine::{DocumentEngine, PdfDocument, PdfPage};
use super::request::{RenderRequest, RenderResponse, WorkerFault};
use super::source::SourceLoader;
use super::types::{ImageData, PageInfo, Viewport};

type DocOf<E> = <E as DocumentEngine>::Document;
type PageOf<E> = <DocOf<E> as PdfDocument>::Page;

struct WorkerState<E: DocumentEngine> {
    doc: Option<DocOf<E>>,
    /// Current page handle and its 1-indexed number
    page: Option<(usize, PageOf<E>)>,
}

impl<E: DocumentEngine> WorkerState<E> {
    fn close(&mut self) {
        self.page = None;
        if let Some(doc) = self.doc.take() {
            doc.close();
            info!("Document closed");
        }
    }
}

pub fn render_worker<E: DocumentEngine, L: SourceLoader>(
    mut engine: E,
    loader: L,
    requests: Receiver<RenderRequest>,
    responses: Sender<RenderResponse>,
) {
    let mut state = WorkerState::<E> {
        doc: None,
        page: None,
    };

    for request in requests {
        match request {
            RenderRequest::LoadDocument { id, source } => {
                state.close();
                let response = match open_document(&mut engine, &loader, &source) {
                    Ok(doc) => {
                        let page_count = doc.page_count();
                        info!("Opened {source} ({page_count} pages)");
                        state.doc = Some(doc);
                        RenderResponse::DocumentLoaded { id, page_count }
                    }
                    Err(error) => {
                        error!("Failed to open {source}: {error}");
                        RenderResponse::Error { id, error }
                    }
                };
                let _ = responses.send(response);
            }

            RenderRequest::LoadPage { id, page } => {
                let response = match load_page::<E>(&mut state, page) {
                    Ok(info) => RenderResponse::PageLoaded { id, page: info },
                    Err(error) => {
                        warn!("Failed to load page {page}: {error}");
                        RenderResponse::Error { id, error }
                    }
                };
                let _ = responses.send(response);
            }

            RenderRequest::Render { id, page, viewport } => {
                let response = match rasterize::<E>(&mut state, page, &viewport) {
                    Ok(image) => RenderResponse::Rendered {
                        id,
                        page,
                        image: Arc::new(image),
                    },
                    Err(error) => {
                        warn!("Failed to render page {page}: {error}");
                        RenderResponse::Error { id, error }
                    }
                };
                let _ = responses.send(response);
            }

            RenderRequest::CloseDocument => state.close(),

            RenderRequest::Shutdown => break,
        }
    }

    state.close();
    debug!("Render worker exiting");
}

fn open_document<E: DocumentEngine, L: SourceLoader>(
    engine: &mut E,
    loader: &L,
    source: &str,
) -> Result<E::Document, WorkerFault> {
    let bytes = loader.fetch(source)?;
    debug!("Fetched {} bytes from {source}", bytes.len());
    engine.open(bytes)
}

fn load_page<E: DocumentEngine>(
    state: &mut WorkerState<E>,
    number: usize,
) -> Result<PageInfo, WorkerFault> {
    let doc = state.doc.as_ref().ok_or(WorkerFault::NoDocument)?;
    let count = doc.page_count();
    if number == 0 || number > count {
        return Err(WorkerFault::PageOutOfRange {
            page: number,
            count,
        });
    }

    // previous handle is released before the new one is loaded
    state.page = None;
    let page = doc.load_page(number)?;
    let info = PageInfo {
        number,
        size: page.size(),
    };
    state.page = Some((number, page));
    Ok(info)
}

fn rasterize<E: DocumentEngine>(
    state: &mut WorkerState<E>,
    number: usize,
    viewport: &Viewport,
) -> Result<ImageData, WorkerFault> {
    if state.page.as_ref().map(|(current, _)| *current) != Some(number) {
        load_page::<E>(state, number)?;
    }

    let (_, page) = state.page.as_ref().ok_or(WorkerFault::NoDocument)?;
    page.rasterize(viewport)
}
