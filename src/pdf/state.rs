//! Page request state
//!
//! Tracks the current page, the page count and the single pending-page slot.
//! Navigation that arrives while a page load or render is in flight is parked
//! in the slot, overwriting whatever was parked before, and serviced when the
//! render finishes. At most one load, one render and one pending target exist
//! at any time.

use super::types::{ContainerSize, PageInfo, ViewerStatus};
use crate::host::ViewerEvent;

/// Current page request state for a viewer
#[derive(Clone, Debug)]
pub struct ViewerState {
    /// Current page (1-indexed), the most recently requested page
    pub current_page: usize,

    /// Total page count, 0 until the document has loaded
    pub page_count: usize,

    /// Page to load once the in-flight work completes
    pub pending_page: Option<usize>,

    pub document_loading: bool,
    pub page_loading: bool,
    pub page_rendering: bool,

    /// Set on the first successful page load and never cleared
    pub initial_load_complete: bool,

    /// Page whose handle the worker currently holds
    pub loaded_page: Option<PageInfo>,

    /// Current container size
    pub container: ContainerSize,

    pub status: ViewerStatus,

    /// Re-render after the in-flight render instead of dropping a resize
    pub rerender_missed_resize: bool,

    /// A resize arrived during a render
    pub resize_missed: bool,
}

impl ViewerState {
    #[must_use]
    pub fn new(container: ContainerSize) -> Self {
        Self {
            current_page: 1,
            page_count: 0,
            pending_page: None,
            document_loading: false,
            page_loading: false,
            page_rendering: false,
            initial_load_complete: false,
            loaded_page: None,
            container,
            status: ViewerStatus::Idle,
            rerender_missed_resize: false,
            resize_missed: false,
        }
    }

    /// Nothing is loading, rendering or waiting in the pending slot
    #[must_use]
    pub fn is_idle(&self) -> bool {
        !self.document_loading
            && !self.page_loading
            && !self.page_rendering
            && self.pending_page.is_none()
    }

    fn is_busy(&self) -> bool {
        self.page_loading || self.page_rendering
    }

    fn clamp_page(&self, page: usize) -> usize {
        page.clamp(1, self.page_count.max(1))
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        if self.status.is_shut_down() {
            return vec![];
        }

        match cmd {
            Command::Open => {
                if self.status != ViewerStatus::Idle {
                    return vec![];
                }
                self.status = ViewerStatus::Loading;
                self.document_loading = true;
                vec![
                    Effect::Emit(ViewerEvent::LoadingStarted),
                    Effect::LoadDocument,
                ]
            }

            Command::DocumentLoaded { page_count } => {
                self.document_loading = false;
                if page_count == 0 {
                    return self.fail("document has no pages".to_string());
                }
                self.page_count = page_count;
                self.current_page = self.clamp_page(self.current_page);
                self.start_load(self.current_page)
            }

            Command::DocumentFailed(message) => {
                self.document_loading = false;
                self.fail(message)
            }

            Command::RequestPage(page) => self.request_page(page),

            Command::NextPage => {
                if self.page_count == 0 || self.current_page >= self.page_count {
                    return vec![];
                }
                self.request_page(self.current_page + 1)
            }

            Command::PrevPage => {
                if self.page_count == 0 || self.current_page <= 1 {
                    return vec![];
                }
                self.request_page(self.current_page - 1)
            }

            Command::PageLoaded(page) => {
                self.page_loading = false;
                self.loaded_page = Some(page);

                let mut effects = vec![];
                if !self.initial_load_complete {
                    self.initial_load_complete = true;
                    self.status = ViewerStatus::Ready;
                    effects.push(Effect::Emit(ViewerEvent::LoadingComplete));
                }
                effects.extend(self.start_render());
                effects
            }

            Command::PageLoadFailed { page, message } => {
                self.page_loading = false;
                let mut effects = vec![Effect::Emit(ViewerEvent::PageFailed {
                    page,
                    message: message.clone(),
                })];
                if !self.initial_load_complete && self.pending_page.is_none() {
                    effects.extend(self.fail(message));
                    return effects;
                }
                effects.extend(self.drain_pending());
                effects
            }

            Command::RenderFinished => {
                self.page_rendering = false;
                self.drain_pending()
            }

            Command::RenderFailed { page, message } => {
                self.page_rendering = false;
                let mut effects = vec![Effect::Emit(ViewerEvent::PageFailed { page, message })];
                effects.extend(self.drain_pending());
                effects
            }

            Command::Resize(container) => {
                if self.container == container {
                    return vec![];
                }
                self.container = container;

                if self.loaded_page.is_none() || self.page_loading {
                    // the render that follows the load picks up the new size
                    vec![]
                } else if self.page_rendering {
                    if self.rerender_missed_resize {
                        self.resize_missed = true;
                    }
                    vec![]
                } else {
                    self.start_render()
                }
            }

            Command::CloseDocument => {
                if matches!(self.status, ViewerStatus::Closed) {
                    return vec![];
                }
                self.release();
                self.status = ViewerStatus::Closed;
                vec![Effect::CloseDocument]
            }

            Command::Shutdown => {
                self.release();
                self.status = ViewerStatus::ShutDown;
                vec![Effect::DetachListeners, Effect::StopWorker]
            }
        }
    }

    fn request_page(&mut self, page: usize) -> Vec<Effect> {
        // a failed viewer stays failed
        if self.page_count == 0 || matches!(self.status, ViewerStatus::Failed(_)) {
            return vec![];
        }

        let page = self.clamp_page(page);
        self.current_page = page;

        if self.is_busy() {
            self.pending_page = Some(page);
            vec![]
        } else {
            self.start_load(page)
        }
    }

    fn start_load(&mut self, page: usize) -> Vec<Effect> {
        self.page_loading = true;
        vec![Effect::LoadPage(page)]
    }

    fn start_render(&mut self) -> Vec<Effect> {
        let Some(page) = self.loaded_page else {
            return vec![];
        };
        self.page_rendering = true;
        self.resize_missed = false;
        vec![Effect::Render {
            page,
            container: self.container,
        }]
    }

    fn drain_pending(&mut self) -> Vec<Effect> {
        if let Some(page) = self.pending_page.take() {
            self.resize_missed = false;
            self.start_load(page)
        } else if self.resize_missed && !self.is_busy() {
            self.start_render()
        } else {
            vec![]
        }
    }

    fn fail(&mut self, message: String) -> Vec<Effect> {
        self.status = ViewerStatus::Failed(message.clone());
        vec![Effect::Emit(ViewerEvent::LoadFailed { message })]
    }

    fn release(&mut self) {
        self.page_count = 0;
        self.pending_page = None;
        self.loaded_page = None;
        self.document_loading = false;
        self.page_loading = false;
        self.page_rendering = false;
        self.resize_missed = false;
    }
}

/// Commands that modify viewer state
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Start loading the document
    Open,
    /// The document opened
    DocumentLoaded { page_count: usize },
    /// The document could not be opened
    DocumentFailed(String),
    /// Jump to a page, clamped into range
    RequestPage(usize),
    NextPage,
    PrevPage,
    /// A page handle finished loading
    PageLoaded(PageInfo),
    /// A page handle could not be loaded
    PageLoadFailed { page: usize, message: String },
    /// The in-flight render completed
    RenderFinished,
    /// The in-flight render failed
    RenderFailed { page: usize, message: String },
    /// The container changed size
    Resize(ContainerSize),
    /// Release the document handle
    CloseDocument,
    /// Tear the viewer down
    Shutdown,
}

/// Effects produced by state changes
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Notify host subscribers
    Emit(ViewerEvent),
    /// Fetch and open the document
    LoadDocument,
    /// Load a page handle
    LoadPage(usize),
    /// Render the loaded page at the container size
    Render {
        page: PageInfo,
        container: ContainerSize,
    },
    /// Drop the document handle
    CloseDocument,
    /// Unregister host listeners
    DetachListeners,
    /// Stop the render worker
    StopWorker,
}
