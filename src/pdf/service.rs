//! Viewer service - drives the page request state against the render worker

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossterm::event::KeyEvent;
use flume::{Receiver, Sender};
use log::{debug, error, info, warn};

use super::engine::DocumentEngine;
use super::pipeline::RenderPipeline;
use super::request::{RenderRequest, RenderResponse, RequestId};
use super::source::SourceLoader;
use super::state::{Command, Effect, ViewerState};
use super::types::{ContainerSize, ViewerStatus};
use super::worker::render_worker;
use super::DEFAULT_CHROME_HEIGHT;
use crate::host::{ListenerId, ResizeNotifier, Surface, ViewerEvent};
use crate::inputs::{InputOutcome, KeyDisposition, NavKey, PageNumberInput, is_press};

/// Layout and policy knobs for a viewer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewerConfig {
    /// Pixels of host chrome subtracted from the container height
    pub chrome_height: u32,
    /// Re-render once after an in-flight render if a resize arrived meanwhile
    pub rerender_missed_resize: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            chrome_height: DEFAULT_CHROME_HEIGHT,
            rerender_missed_resize: false,
        }
    }
}

#[derive(Debug)]
enum PendingRequest {
    Document,
    Page(usize),
    Render(usize),
}

/// A PDF viewer instance.
///
/// Construction spawns the render worker and registers a resize listener;
/// nothing is loaded until [`PdfViewer::open`]. The host must call
/// [`PdfViewer::pump`] from its event loop to deliver completions.
pub struct PdfViewer<S: Surface> {
    state: ViewerState,
    pipeline: RenderPipeline<S>,
    source: String,
    request_tx: Sender<RenderRequest>,
    response_rx: Receiver<RenderResponse>,
    resize_rx: Receiver<ContainerSize>,
    resize_notifier: Arc<dyn ResizeNotifier>,
    resize_listener: Option<ListenerId>,
    subscribers: Vec<Sender<ViewerEvent>>,
    next_request_id: u64,
    pending_requests: HashMap<RequestId, PendingRequest>,
    page_input: PageNumberInput,
    worker: Option<JoinHandle<()>>,
}

impl<S: Surface> PdfViewer<S> {
    /// Create a viewer for `source`, rendering into `surface`
    pub fn new<E: DocumentEngine, L: SourceLoader>(
        engine: E,
        loader: L,
        surface: S,
        resize_notifier: Arc<dyn ResizeNotifier>,
        source: impl Into<String>,
        container: ContainerSize,
        config: ViewerConfig,
    ) -> Self {
        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();
        let worker = std::thread::spawn(move || {
            render_worker(engine, loader, request_rx, response_tx);
        });

        let (resize_tx, resize_rx) = flume::unbounded();
        let resize_listener = resize_notifier.register(Box::new(move |size| {
            let _ = resize_tx.send(size);
        }));

        let mut state = ViewerState::new(container);
        state.rerender_missed_resize = config.rerender_missed_resize;

        Self {
            page_input: PageNumberInput::new(state.current_page),
            state,
            pipeline: RenderPipeline::new(surface, config.chrome_height),
            source: source.into(),
            request_tx,
            response_rx,
            resize_rx,
            resize_notifier,
            resize_listener: Some(resize_listener),
            subscribers: Vec::new(),
            next_request_id: 1,
            pending_requests: HashMap::new(),
            worker: Some(worker),
        }
    }

    /// Receive viewer events. Each subscriber gets every event emitted after
    /// it subscribed.
    pub fn subscribe(&mut self) -> Receiver<ViewerEvent> {
        let (tx, rx) = flume::unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Start loading the document. Only the first call has an effect.
    pub fn open(&mut self) {
        info!("Opening {}", self.source);
        self.apply_command(Command::Open);
    }

    /// Go to `page`, clamped into the document's range
    pub fn request_page(&mut self, page: usize) {
        self.apply_command(Command::RequestPage(page));
    }

    pub fn next_page(&mut self) {
        self.apply_command(Command::NextPage);
    }

    pub fn prev_page(&mut self) {
        self.apply_command(Command::PrevPage);
    }

    /// Report a new container size directly instead of through the notifier
    pub fn resize(&mut self, container: ContainerSize) {
        self.apply_command(Command::Resize(container));
    }

    /// Release the document without tearing the viewer down
    pub fn close_document(&mut self) {
        self.apply_command(Command::CloseDocument);
    }

    /// Tear down: detach listeners and tell the worker to release the
    /// document and exit. Returns without waiting for the worker; see
    /// [`PdfViewer::join_worker`]. Idempotent; also runs on drop.
    pub fn shutdown(&mut self) {
        if self.state.status.is_shut_down() {
            return;
        }
        info!("Shutting down viewer for {}", self.source);
        self.apply_command(Command::Shutdown);
    }

    /// Block until the render worker has exited after [`PdfViewer::shutdown`].
    /// Returns `false` if the viewer is still running or the worker panicked.
    pub fn join_worker(&mut self) -> bool {
        if !self.state.status.is_shut_down() {
            return false;
        }
        match self.worker.take() {
            Some(worker) => {
                let joined = worker.join().is_ok();
                if !joined {
                    error!("Render worker panicked");
                }
                joined
            }
            None => true,
        }
    }

    /// Arrow-key navigation
    pub fn handle_key(&mut self, key: &KeyEvent) -> KeyDisposition {
        if self.state.status.is_shut_down() {
            return KeyDisposition::Ignored;
        }
        match NavKey::from_event(key) {
            Some(NavKey::Prev) => self.prev_page(),
            Some(NavKey::Next) => self.next_page(),
            None => return KeyDisposition::Ignored,
        }
        KeyDisposition::Consumed
    }

    /// Keys aimed at the page-number input
    pub fn handle_page_input_key(&mut self, key: &KeyEvent) -> KeyDisposition {
        if self.state.status.is_shut_down() || !is_press(key) {
            return KeyDisposition::Ignored;
        }
        match self.page_input.handle_key(key) {
            InputOutcome::Ignored => KeyDisposition::Ignored,
            InputOutcome::Edited | InputOutcome::Cancelled => KeyDisposition::Consumed,
            InputOutcome::Submit(page) => {
                self.request_page(page);
                // a clamped or ignored request still re-syncs the text
                self.page_input.sync(self.state.current_page);
                KeyDisposition::Consumed
            }
        }
    }

    /// Deliver pending resizes and worker completions. Returns the number of
    /// messages processed.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;

        let mut latest = None;
        while let Ok(size) = self.resize_rx.try_recv() {
            latest = Some(size);
            handled += 1;
        }
        if let Some(size) = latest {
            self.apply_command(Command::Resize(size));
        }

        while let Ok(response) = self.response_rx.try_recv() {
            self.handle_response(response);
            handled += 1;
        }

        handled
    }

    /// Pump until idle or until `timeout` elapses. Returns whether the viewer
    /// went idle.
    pub fn settle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.pump();
            if self.state.is_idle() {
                return true;
            }
            if self.pending_requests.is_empty() {
                warn!("Viewer busy with no outstanding worker requests");
                return false;
            }

            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return false;
            };
            match self.response_rx.recv_timeout(remaining) {
                Ok(response) => self.handle_response(response),
                Err(_) => return self.state.is_idle(),
            }
        }
    }

    #[must_use]
    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    #[must_use]
    pub fn status(&self) -> &ViewerStatus {
        &self.state.status
    }

    #[must_use]
    pub fn current_page(&self) -> usize {
        self.state.current_page
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.state.page_count
    }

    #[must_use]
    pub fn page_input(&self) -> &PageNumberInput {
        &self.page_input
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        self.pipeline.surface()
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    fn apply_command(&mut self, cmd: Command) {
        let mut queue = VecDeque::from([cmd]);
        while let Some(cmd) = queue.pop_front() {
            debug!("Applying {cmd:?}");
            for effect in self.state.apply(cmd) {
                if let Some(follow_up) = self.execute_effect(effect) {
                    queue.push_back(follow_up);
                }
            }
        }
        self.page_input.sync(self.state.current_page);
    }

    fn execute_effect(&mut self, effect: Effect) -> Option<Command> {
        match effect {
            Effect::Emit(event) => {
                self.emit(event);
                None
            }

            Effect::LoadDocument => {
                let id = self.next_id();
                let request = RenderRequest::LoadDocument {
                    id,
                    source: self.source.clone(),
                };
                self.send(id, request, PendingRequest::Document)
            }

            Effect::LoadPage(page) => {
                let id = self.next_id();
                self.send(id, RenderRequest::LoadPage { id, page }, PendingRequest::Page(page))
            }

            Effect::Render { page, container } => {
                let Some(job) = self.pipeline.begin(&page, container) else {
                    return Some(Command::RenderFinished);
                };
                let id = self.next_id();
                let request = RenderRequest::Render {
                    id,
                    page: job.page,
                    viewport: job.viewport,
                };
                self.send(id, request, PendingRequest::Render(job.page))
            }

            Effect::CloseDocument => {
                self.pending_requests.clear();
                let _ = self.request_tx.send(RenderRequest::CloseDocument);
                None
            }

            Effect::DetachListeners => {
                if let Some(id) = self.resize_listener.take() {
                    self.resize_notifier.unregister(id);
                }
                while self.resize_rx.try_recv().is_ok() {}
                None
            }

            Effect::StopWorker => {
                // the worker closes the document and exits once it reaches
                // this; an in-flight fetch or render is not waited for
                self.pending_requests.clear();
                let _ = self.request_tx.send(RenderRequest::Shutdown);
                None
            }
        }
    }

    /// Send a request; a dead worker turns into an immediate failure so the
    /// state never waits on a completion that cannot arrive.
    fn send(
        &mut self,
        id: RequestId,
        request: RenderRequest,
        pending: PendingRequest,
    ) -> Option<Command> {
        if self.request_tx.send(request).is_ok() {
            self.pending_requests.insert(id, pending);
            return None;
        }

        error!("Render worker is gone; failing {pending:?}");
        Some(failure_command(pending, "render worker is not running".to_string()))
    }

    fn handle_response(&mut self, response: RenderResponse) {
        let Some(pending) = self.pending_requests.remove(&response.id()) else {
            debug!("Dropping stale response {:?}", response.id());
            return;
        };

        let cmd = match response {
            RenderResponse::DocumentLoaded { page_count, .. } => {
                Command::DocumentLoaded { page_count }
            }
            RenderResponse::PageLoaded { page, .. } => Command::PageLoaded(page),
            RenderResponse::Rendered { page, image, .. } => {
                self.pipeline.complete(&image);
                self.emit(ViewerEvent::PageRendered {
                    page,
                    width: image.width,
                    height: image.height,
                });
                Command::RenderFinished
            }
            RenderResponse::Error { error, .. } => failure_command(pending, error.to_string()),
        };

        self.apply_command(cmd);
    }

    fn emit(&mut self, event: ViewerEvent) {
        debug!("Emitting {event:?}");
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn next_id(&mut self) -> RequestId {
        let id = RequestId::new(self.next_request_id);
        self.next_request_id += 1;
        id
    }
}

fn failure_command(pending: PendingRequest, message: String) -> Command {
    match pending {
        PendingRequest::Document => Command::DocumentFailed(message),
        PendingRequest::Page(page) => Command::PageLoadFailed { page, message },
        PendingRequest::Render(page) => Command::RenderFailed { page, message },
    }
}

impl<S: Surface> Drop for PdfViewer<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
