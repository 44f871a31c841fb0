use std::sync::Arc;
use std::time::{Duration, Instant};

use flume::Receiver;
use pdfpane::event_source::{Event, KeyCode, SimulatedEventSource};
use pdfpane::host::{ResizeHub, ViewerEvent};
use pdfpane::inputs::KeyDisposition;
use pdfpane::pdf::{
    ContainerSize, PageSize, PdfViewer, SourceLoader, ViewerConfig, ViewerStatus, WorkerFault,
};
use pdfpane::test_utils::{EngineCall, FakeEngine, MemoryLoader, RecordingSurface};

const SETTLE: Duration = Duration::from_secs(5);

struct Harness {
    viewer: PdfViewer<RecordingSurface>,
    hub: Arc<ResizeHub>,
    events: Receiver<ViewerEvent>,
}

fn open_viewer(engine: FakeEngine, source: &str, config: ViewerConfig) -> Harness {
    let hub = Arc::new(ResizeHub::new());
    let mut viewer = PdfViewer::new(
        engine,
        MemoryLoader,
        RecordingSurface::default(),
        hub.clone(),
        source,
        ContainerSize::new(900, 472),
        config,
    );
    let events = viewer.subscribe();
    viewer.open();
    Harness { viewer, hub, events }
}

fn letter_engine(pages: usize) -> FakeEngine {
    FakeEngine::with_pages(pages, PageSize::new(600.0, 400.0))
}

fn key(code: KeyCode) -> pdfpane::event_source::KeyEvent {
    match SimulatedEventSource::key(code) {
        Event::Key(key) => key,
        _ => unreachable!(),
    }
}

#[test]
fn initial_load_renders_first_page_and_reports_once() {
    let engine = letter_engine(3);
    let log = engine.call_log();
    let mut h = open_viewer(engine, "doc.pdf", ViewerConfig::default());

    assert!(h.viewer.settle(SETTLE));
    assert_eq!(h.viewer.status(), &ViewerStatus::Ready);
    assert_eq!(h.viewer.page_count(), 3);
    assert_eq!(h.viewer.current_page(), 1);
    assert_eq!(h.viewer.page_input().text(), "1");

    assert_eq!(h.viewer.surface().resizes, vec![(450, 300)]);
    assert_eq!(h.viewer.surface().draws, vec![(450, 300)]);
    assert_eq!(
        log.calls(),
        vec![EngineCall::Open, EngineCall::LoadPage(1), EngineCall::Render(1)]
    );

    let events: Vec<_> = h.events.try_iter().collect();
    assert_eq!(
        events,
        vec![
            ViewerEvent::LoadingStarted,
            ViewerEvent::LoadingComplete,
            ViewerEvent::PageRendered {
                page: 1,
                width: 450,
                height: 300
            },
        ]
    );

    // Later navigation never reports loading again
    h.viewer.next_page();
    assert!(h.viewer.settle(SETTLE));
    let events: Vec<_> = h.events.try_iter().collect();
    assert!(!events.contains(&ViewerEvent::LoadingComplete));
    assert!(!events.contains(&ViewerEvent::LoadingStarted));
}

#[test]
fn rapid_requests_coalesce_to_the_latest_page() {
    let engine = letter_engine(10);
    let log = engine.call_log();
    let mut h = open_viewer(engine, "doc.pdf", ViewerConfig::default());
    assert!(h.viewer.settle(SETTLE));

    h.viewer.request_page(2);
    h.viewer.request_page(3);
    h.viewer.request_page(4);
    assert_eq!(h.viewer.current_page(), 4);
    assert_eq!(h.viewer.page_input().text(), "4");

    assert!(h.viewer.settle(SETTLE));
    assert_eq!(log.loaded_pages(), vec![1, 2, 4]);
    assert_eq!(log.rendered_pages(), vec![1, 2, 4]);
    assert_eq!(h.viewer.current_page(), 4);
}

#[test]
fn navigation_stops_at_document_bounds() {
    let engine = letter_engine(2);
    let log = engine.call_log();
    let mut h = open_viewer(engine, "doc.pdf", ViewerConfig::default());
    assert!(h.viewer.settle(SETTLE));

    h.viewer.prev_page();
    assert!(h.viewer.settle(SETTLE));
    assert_eq!(h.viewer.current_page(), 1);

    h.viewer.next_page();
    h.viewer.next_page();
    assert!(h.viewer.settle(SETTLE));
    assert_eq!(h.viewer.current_page(), 2);
    assert_eq!(log.loaded_pages(), vec![1, 2]);
}

#[test]
fn requests_are_clamped_into_range() {
    let engine = letter_engine(5);
    let log = engine.call_log();
    let mut h = open_viewer(engine, "doc.pdf", ViewerConfig::default());
    assert!(h.viewer.settle(SETTLE));

    h.viewer.request_page(99);
    assert!(h.viewer.settle(SETTLE));
    assert_eq!(h.viewer.current_page(), 5);

    h.viewer.request_page(0);
    assert!(h.viewer.settle(SETTLE));
    assert_eq!(h.viewer.current_page(), 1);
    assert_eq!(log.loaded_pages(), vec![1, 5, 1]);
}

#[test]
fn arrow_keys_and_page_input_navigate() {
    let engine = letter_engine(8);
    let log = engine.call_log();
    let mut h = open_viewer(engine, "doc.pdf", ViewerConfig::default());
    assert!(h.viewer.settle(SETTLE));

    assert_eq!(h.viewer.handle_key(&key(KeyCode::Right)), KeyDisposition::Consumed);
    assert!(h.viewer.settle(SETTLE));
    assert_eq!(h.viewer.current_page(), 2);

    assert_eq!(h.viewer.handle_key(&key(KeyCode::Char('x'))), KeyDisposition::Ignored);

    for code in [KeyCode::Char('7'), KeyCode::Enter] {
        assert_eq!(
            h.viewer.handle_page_input_key(&key(code)),
            KeyDisposition::Consumed
        );
    }
    assert!(h.viewer.settle(SETTLE));
    assert_eq!(h.viewer.current_page(), 7);
    assert_eq!(h.viewer.page_input().text(), "7");

    // Out of range input is clamped and the field shows the real page
    for code in [KeyCode::Char('4'), KeyCode::Char('2'), KeyCode::Enter] {
        h.viewer.handle_page_input_key(&key(code));
    }
    assert!(h.viewer.settle(SETTLE));
    assert_eq!(h.viewer.current_page(), 8);
    assert_eq!(h.viewer.page_input().text(), "8");
    assert_eq!(log.loaded_pages(), vec![1, 2, 7, 8]);
}

#[test]
fn resize_rerenders_current_page_at_new_size() {
    let engine = letter_engine(3);
    let mut h = open_viewer(engine, "doc.pdf", ViewerConfig::default());
    assert!(h.viewer.settle(SETTLE));

    h.hub.notify(ContainerSize::new(600, 1172));
    h.hub.notify(ContainerSize::new(300, 1172));
    h.viewer.pump();
    assert!(h.viewer.settle(SETTLE));

    // only the latest size is applied
    assert_eq!(h.viewer.surface().resizes, vec![(450, 300), (300, 200)]);
    assert_eq!(h.viewer.surface().draws.last(), Some(&(300, 200)));
}

#[test]
fn shutdown_detaches_and_releases() {
    let engine = letter_engine(3);
    let log = engine.call_log();
    let mut h = open_viewer(engine, "doc.pdf", ViewerConfig::default());
    assert!(h.viewer.settle(SETTLE));
    assert_eq!(h.hub.listener_count(), 1);

    h.viewer.shutdown();
    assert_eq!(h.viewer.status(), &ViewerStatus::ShutDown);
    assert_eq!(h.hub.listener_count(), 0);
    assert!(h.viewer.join_worker());
    assert_eq!(log.calls().last(), Some(&EngineCall::Close));

    let draws = h.viewer.surface().draws.len();
    h.hub.notify(ContainerSize::new(1200, 1000));
    h.viewer.pump();
    assert_eq!(h.viewer.surface().draws.len(), draws);

    assert_eq!(h.viewer.handle_key(&key(KeyCode::Right)), KeyDisposition::Ignored);
    h.viewer.request_page(2);
    assert_eq!(h.viewer.current_page(), 1);

    // second call is a no-op
    h.viewer.shutdown();
    assert_eq!(
        log.calls()
            .iter()
            .filter(|call| **call == EngineCall::Close)
            .count(),
        1
    );
}

#[test]
fn shutdown_mid_load_discards_late_work() {
    let engine = letter_engine(3);
    let log = engine.call_log();
    let mut h = open_viewer(engine, "doc.pdf", ViewerConfig::default());

    h.viewer.shutdown();
    assert!(h.viewer.join_worker());
    h.viewer.pump();
    assert_eq!(h.viewer.surface().draws, Vec::<(u32, u32)>::new());
    assert_eq!(h.viewer.status(), &ViewerStatus::ShutDown);
    assert!(!log.calls().contains(&EngineCall::Render(1)));
}

#[test]
fn close_document_keeps_viewer_alive() {
    let engine = letter_engine(3);
    let log = engine.call_log();
    let mut h = open_viewer(engine, "doc.pdf", ViewerConfig::default());
    assert!(h.viewer.settle(SETTLE));

    h.viewer.close_document();
    assert!(h.viewer.settle(SETTLE));
    assert_eq!(h.viewer.status(), &ViewerStatus::Closed);
    assert_eq!(h.viewer.page_count(), 0);
    assert_eq!(h.hub.listener_count(), 1);

    // navigation without a document is ignored
    h.viewer.next_page();
    assert!(h.viewer.settle(SETTLE));
    assert_eq!(log.loaded_pages(), vec![1]);

    h.viewer.shutdown();
    assert!(h.viewer.join_worker());
    assert_eq!(log.calls().last(), Some(&EngineCall::Close));
}

#[test]
fn failed_page_does_not_wedge_navigation() {
    let engine = letter_engine(4).failing_load(2);
    let log = engine.call_log();
    let mut h = open_viewer(engine, "doc.pdf", ViewerConfig::default());
    assert!(h.viewer.settle(SETTLE));
    h.events.try_iter().for_each(drop);

    h.viewer.next_page();
    assert!(h.viewer.settle(SETTLE));
    assert_eq!(h.viewer.current_page(), 2);
    let events: Vec<_> = h.events.try_iter().collect();
    assert!(matches!(
        events.as_slice(),
        [ViewerEvent::PageFailed { page: 2, .. }]
    ));

    h.viewer.next_page();
    assert!(h.viewer.settle(SETTLE));
    assert_eq!(h.viewer.current_page(), 3);
    assert_eq!(log.rendered_pages(), vec![1, 3]);
    assert_eq!(h.viewer.status(), &ViewerStatus::Ready);
}

#[test]
fn failed_render_reports_and_recovers() {
    let engine = letter_engine(3).failing_render(2);
    let log = engine.call_log();
    let mut h = open_viewer(engine, "doc.pdf", ViewerConfig::default());
    assert!(h.viewer.settle(SETTLE));

    h.viewer.request_page(2);
    assert!(h.viewer.settle(SETTLE));
    assert!(
        h.events
            .try_iter()
            .any(|event| matches!(event, ViewerEvent::PageFailed { page: 2, .. }))
    );

    h.viewer.request_page(3);
    assert!(h.viewer.settle(SETTLE));
    assert_eq!(log.rendered_pages(), vec![1, 2, 3]);
    assert_eq!(h.viewer.surface().draws.len(), 2);
}

#[test]
fn unreachable_source_fails_the_viewer() {
    let engine = letter_engine(3);
    let log = engine.call_log();
    let mut h = open_viewer(engine, MemoryLoader::MISSING, ViewerConfig::default());
    assert!(h.viewer.settle(SETTLE));

    assert!(matches!(h.viewer.status(), ViewerStatus::Failed(message) if message.contains("404")));
    let events: Vec<_> = h.events.try_iter().collect();
    assert_eq!(events.first(), Some(&ViewerEvent::LoadingStarted));
    assert!(matches!(events.last(), Some(ViewerEvent::LoadFailed { .. })));
    assert!(log.calls().is_empty());
}

#[test]
fn malformed_document_fails_the_viewer() {
    let engine = letter_engine(3).failing_open();
    let mut h = open_viewer(engine, "doc.pdf", ViewerConfig::default());
    assert!(h.viewer.settle(SETTLE));

    assert!(matches!(h.viewer.status(), ViewerStatus::Failed(_)));
    assert!(
        h.events
            .try_iter()
            .any(|event| matches!(event, ViewerEvent::LoadFailed { .. }))
    );
    assert!(h.viewer.surface().draws.is_empty());
}

#[test]
fn empty_document_is_a_load_failure() {
    let engine = letter_engine(0);
    let mut h = open_viewer(engine, "doc.pdf", ViewerConfig::default());
    assert!(h.viewer.settle(SETTLE));

    assert_eq!(
        h.viewer.status(),
        &ViewerStatus::Failed("document has no pages".to_string())
    );
}

/// Loader that takes a long time to answer, like a slow remote server
struct SlowLoader(Duration);

impl SourceLoader for SlowLoader {
    fn fetch(&self, source: &str) -> Result<Vec<u8>, WorkerFault> {
        std::thread::sleep(self.0);
        MemoryLoader.fetch(source)
    }
}

#[test]
fn teardown_does_not_wait_for_a_slow_fetch() {
    let hub = Arc::new(ResizeHub::new());
    let mut viewer = PdfViewer::new(
        letter_engine(3),
        SlowLoader(Duration::from_secs(3)),
        RecordingSurface::default(),
        hub.clone(),
        "https://example.com/slow.pdf",
        ContainerSize::new(900, 472),
        ViewerConfig::default(),
    );
    viewer.open();
    std::thread::sleep(Duration::from_millis(50));

    let started = Instant::now();
    drop(viewer);
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(hub.listener_count(), 0);
}
