use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyModifiers};
use flume::Receiver;
use log::{info, warn};
use ratatui::Frame;
use ratatui::Terminal;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::event_source::EventSource;
use crate::host::{ResizeHub, ViewerEvent};
use crate::inputs::is_press;
use crate::pdf::{ContainerSize, PdfViewer};
use crate::terminal_surface::{HalfBlockView, PixelCanvas};

/// Rows below the page used by the status line
pub const STATUS_ROWS: u16 = 1;

/// Status rows expressed as surface pixels
pub const TERMINAL_CHROME_HEIGHT: u32 = STATUS_ROWS as u32 * 2;

const TICK_RATE: Duration = Duration::from_millis(30);
const MAX_EVENTS_PER_FRAME: usize = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppAction {
    Quit,
}

/// Terminal host for a single [`PdfViewer`]
pub struct App {
    pub viewer: PdfViewer<PixelCanvas>,
    resize_hub: Arc<ResizeHub>,
    events: Receiver<ViewerEvent>,
    notice: Option<String>,
}

impl App {
    pub fn new(mut viewer: PdfViewer<PixelCanvas>, resize_hub: Arc<ResizeHub>) -> Self {
        let events = viewer.subscribe();
        Self {
            viewer,
            resize_hub,
            events,
            notice: None,
        }
    }

    /// Container size for a terminal of `width` x `height` cells
    pub fn container_for(width: u16, height: u16) -> ContainerSize {
        PixelCanvas::container_for(Rect::new(0, 0, width, height))
    }

    pub fn start(&mut self) {
        self.viewer.open();
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn handle_event(&mut self, event: &Event) -> Option<AppAction> {
        match event {
            Event::Key(key) => {
                if !is_press(key) {
                    return None;
                }
                if self.viewer.handle_key(key).is_consumed()
                    || self.viewer.handle_page_input_key(key).is_consumed()
                {
                    return None;
                }
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => Some(AppAction::Quit),
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        Some(AppAction::Quit)
                    }
                    _ => None,
                }
            }
            Event::Resize(width, height) => {
                self.resize_hub.notify(Self::container_for(*width, *height));
                None
            }
            _ => None,
        }
    }

    /// Deliver viewer completions and events. Returns whether anything changed.
    pub fn tick(&mut self) -> bool {
        let mut changed = self.viewer.pump() > 0;
        let events: Vec<_> = self.events.try_iter().collect();
        for event in events {
            changed = true;
            self.on_viewer_event(event);
        }
        changed
    }

    fn on_viewer_event(&mut self, event: ViewerEvent) {
        match event {
            ViewerEvent::LoadingStarted => self.notice = Some("Loading…".to_string()),
            ViewerEvent::LoadingComplete => self.notice = None,
            ViewerEvent::LoadFailed { message } => {
                warn!("Document failed to load: {message}");
                self.notice = Some(format!("Could not load document: {message}"));
            }
            ViewerEvent::PageFailed { page, message } => {
                self.notice = Some(format!("Page {page}: {message}"));
            }
            ViewerEvent::PageRendered { page, .. } => {
                if self.notice.as_deref().is_some_and(|n| n.starts_with("Page ")) {
                    self.notice = None;
                }
                info!("Page {page} on screen");
            }
        }
    }

    pub fn draw(&self, frame: &mut Frame) {
        let [page_area, status_area] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(STATUS_ROWS)])
                .areas(frame.area());

        frame.render_widget(HalfBlockView::new(self.viewer.surface()), page_area);
        frame.render_widget(Paragraph::new(self.status_line()), status_area);
    }

    fn status_line(&self) -> Line<'_> {
        let input = self.viewer.page_input();
        let input_style = if input.is_editing() {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };

        let mut spans = vec![
            Span::raw(" Page "),
            Span::styled(input.text().to_string(), input_style),
            Span::raw(format!(" / {}", self.viewer.page_count())),
        ];
        if let Some(notice) = &self.notice {
            spans.push(Span::raw("  "));
            spans.push(Span::raw(notice.clone()));
        }
        Line::from(spans)
    }

    pub fn shutdown(&mut self) {
        self.viewer.shutdown();
    }
}

pub fn run_app_with_event_source<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    let mut needs_redraw = true;
    loop {
        if app.tick() {
            needs_redraw = true;
        }
        if needs_redraw {
            terminal.draw(|frame| app.draw(frame))?;
            needs_redraw = false;
        }

        if !event_source.poll(TICK_RATE)? {
            continue;
        }

        let mut events_processed = 0;
        loop {
            let event = event_source.read()?;
            events_processed += 1;
            if app.handle_event(&event) == Some(AppAction::Quit) {
                app.shutdown();
                return Ok(());
            }
            if events_processed >= MAX_EVENTS_PER_FRAME || !event_source.poll(Duration::ZERO)? {
                break;
            }
        }
        needs_redraw = true;
    }
}
