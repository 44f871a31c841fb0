use std::fs::File;
use std::io::stdout;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, enable_raw_mode},
};
use log::{LevelFilter, error, info, warn};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{Config, WriteLogger};

use pdfpane::event_source::TerminalEventSource;
use pdfpane::host::ResizeHub;
use pdfpane::main_app::{App, TERMINAL_CHROME_HEIGHT, run_app_with_event_source};
use pdfpane::panic_handler::{initialize_panic_handler, restore_terminal};
use pdfpane::pdf::{DefaultSourceLoader, MupdfEngine, PdfViewer};
use pdfpane::settings::load_settings;
use pdfpane::terminal_surface::PixelCanvas;

#[derive(Parser, Debug)]
#[command(name = "pdfpane", version, about = "Single-page PDF viewer for the terminal", long_about = None)]
struct Cli {
    /// PDF file path, file:// URL or http(s) URL
    #[arg(value_name = "SOURCE")]
    source: String,

    /// Settings file to use instead of the default location
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Where to write the log
    #[arg(long, value_name = "PATH", default_value = "pdfpane.log")]
    log_file: PathBuf,

    /// Override the log level from settings
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = load_settings(cli.config.as_deref());
    if let Some(level) = cli.log_level.clone() {
        settings.log_level = level;
    }
    let level = settings.parse_log_level();
    WriteLogger::init(
        level.unwrap_or(LevelFilter::Info),
        Config::default(),
        File::create(&cli.log_file)
            .with_context(|| format!("Cannot create log file {:?}", cli.log_file))?,
    )?;

    if level.is_none() {
        warn!("Unknown log level {:?}, using info", settings.log_level);
    }
    info!("Starting pdfpane for {}", cli.source);
    initialize_panic_handler();

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let size = terminal.size()?;
    let hub = Arc::new(ResizeHub::new());
    let viewer = PdfViewer::new(
        MupdfEngine,
        DefaultSourceLoader::new(settings.fetch_timeout()),
        PixelCanvas::default(),
        hub.clone(),
        cli.source.clone(),
        App::container_for(size.width, size.height),
        settings.viewer_config(TERMINAL_CHROME_HEIGHT),
    );

    let mut app = App::new(viewer, hub);
    app.start();
    let res = run_app_with_event_source(&mut terminal, &mut app, &mut TerminalEventSource);
    app.shutdown();

    restore_terminal();
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("Application error: {err:?}");
        println!("{err:?}");
    }

    info!("Shutting down pdfpane");
    Ok(())
}
