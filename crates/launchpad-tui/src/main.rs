//! Launchpad - a terminal launcher for a browser games site.
//!
//! Loads the site's game manifest (inline in the hosting page, or
//! `games/games.json`), shows the games as a searchable, sortable card grid
//! and opens the chosen game in the platform's default handler. Same-origin
//! site assets are served from an offline cache once installed.

mod app;
mod cli;
mod config;
mod launch;
mod ui;

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use launchpad_core::HttpTransport;
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{Builder, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::{App, AppState, LaunchSettings};
use cli::Args;
use config::Config;
use ui::input::{handle_input, handle_mouse};
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log files are `launchpad.<date>.log` under the cache directory
const LOG_FILE_PREFIX: &str = "launchpad";
const LOG_DIR: &str = "logs";

/// Initialize the tracing subscriber for logging.
///
/// The terminal belongs to the UI, so logs go to a daily file instead.
/// Use RUST_LOG to control the level (e.g. RUST_LOG=launchpad_core=debug).
fn init_tracing(cache_root: &Path) -> Result<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_dir = cache_root.join(LOG_DIR);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Could not create {}", log_dir.display()))?;
    let appender = Builder::new()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(&log_dir)
        .context("Could not open log file")?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: {:#}; using default settings", e);
            Config::default()
        }
    };
    let cache_root = config
        .cache_dir()
        .unwrap_or_else(|_| PathBuf::from("./cache"));

    let _log_guard = init_tracing(&cache_root)?;
    info!("Launchpad starting");

    let settings = LaunchSettings::resolve(&config, &args, cache_root)?;
    info!(base = %settings.base, offline_cache = settings.offline_cache, "Settings resolved");

    if args.install_cache {
        return install_cache(&settings).await;
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(settings);
    app.start_loading();

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("Launchpad shutting down");
    Ok(())
}

/// Install the core assets into the offline cache and report.
async fn install_cache(settings: &LaunchSettings) -> Result<()> {
    eprintln!(
        "Installing {} core assets from {} into '{}'...",
        settings.core_assets.len(),
        settings.base,
        settings.cache_name
    );

    let http = HttpTransport::new()?;
    let cache = app::open_asset_cache(http, settings)
        .await
        .context("Offline cache install failed; nothing was stored")?;

    let summary = app::cache_summary(&cache).await;
    println!("{} ({}): {}", settings.cache_name, cache.state(), summary);
    println!("Store: {}", cache.store().dir().display());
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| {
            app.set_viewport(f.area());
            render(f, app);
        })?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    // Ctrl+C to quit
                    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                        return Ok(());
                    }

                    if handle_input(app, key)? {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => handle_mouse(app, mouse),
                // Resize is picked up by the next draw
                _ => {}
            }
        }

        // Check for completed background tasks
        app.check_background_tasks();

        // Check if we should quit
        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
