//! swipefm - an endless music-preview discovery TUI.

use std::time::Duration;

use clap::Parser;
use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseEventKind};
use tokio::sync::mpsc;

mod action;
mod app;
mod catalog;
mod config;
mod favorites;
mod feed;
mod nav;
mod player;
mod tui;
mod ui;

use action::Action;
use app::App;
use config::Config;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "swipefm")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Preferred genre (overrides config; repeat for several)
    #[arg(short, long)]
    genre: Vec<String>,

    /// Visualizer theme (overrides config)
    #[arg(short, long)]
    theme: Option<String>,

    /// Favorites service base URL (overrides config)
    #[arg(long)]
    favorites_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install panic hooks
    tui::install_hooks()?;

    // Initialize logging
    let log_file = dirs::cache_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("swipefm")
        .join("swipefm.log");

    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = tracing_subscriber::fmt::layer()
        .with_writer(std::fs::File::create(&log_file)?)
        .with_ansi(false);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::sink) // Don't write to stdout in TUI mode
        .finish()
        .with(file_appender)
        .try_init()
        .ok();

    // Parse command-line arguments
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load().unwrap_or_default();

    // Apply command-line overrides
    if !args.genre.is_empty() {
        config.user.favorite_genres = args.genre;
    }
    if let Some(theme) = args.theme {
        config.user.theme = theme;
    }
    if let Some(url) = args.favorites_url {
        config.favorites.base_url = Some(url);
    }

    // Create action channel
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();

    // Create application
    let mut app = App::new(config, action_tx.clone())?;

    // Initialize terminal
    let mut terminal = tui::init()?;

    // Initialize application
    app.init()?;

    // Main event loop
    let tick_rate = Duration::from_millis(100);

    loop {
        // Render UI
        terminal.draw(|frame| ui::render(frame, &app))?;

        // Handle events with timeout
        if event::poll(tick_rate)? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Press {
                        let action = handle_key_event(key.code, key.modifiers, &app);
                        if action != Action::None {
                            action_tx.send(action)?;
                        }
                    }
                }
                Event::Mouse(mouse) => {
                    let action = handle_mouse_event(mouse);
                    if action != Action::None {
                        action_tx.send(action)?;
                    }
                }
                Event::Resize(width, height) => {
                    action_tx.send(Action::Resize(width, height))?;
                }
                _ => {}
            }
        }

        // Send tick action
        action_tx.send(Action::Tick)?;

        // Process all pending actions
        while let Ok(action) = action_rx.try_recv() {
            app.handle_action(action)?;
        }

        // Check if we should quit
        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    tui::restore()?;

    Ok(())
}

/// Map key events to actions.
fn handle_key_event(code: KeyCode, modifiers: KeyModifiers, app: &App) -> Action {
    // Handle help overlay
    if app.show_help {
        return match code {
            KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => Action::HideHelp,
            _ => Action::None,
        };
    }

    // Global keys
    match code {
        KeyCode::Char('q') => return Action::Quit,
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return Action::Quit,
        _ => {}
    }

    match code {
        // Feed navigation
        KeyCode::Down | KeyCode::Char('j') => Action::Advance,
        KeyCode::Up | KeyCode::Char('k') => Action::Retreat,

        // Playback
        KeyCode::Char(' ') => Action::PlayPause,
        KeyCode::Right | KeyCode::Char('.') | KeyCode::Char('>') => Action::SeekForward,
        KeyCode::Left | KeyCode::Char(',') | KeyCode::Char('<') => Action::SeekBackward,
        KeyCode::Char(c @ '0'..='9') => {
            Action::SeekToFraction(f64::from(c as u8 - b'0') / 10.0)
        }

        // Volume
        KeyCode::Char('+') | KeyCode::Char('=') => Action::VolumeUp,
        KeyCode::Char('-') => Action::VolumeDown,

        // Discovery
        KeyCode::Char('s') => Action::ToggleSave,
        KeyCode::Char('r') => Action::Restart,

        // Help
        KeyCode::Char('?') => Action::ShowHelp,

        // Clear error
        KeyCode::Char('x') => Action::ClearError,

        _ => Action::None,
    }
}

/// Handle mouse events: the wheel and a vertical left-button drag both feed
/// the navigation adapters.
fn handle_mouse_event(mouse: crossterm::event::MouseEvent) -> Action {
    match mouse.kind {
        MouseEventKind::ScrollDown => Action::Wheel(1),
        MouseEventKind::ScrollUp => Action::Wheel(-1),
        MouseEventKind::Down(crossterm::event::MouseButton::Left) => Action::SwipePress(mouse.row),
        MouseEventKind::Up(crossterm::event::MouseButton::Left) => Action::SwipeRelease(mouse.row),
        _ => Action::None,
    }
}

use tracing_subscriber::prelude::*;
