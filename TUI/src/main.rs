mod action;
mod app;
mod chat;
mod command;
mod config;
mod error;
mod logging;
mod simulator;
mod store;
mod ui;
mod ui_state;
mod visibility;

use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use arboard::Clipboard;
use clap::Parser;
use crossterm::{
    event::{
        DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture, Event, EventStream,
        KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info};

use app::App;
use config::Config;
use ui::{draw, sidebar_hit, SidebarHit};
use ui_state::Focus;

/// Terminal chat assistant with simulated replies.
#[derive(Parser, Debug)]
#[command(name = "acme-chat", version)]
struct Args {
    /// Config file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Start without the demo conversation
    #[arg(long)]
    no_seed: bool,

    /// Log filter directives, e.g. "debug" or "acme_chat=trace"
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let _log_guard = logging::init(args.log_level.as_deref()).context("failed to initialize logging")?;

    let mut config = Config::load(args.config.as_deref()).context("failed to load config")?;
    if args.no_seed {
        config.seed_welcome_chat = false;
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, Instant::now());
    info!("session started");

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        error!(error = %e, "event loop failed");
    }
    info!("session ended");

    result.context("terminal event loop failed")
}

async fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> io::Result<()> {
    let mut events = EventStream::new();
    let mut ticker = tokio::time::interval(Duration::from_millis(app.config.tick_rate_ms.max(1)));

    while !app.should_quit {
        terminal.draw(|frame| draw(frame, app))?;

        tokio::select! {
            maybe_event = events.next() => match maybe_event {
                Some(Ok(event)) => {
                    let height = terminal.size()?.height;
                    handle_event(app, event, height);
                }
                Some(Err(e)) => return Err(e),
                None => return Ok(()),
            },
            _ = ticker.tick() => app.tick(Instant::now()),
        }

        // Replies are applied here, between events, never concurrently
        app.pump_replies();
    }

    Ok(())
}

fn handle_event(app: &mut App, event: Event, term_height: u16) {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(app, key),
        Event::Paste(text) => {
            push_input(app, &text);
        }
        Event::Mouse(mouse) => handle_mouse(app, mouse, term_height),
        _ => {}
    }
}

// Single-line composer: newlines become spaces
fn push_input(app: &mut App, text: &str) {
    let filtered: String = text
        .chars()
        .filter(|c| *c != '\r')
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect();
    app.ui.input.push_str(&filtered);
    app.reset_command_selection();
    app.ui.prompt_selection = None;
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('c') if ctrl => app.should_quit = true,
        KeyCode::Char('n') if ctrl => app.on_new_chat(),
        KeyCode::Char('b') if ctrl => app.toggle_sidebar(),
        KeyCode::Char('y') if ctrl => app.on_copy_last_reply(),
        KeyCode::Char('v') if ctrl => {
            if let Ok(mut clipboard) = Clipboard::new() {
                if let Ok(text) = clipboard.get_text() {
                    push_input(app, &text);
                }
            }
        }
        KeyCode::Esc => {
            if app.showing_command_popup() {
                app.reset_command_selection();
                app.ui.input.clear();
            } else if app.is_typing() {
                app.on_stop();
            } else if app.ui.input.is_empty() {
                app.should_quit = true;
            } else {
                app.ui.input.clear();
            }
        }
        KeyCode::Enter => {
            if app.ui.focus == Focus::Sidebar {
                app.sidebar_activate();
            } else if app.showing_command_popup() && app.ui.command_selection.is_some() {
                app.apply_command_selection();
            } else {
                app.submit_input();
            }
        }
        KeyCode::Tab => {
            if app.showing_command_popup() && app.ui.command_selection.is_some() {
                app.apply_command_selection();
            } else {
                app.cycle_focus();
            }
        }
        KeyCode::BackTab => app.cycle_focus(),
        KeyCode::Backspace => {
            app.ui.input.pop();
            app.reset_command_selection();
        }
        KeyCode::Char(c) => {
            app.ui.input.push(c);
            app.reset_command_selection();
            app.ui.prompt_selection = None;
            app.ui.focus = Focus::Input;
        }
        KeyCode::Up => {
            if app.showing_command_popup() {
                app.command_select_up();
            } else if app.ui.focus == Focus::Sidebar {
                app.sidebar_up();
            } else if app.showing_welcome() && app.ui.input.is_empty() {
                app.prompt_select_up();
            } else {
                app.scroll_up();
            }
        }
        KeyCode::Down => {
            if app.showing_command_popup() {
                app.command_select_down();
            } else if app.ui.focus == Focus::Sidebar {
                app.sidebar_down();
            } else if app.showing_welcome() && app.ui.input.is_empty() {
                app.prompt_select_down();
            } else {
                app.scroll_down();
            }
        }
        KeyCode::PageUp => app.scroll_up(),
        KeyCode::PageDown => app.scroll_down(),
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent, term_height: u16) {
    match mouse.kind {
        MouseEventKind::Moved | MouseEventKind::Drag(_) => app.pointer_moved(mouse.column, mouse.row),
        MouseEventKind::Down(MouseButton::Left) => match sidebar_hit(app, mouse.column, mouse.row) {
            Some(SidebarHit::Toggle) => app.toggle_sidebar(),
            Some(SidebarHit::NewChat) => app.on_new_chat(),
            Some(SidebarHit::Entry(index)) => {
                app.ui.focus = Focus::Sidebar;
                app.select_history_entry(index);
            }
            None if mouse.column < app.sidebar_width() => app.ui.focus = Focus::Sidebar,
            None if mouse.row >= term_height.saturating_sub(ui::INPUT_HEIGHT) => app.ui.focus = Focus::Input,
            None => app.ui.focus = Focus::Chat,
        },
        MouseEventKind::ScrollUp => app.scroll_up(),
        MouseEventKind::ScrollDown => app.scroll_down(),
        _ => {}
    }
}
