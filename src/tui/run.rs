//! Terminal side of the puzzle: raw mode, the key reader and the loop.
//!
//! Everything else under `tui` is pure; this module owns the terminal and
//! turns key presses into [`Action`]s. A reader thread forwards presses
//! over a channel, and the loop sleeps on that channel until either a key
//! arrives or the pending shake/fade deadline passes.

use std::io::{self, Stdout};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Instant;

use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use super::state::{Action, App, AppEvent, Transition};
use super::update::{GridShape, accepts, apply_effect, expire_feedback, update};
use super::view::render;

// ============================================================================
// KEYS
// ============================================================================

/// Translate a key press into a puzzle action, if it is bound to one.
pub fn map_key(key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return (key.code == KeyCode::Char('c')).then_some(Action::Quit);
    }

    let action = match key.code {
        KeyCode::Up | KeyCode::Char('k') => Action::MoveUp,
        KeyCode::Down | KeyCode::Char('j') => Action::MoveDown,
        KeyCode::Left | KeyCode::Char('h') => Action::MoveLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::MoveRight,

        KeyCode::Char(' ') => Action::ToggleSelection,
        KeyCode::Char(digit @ '1'..='9') => Action::NumberKey(digit as u8 - b'0'),

        KeyCode::Enter | KeyCode::Char('v') => Action::Verify,
        KeyCode::Char('r') => Action::Reset,
        KeyCode::Char('f') => Action::Refresh,
        KeyCode::Char('i') => Action::Info,
        KeyCode::Char('a') => Action::Audio,
        KeyCode::Esc => Action::Back,
        KeyCode::Char('q') => Action::Quit,
        _ => return None,
    };
    Some(action)
}

// ============================================================================
// TERMINAL SESSION
// ============================================================================

/// Raw mode plus the alternate screen, undone on drop.
struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut out = io::stdout();
        if let Err(err) = execute!(out, EnterAlternateScreen, Hide) {
            let _ = disable_raw_mode();
            return Err(err);
        }
        let terminal = match Terminal::new(CrosstermBackend::new(out)) {
            Ok(terminal) => terminal,
            Err(err) => {
                leave_terminal();
                return Err(err);
            }
        };
        Ok(Self { terminal })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        leave_terminal();
    }
}

fn leave_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
}

/// Put the terminal back before the default hook prints the panic.
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        leave_terminal();
        default_hook(info);
    }));
}

/// Forward key presses until the receiver hangs up or the terminal errors.
fn spawn_key_reader() -> Receiver<AppEvent> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        loop {
            let key = match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => key,
                Ok(_) => continue,
                Err(err) => {
                    tracing::warn!(error = %err, "key reader stopped");
                    break;
                }
            };
            if tx.send(AppEvent::Key(key)).is_err() {
                break;
            }
        }
    });
    rx
}

// ============================================================================
// EVENT LOOP
// ============================================================================

/// Run the puzzle until the user quits.
pub fn run(mut app: App) -> io::Result<()> {
    install_panic_hook();
    let mut session = TerminalSession::new()?;
    let keys = spawn_key_reader();

    tracing::info!(slots = app.slot_count(), "puzzle started");

    while !app.should_quit {
        session.terminal.draw(|frame| render(&app, frame))?;

        let next = match app.feedback {
            Some(feedback) => {
                keys.recv_timeout(feedback.deadline().saturating_duration_since(Instant::now()))
            }
            None => keys.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match next {
            Ok(AppEvent::Key(key)) => {
                if let Some(action) = map_key(key) {
                    handle_action(&mut app, action);
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        expire_feedback(&mut app, Instant::now());
    }

    tracing::info!(rounds = app.round.round_number(), "puzzle closed");
    Ok(())
}

/// Feed one action through the pure transition and interpret the result.
fn handle_action(app: &mut App, action: Action) {
    if !accepts(app, &action) {
        return;
    }

    let shape = GridShape::of(app);
    match update(std::mem::take(&mut app.screen), &action, shape) {
        Transition::Screen(screen) => app.screen = screen,
        Transition::Quit => app.should_quit = true,
        Transition::Effect { effect, then } => apply_effect(app, effect, then, Instant::now()),
    }
}

// ============================================================================
// TESTS
// ============================================================================
