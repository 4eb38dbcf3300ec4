//! TUI state algebra: pure types, zero effects.
//!
//! Screen variants carry only per-screen transient state (the grid
//! cursor). The puzzle round itself lives in App and is only changed by
//! interpreting an `Effect`.

use std::time::Instant;

use crossterm::event::KeyEvent;

use crate::config::PuzzleConfig;
use crate::round::PuzzleRound;
use crate::types::{VerificationResult, grid_columns};

// ============================================================================
// APP EVENTS
// ============================================================================

/// Everything the event loop can receive from its channel.
///
/// The key reader thread is the only producer. Cosmetic timers are not
/// events: the loop wakes on their deadline with `recv_timeout`.
#[derive(Debug)]
pub enum AppEvent {
    /// A terminal key event from the crossterm reader thread.
    Key(KeyEvent),
}

// ============================================================================
// APPLICATION STATE
// ============================================================================

/// Presentation text, copied out of the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texts {
    pub title: String,
    pub prompt: String,
    pub success: String,
    pub info: String,
    pub audio: String,
}

impl From<&PuzzleConfig> for Texts {
    fn from(config: &PuzzleConfig) -> Self {
        Texts {
            title: config.title.clone(),
            prompt: config.prompt.clone(),
            success: config.success_message.clone(),
            info: config.info_message.clone(),
            audio: config.audio_message.clone(),
        }
    }
}

/// Top-level TUI model.
///
/// Owns the puzzle round, the current screen and any cosmetic feedback.
#[derive(Debug)]
pub struct App {
    /// Current screen; carries the cursor.
    pub screen: Screen,

    pub round: PuzzleRound,

    pub texts: Texts,

    /// Transient visual feedback (shake, fade). Cleared by the run loop.
    pub feedback: Option<Feedback>,

    /// Result of the last verify, for the status line.
    pub last_result: Option<VerificationResult>,

    /// Set to true when the app should exit on the next tick.
    pub should_quit: bool,
}

// ============================================================================
// SCREENS
// ============================================================================

/// The current TUI screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// The shuffled image grid.
    Grid { cursor: usize },

    /// Success banner after a passing verify.
    Solved,

    /// Modal message over the grid (info or audio button).
    Notice { notice: Notice, cursor: usize },
}

/// Default screen is the grid with the cursor on slot 0.
impl Default for Screen {
    fn default() -> Self {
        Screen::Grid { cursor: 0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Info,
    Audio,
}

/// Cosmetic feedback with a deadline. Never affects the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    /// Failed verify: the grid shakes until `until`.
    Shake { until: Instant },
    /// Refresh requested: the grid fades, then a new layout is drawn.
    Fade { until: Instant },
}

impl Feedback {
    pub fn deadline(&self) -> Instant {
        match self {
            Feedback::Shake { until } | Feedback::Fade { until } => *until,
        }
    }
}

// ============================================================================
// ACTIONS
// ============================================================================

/// Semantic user action, decoupled from raw key events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    /// Toggle the slot under the cursor.
    ToggleSelection,
    /// Toggle a slot by its 1-based number (1-9).
    NumberKey(u8),
    /// Check the selection.
    Verify,
    /// New round, hiding the success banner.
    Reset,
    /// New round after a fade.
    Refresh,
    /// Show the info notice.
    Info,
    /// Show the audio notice.
    Audio,
    /// Dismiss a notice.
    Back,
    Quit,
}

// ============================================================================
// TRANSITIONS
// ============================================================================

/// Result of a pure state transition.
///
/// Follows the Elm/TEA pattern: pure code describes WHAT should happen,
/// effectful code decides HOW.
#[derive(Debug, PartialEq)]
pub enum Transition {
    /// Render this screen (may be the same or a different screen).
    Screen(Screen),
    /// Quit the application.
    Quit,
    /// Run a round operation, then land on `then`.
    Effect { effect: Effect, then: Screen },
}

/// Round operation requested by a pure transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Toggle { slot: usize },
    Verify,
    Reset,
    /// Start the fade; the run loop refreshes when it expires.
    Refresh,
}

// ============================================================================
// CONSTRUCTORS
// ============================================================================

impl App {
    pub fn new(round: PuzzleRound, texts: Texts) -> Self {
        App {
            screen: Screen::default(),
            round,
            texts,
            feedback: None,
            last_result: None,
            should_quit: false,
        }
    }

    pub fn slot_count(&self) -> usize {
        self.round.slot_count()
    }

    pub fn columns(&self) -> usize {
        grid_columns(self.round.slot_count())
    }

    /// Cursor position, if the current screen has one.
    pub fn cursor(&self) -> Option<usize> {
        match self.screen {
            Screen::Grid { cursor } | Screen::Notice { cursor, .. } => Some(cursor),
            Screen::Solved => None,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn app() -> App {
        let config = PuzzleConfig::default();
        let round = PuzzleRound::seeded(config.catalog().unwrap(), 1);
        App::new(round, Texts::from(&config))
    }

    #[test]
    fn new_app_lands_on_grid() {
        let app = app();
        assert_eq!(app.screen, Screen::Grid { cursor: 0 });
        assert!(app.feedback.is_none());
        assert!(app.last_result.is_none());
        assert!(!app.should_quit);
    }

    #[test]
    fn nine_slots_make_three_columns() {
        let app = app();
        assert_eq!(app.slot_count(), 9);
        assert_eq!(app.columns(), 3);
    }

    #[test]
    fn texts_come_from_config() {
        let app = app();
        assert_eq!(app.texts.prompt, PuzzleConfig::default().prompt);
    }

    #[test]
    fn cursor_follows_screen() {
        let mut app = app();
        app.screen = Screen::Notice {
            notice: Notice::Info,
            cursor: 4,
        };
        assert_eq!(app.cursor(), Some(4));
        app.screen = Screen::Solved;
        assert_eq!(app.cursor(), None);
    }

    #[test]
    fn feedback_exposes_deadline() {
        let until = Instant::now() + Duration::from_millis(500);
        assert_eq!(Feedback::Shake { until }.deadline(), until);
        assert_eq!(Feedback::Fade { until }.deadline(), until);
    }
}
