//! Pure state transitions: (Screen, Action) → Transition.
//!
//! `update` never touches the round; it only describes effects.
//! `apply_effect` and `expire_feedback` are the single place where the
//! round changes. Both take `now` so they stay testable without a clock.

use std::time::{Duration, Instant};

use crate::types::RoundStatus;

use super::state::{Action, App, Effect, Feedback, Notice, Screen, Transition};

/// How long the grid shakes after a failed verify.
pub const SHAKE_DURATION: Duration = Duration::from_millis(500);

/// How long the grid fades before a refresh swaps the layout.
pub const FADE_DURATION: Duration = Duration::from_millis(300);

/// Grid geometry the transition function needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    pub slot_count: usize,
    pub columns: usize,
}

impl GridShape {
    pub fn of(app: &App) -> Self {
        GridShape {
            slot_count: app.slot_count(),
            columns: app.columns(),
        }
    }
}

/// Pure state transition function.
pub fn update(screen: Screen, action: &Action, shape: GridShape) -> Transition {
    match screen {
        Screen::Grid { cursor } => update_grid(cursor, action, shape),
        Screen::Solved => update_solved(action),
        Screen::Notice { notice, cursor } => update_notice(notice, cursor, action),
    }
}

// ============================================================================
// PER-SCREEN HANDLERS
// ============================================================================

/// Grid: cursor movement, toggles, verify, reset, refresh, notices.
fn update_grid(cursor: usize, action: &Action, shape: GridShape) -> Transition {
    let stay = Screen::Grid { cursor };

    match action {
        Action::MoveUp | Action::MoveDown | Action::MoveLeft | Action::MoveRight => {
            Transition::Screen(Screen::Grid {
                cursor: move_cursor(cursor, action, shape),
            })
        }
        Action::ToggleSelection => Transition::Effect {
            effect: Effect::Toggle { slot: cursor },
            then: stay,
        },
        Action::NumberKey(n) => {
            let n = usize::from(*n);
            if (1..=shape.slot_count).contains(&n) {
                Transition::Effect {
                    effect: Effect::Toggle { slot: n - 1 },
                    then: Screen::Grid { cursor: n - 1 },
                }
            } else {
                Transition::Screen(stay)
            }
        }
        Action::Verify => Transition::Effect {
            effect: Effect::Verify,
            then: stay,
        },
        Action::Reset => Transition::Effect {
            effect: Effect::Reset,
            then: stay,
        },
        Action::Refresh => Transition::Effect {
            effect: Effect::Refresh,
            then: stay,
        },
        Action::Info => Transition::Screen(Screen::Notice {
            notice: Notice::Info,
            cursor,
        }),
        Action::Audio => Transition::Screen(Screen::Notice {
            notice: Notice::Audio,
            cursor,
        }),
        Action::Quit => Transition::Quit,
        Action::Back => Transition::Screen(stay),
    }
}

/// Solved: any "continue" action starts a new round.
fn update_solved(action: &Action) -> Transition {
    match action {
        Action::Reset | Action::Verify | Action::Back => Transition::Effect {
            effect: Effect::Reset,
            then: Screen::default(),
        },
        Action::Refresh => Transition::Effect {
            effect: Effect::Refresh,
            then: Screen::default(),
        },
        Action::Quit => Transition::Quit,
        _ => Transition::Screen(Screen::Solved),
    }
}

/// Notice: dismiss back to the grid, keeping the cursor.
fn update_notice(notice: Notice, cursor: usize, action: &Action) -> Transition {
    match action {
        Action::Back | Action::Verify => Transition::Screen(Screen::Grid { cursor }),
        Action::Quit => Transition::Quit,
        _ => Transition::Screen(Screen::Notice { notice, cursor }),
    }
}

/// Move within a row-major grid, clamping at the edges.
fn move_cursor(cursor: usize, action: &Action, shape: GridShape) -> usize {
    let GridShape { slot_count, columns } = shape;
    if slot_count == 0 || columns == 0 {
        return 0;
    }

    match action {
        Action::MoveUp if cursor >= columns => cursor - columns,
        Action::MoveDown if cursor + columns < slot_count => cursor + columns,
        Action::MoveLeft if cursor % columns > 0 => cursor - 1,
        Action::MoveRight if cursor % columns + 1 < columns && cursor + 1 < slot_count => {
            cursor + 1
        }
        _ => cursor,
    }
}

// ============================================================================
// EFFECTS
// ============================================================================

/// While the grid fades, only Quit gets through.
pub fn accepts(app: &App, action: &Action) -> bool {
    !matches!(app.feedback, Some(Feedback::Fade { .. })) || *action == Action::Quit
}

/// Run a round operation and move to the next screen.
///
/// A passing verify overrides `then` with the success banner.
pub fn apply_effect(app: &mut App, effect: Effect, then: Screen, now: Instant) {
    app.screen = then;

    match effect {
        Effect::Toggle { slot } => {
            if let Err(e) = app.round.toggle(slot) {
                tracing::warn!("{e}");
            }
            app.last_result = None;
        }
        Effect::Verify => {
            let result = app.round.verify();
            app.last_result = Some(result);
            if result.is_success() {
                app.feedback = None;
                app.screen = Screen::Solved;
            } else {
                app.feedback = Some(Feedback::Shake {
                    until: now + SHAKE_DURATION,
                });
            }
        }
        Effect::Reset => {
            app.round.reset();
            app.last_result = None;
            app.feedback = None;
        }
        Effect::Refresh => {
            app.feedback = Some(Feedback::Fade {
                until: now + FADE_DURATION,
            });
        }
    }
}

/// Clear feedback whose deadline has passed. An expired fade refreshes
/// the round. Returns true if anything changed.
pub fn expire_feedback(app: &mut App, now: Instant) -> bool {
    let Some(feedback) = app.feedback else {
        return false;
    };
    if now < feedback.deadline() {
        return false;
    }

    if let Feedback::Fade { .. } = feedback {
        app.round.refresh();
        app.last_result = None;
    }
    app.feedback = None;
    true
}

/// One-line status summary for the footer.
pub fn status_line(app: &App) -> String {
    let selected = app.round.selection().len();
    match (app.round.status(), app.last_result) {
        (RoundStatus::Rejected, Some(result)) => {
            let tally = result.tally();
            format!(
                "Not quite: {} selected, {} wrong. Try again.",
                selected, tally.wrong
            )
        }
        (RoundStatus::Solved, _) => "Verified".to_string(),
        _ => format!("{} selected", selected),
    }
}

// ============================================================================
// TESTS
// ============================================================================
