//! Puzzle palette.
//!
//! Magenta carries the valentine theme (title, hearts, selected cells).
//! Green and red only ever mean "verified" and "rejected"; cyan marks
//! whatever the user can act on next.

use ratatui::style::{Color, Modifier, Style};

// ============================================================================
// OUTCOMES
// ============================================================================

pub const STYLE_PASSED: Style = Style::new().fg(Color::Green).add_modifier(Modifier::BOLD);

/// Border of a shaking grid.
pub const STYLE_REJECTED: Style = Style::new().fg(Color::Red).add_modifier(Modifier::BOLD);

pub const STYLE_HEART: Style = Style::new().fg(Color::Magenta).add_modifier(Modifier::BOLD);

// ============================================================================
// GRID
// ============================================================================

pub const STYLE_TITLE: Style = Style::new()
    .fg(Color::LightMagenta)
    .add_modifier(Modifier::BOLD);

pub const STYLE_KEY_HINT: Style = Style::new().fg(Color::Cyan);

/// Border of the cell under the cursor.
pub const STYLE_CURSOR: Style = Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD);

/// Body of a selected cell.
pub const STYLE_SELECTED: Style = Style::new().fg(Color::Black).bg(Color::Magenta);

pub const STYLE_TICK: Style = Style::new().fg(Color::Green).add_modifier(Modifier::BOLD);
pub const STYLE_NO_TICK: Style = Style::new().fg(Color::DarkGray);

/// Everything while the grid fades out.
pub const STYLE_FADED: Style = Style::new().fg(Color::DarkGray);

pub const STYLE_HELP: Style = Style::new()
    .fg(Color::DarkGray)
    .add_modifier(Modifier::ITALIC);
