//! Pure rendering: map App state to ratatui widget trees.
//!
//! The grid is always drawn; the Solved and Notice screens draw on top of
//! it. Feedback only changes styling and offsets, never content.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use super::state::{App, Feedback, Notice, Screen};
use super::theme;
use super::update::status_line;

/// Columns the grid is pushed right while shaking.
const SHAKE_OFFSET: u16 = 2;

/// Hearts scattered over the success banner.
const HEARTS: [&str; 4] = ["♥", "❤", "♡", "❥"];
const CONFETTI_COUNT: usize = 30;

// ============================================================================
// DISPATCH
// ============================================================================

/// Render the current screen to the terminal frame.
pub fn render(app: &App, frame: &mut Frame) {
    let area = frame.area();

    let chunks = Layout::vertical([
        Constraint::Length(1), // title
        Constraint::Length(2), // prompt
        Constraint::Min(0),    // grid
        Constraint::Length(1), // status
        Constraint::Length(1), // help
    ])
    .split(area);

    frame.render_widget(render_title(app), chunks[0]);
    frame.render_widget(render_prompt(app), chunks[1]);
    render_grid(app, frame, chunks[2]);
    frame.render_widget(render_status(app), chunks[3]);
    frame.render_widget(render_help(&app.screen), chunks[4]);

    match &app.screen {
        Screen::Grid { .. } => {}
        Screen::Solved => render_solved(app, frame, chunks[2]),
        Screen::Notice { notice, .. } => render_notice(app, *notice, frame, chunks[2]),
    }
}

// ============================================================================
// SHARED LAYOUT
// ============================================================================

fn render_title(app: &App) -> Paragraph<'static> {
    Paragraph::new(Line::from(vec![
        Span::styled(app.texts.title.clone(), theme::STYLE_TITLE),
        Span::styled(
            format!("  round {}", app.round.round_number()),
            theme::STYLE_FADED,
        ),
    ]))
}

fn render_prompt(app: &App) -> Paragraph<'static> {
    Paragraph::new(Line::from(Span::styled(
        app.texts.prompt.clone(),
        theme::STYLE_KEY_HINT,
    )))
    .wrap(Wrap { trim: true })
}

fn render_status(app: &App) -> Paragraph<'static> {
    let style = match app.feedback {
        Some(Feedback::Shake { .. }) => theme::STYLE_REJECTED,
        _ => theme::STYLE_FADED,
    };
    Paragraph::new(Span::styled(status_line(app), style))
}

/// Help line showing available keybindings for the current screen.
fn render_help(screen: &Screen) -> Paragraph<'static> {
    let help_text = match screen {
        Screen::Grid { .. } => {
            "[arrows/hjkl] move  [Space/1-9] select  [Enter] verify  [f] refresh  [r] reset  [i] info  [a] audio  [q] quit"
        }
        Screen::Solved => "[Enter/r] new round  [q] quit",
        Screen::Notice { .. } => "[Esc/Enter] close",
    };

    Paragraph::new(Span::styled(help_text, theme::STYLE_HELP))
}

// ============================================================================
// GRID
// ============================================================================

fn render_grid(app: &App, frame: &mut Frame, area: Rect) {
    let columns = app.columns();
    let slot_count = app.slot_count();
    if slot_count == 0 || area.is_empty() {
        return;
    }
    let rows = slot_count.div_ceil(columns);

    let area = match app.feedback {
        Some(Feedback::Shake { .. }) => shifted(area, SHAKE_OFFSET),
        _ => area,
    };

    let row_areas = Layout::vertical(vec![Constraint::Ratio(1, rows as u32); rows]).split(area);
    for (row, row_area) in row_areas.iter().enumerate() {
        let cell_areas =
            Layout::horizontal(vec![Constraint::Ratio(1, columns as u32); columns]).split(*row_area);
        for (column, cell_area) in cell_areas.iter().enumerate() {
            let slot = row * columns + column;
            if slot < slot_count {
                render_cell(app, slot, frame, *cell_area);
            }
        }
    }
}

fn render_cell(app: &App, slot: usize, frame: &mut Frame, area: Rect) {
    let selected = app.round.is_selected(slot);
    let under_cursor = app.cursor() == Some(slot);
    let label = app
        .round
        .item_at(slot)
        .map(|item| item.label.clone())
        .unwrap_or_default();

    let border_style = match (app.feedback, under_cursor) {
        (Some(Feedback::Fade { .. }), _) => theme::STYLE_FADED,
        (Some(Feedback::Shake { .. }), _) => theme::STYLE_REJECTED,
        (None, true) => theme::STYLE_CURSOR,
        (None, false) => Style::new(),
    };
    let body_style = match app.feedback {
        Some(Feedback::Fade { .. }) => theme::STYLE_FADED,
        _ if selected => theme::STYLE_SELECTED,
        _ => Style::new(),
    };
    let (checkbox, checkbox_style) = if selected {
        ("[✓]", theme::STYLE_TICK)
    } else {
        ("[ ]", theme::STYLE_NO_TICK)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(format!(" {} ", slot + 1));

    let text = vec![
        Line::from(Span::styled(label, body_style)),
        Line::from(Span::styled(checkbox, checkbox_style)),
    ];

    frame.render_widget(
        Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .style(body_style),
        area,
    );
}

/// `area` moved right by `offset`, shrinking to stay inside the original.
fn shifted(area: Rect, offset: u16) -> Rect {
    let offset = offset.min(area.width);
    Rect {
        x: area.x + offset,
        width: area.width - offset,
        ..area
    }
}

// ============================================================================
// SCREEN: SOLVED
// ============================================================================

fn render_solved(app: &App, frame: &mut Frame, area: Rect) {
    frame.render_widget(Clear, area);

    for (x, y, heart) in confetti(app.round.round_number(), area) {
        frame.render_widget(
            Paragraph::new(Span::styled(heart, theme::STYLE_HEART)),
            Rect::new(x, y, 1, 1),
        );
    }

    let banner = centered(area, 44, 7);
    frame.render_widget(Clear, banner);
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("♥  Verified  ♥", theme::STYLE_HEART)),
        Line::from(""),
        Line::from(Span::styled(app.texts.success.clone(), theme::STYLE_PASSED)),
    ];
    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme::STYLE_HEART),
            ),
        banner,
    );
}

/// Deterministic heart positions inside `area`, varying per round.
fn confetti(seed: u64, area: Rect) -> Vec<(u16, u16, &'static str)> {
    if area.is_empty() {
        return Vec::new();
    }

    let mut rng = StdRng::seed_from_u64(seed);
    (0..CONFETTI_COUNT)
        .map(|_| {
            let x = area.x + rng.random_range(0..area.width);
            let y = area.y + rng.random_range(0..area.height);
            let heart = HEARTS[rng.random_range(0..HEARTS.len())];
            (x, y, heart)
        })
        .collect()
}

// ============================================================================
// SCREEN: NOTICE
// ============================================================================

fn render_notice(app: &App, notice: Notice, frame: &mut Frame, area: Rect) {
    let (title, body) = match notice {
        Notice::Info => (" Info ", app.texts.info.clone()),
        Notice::Audio => (" Audio ", app.texts.audio.clone()),
    };

    let popup = centered(area, 50, 8);
    frame.render_widget(Clear, popup);

    let lines: Vec<Line> = body.lines().map(|l| Line::from(l.to_string())).collect();
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme::STYLE_KEY_HINT)
                    .title(title),
            ),
        popup,
    );
}

/// A `width`×`height` rectangle centered in `area`, clipped to fit.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use crate::config::PuzzleConfig;
    use crate::round::PuzzleRound;
    use crate::tui::state::Texts;

    fn make_terminal() -> Terminal<TestBackend> {
        Terminal::new(TestBackend::new(90, 30)).unwrap()
    }

    fn app() -> App {
        let config = PuzzleConfig::default();
        let round = PuzzleRound::seeded(config.catalog().unwrap(), 42);
        App::new(round, Texts::from(&config))
    }

    fn draw(app: &App) -> String {
        let mut terminal = make_terminal();
        terminal.draw(|frame| render(app, frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol().to_string())
            .collect()
    }

    #[test]
    fn grid_shows_every_slot_label() {
        let app = app();
        let content = draw(&app);
        for n in 1..=9 {
            assert!(content.contains(&format!("image{}", n)), "missing image{}", n);
        }
        assert!(content.contains("Select all images"));
    }

    #[test]
    fn selected_cell_shows_checkmark() {
        let mut app = app();
        assert!(!draw(&app).contains('✓'));
        app.round.toggle(4).unwrap();
        assert!(draw(&app).contains('✓'));
    }

    #[test]
    fn solved_screen_shows_banner() {
        let mut app = app();
        app.screen = Screen::Solved;
        let content = draw(&app);
        assert!(content.contains("Verified"));
        assert!(content.contains("new round"));
    }

    #[test]
    fn info_notice_shows_message() {
        let mut app = app();
        app.screen = Screen::Notice {
            notice: Notice::Info,
            cursor: 0,
        };
        assert!(draw(&app).contains("Info"));
    }

    #[test]
    fn audio_notice_shows_message() {
        let mut app = app();
        app.screen = Screen::Notice {
            notice: Notice::Audio,
            cursor: 0,
        };
        assert!(draw(&app).contains("Audio challenge unavailable"));
    }

    #[test]
    fn all_screens_and_feedback_render_without_panic() {
        let until = Instant::now() + Duration::from_millis(300);
        let screens = vec![
            Screen::Grid { cursor: 8 },
            Screen::Solved,
            Screen::Notice {
                notice: Notice::Info,
                cursor: 3,
            },
            Screen::Notice {
                notice: Notice::Audio,
                cursor: 3,
            },
        ];
        let feedbacks = [None, Some(Feedback::Shake { until }), Some(Feedback::Fade { until })];

        for screen in screens {
            for feedback in feedbacks {
                let mut app = app();
                app.screen = screen.clone();
                app.feedback = feedback;
                let mut terminal = make_terminal();
                terminal
                    .draw(|frame| render(&app, frame))
                    .expect("every screen should render without panic");
            }
        }
    }

    #[test]
    fn tiny_terminal_does_not_panic() {
        let app = app();
        let mut terminal = Terminal::new(TestBackend::new(8, 4)).unwrap();
        terminal.draw(|frame| render(&app, frame)).unwrap();
    }

    #[test]
    fn confetti_stays_inside_area() {
        let area = Rect::new(5, 3, 20, 10);
        let hearts = confetti(7, area);
        assert_eq!(hearts.len(), CONFETTI_COUNT);
        for (x, y, _) in hearts {
            assert!(x >= 5 && x < 25);
            assert!(y >= 3 && y < 13);
        }
    }

    #[test]
    fn confetti_is_deterministic_per_round() {
        let area = Rect::new(0, 0, 40, 10);
        assert_eq!(confetti(3, area), confetti(3, area));
        assert_ne!(confetti(3, area), confetti(4, area));
    }

    #[test]
    fn shifted_clamps_to_width() {
        let area = Rect::new(0, 0, 1, 5);
        let moved = shifted(area, 2);
        assert_eq!(moved.width, 0);
        assert_eq!(moved.x, 1);
    }

    #[test]
    fn help_differs_per_screen() {
        let grid = render_help(&Screen::default());
        let solved = render_help(&Screen::Solved);
        assert_ne!(format!("{:?}", grid), format!("{:?}", solved));
    }
}
