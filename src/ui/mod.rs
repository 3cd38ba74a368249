//! Main UI layout and rendering.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::App;

pub mod components;

pub use components::*;

use components::card::CardView;

/// Render the entire UI.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let theme = Theme::from_token(&app.config.user.theme);

    // Main layout: [header] [card] [visualizer] [transport]
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(9),    // Track card
            Constraint::Length(8), // Visualizer
            Constraint::Length(5), // Transport
        ])
        .split(area);

    render_header(frame, main_chunks[0], app, &theme);

    let view = CardView {
        track: app.current_track(),
        index: app.nav.index(),
        total: app.feed.len(),
        saved: app
            .current_track()
            .is_some_and(|track| app.favorites.contains(track.id)),
        direction: app.nav.direction(),
        show_hint: app.show_hint,
        loading: app.is_loading(),
    };
    render_card(frame, main_chunks[1], &view, &theme);

    render_visualizer(frame, main_chunks[2], &app.spectrum, &theme);
    render_transport(frame, main_chunks[3], &app.session, &theme);

    if app.show_help {
        render_help(frame, area);
    }

    if let Some(error) = &app.error_message {
        render_error(frame, area, error);
    }
}

/// Render the header bar: app name on the left, saved count on the right.
fn render_header(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.accent));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(16)])
        .split(inner);

    let title = Line::from(vec![
        Span::styled(
            "swipefm",
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" · endless previews", Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(title), chunks[0]);

    let saved = Paragraph::new(format!("♥ {} saved", app.favorites.len()))
        .style(Style::default().fg(Color::DarkGray))
        .alignment(ratatui::layout::Alignment::Right);
    frame.render_widget(saved, chunks[1]);
}

/// Render the help overlay.
fn render_help(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let help_text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Discovery",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from("  j/↓ or scroll  Next track"),
        Line::from("  k/↑            Previous track"),
        Line::from("  s              Save/unsave current track"),
        Line::from("  r              Restart discovery"),
        Line::from(""),
        Line::from(Span::styled(
            "Playback",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from("  Space          Play/Pause"),
        Line::from("  ,/. or ←/→     Seek backward/forward (5s)"),
        Line::from("  0-9            Jump to 0%-90% of the preview"),
        Line::from("  +/-            Volume up/down"),
        Line::from(""),
        Line::from(Span::styled(
            "Other",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from("  ?              Show this help"),
        Line::from("  x              Clear error message"),
        Line::from("  q              Quit"),
        Line::from(""),
        Line::from(Span::styled(
            "Press Esc or ? to close",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Help")
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, popup_area);
}

/// Render an error message overlay.
fn render_error(frame: &mut Frame, area: Rect, message: &str) {
    let popup_area = centered_rect(60, 20, area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Error")
        .border_style(Style::default().fg(Color::Red));

    let paragraph = Paragraph::new(message)
        .style(Style::default().fg(Color::Red))
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, popup_area);
}

/// Create a centered rectangle.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
