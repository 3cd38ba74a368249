//! Track card component: the main content panel for the current feed item.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use unicode_width::UnicodeWidthChar;

use crate::action::NavDirection;
use crate::catalog::Track;

use super::Theme;

/// Everything the card needs from the app, assembled per frame.
pub struct CardView<'a> {
    pub track: Option<&'a Track>,
    pub index: usize,
    pub total: usize,
    pub saved: bool,
    pub direction: NavDirection,
    pub show_hint: bool,
    pub loading: bool,
}

/// Render the current track card.
pub fn render_card(frame: &mut Frame, area: Rect, view: &CardView, theme: &Theme) {
    let title = if view.total > 0 {
        format!(" {} {} / {} ", view.direction.symbol(), view.index + 1, view.total)
    } else {
        String::from(" discover ")
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_alignment(Alignment::Right)
        .border_style(Style::default().fg(theme.accent));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if view.loading {
        let loading = Paragraph::new("Finding previews for you...")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        frame.render_widget(loading, centered_lines(inner, 1));
        return;
    }

    let Some(track) = view.track else {
        let empty = Paragraph::new("Nothing to play. Press r to restart discovery.")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        frame.render_widget(empty, centered_lines(inner, 1));
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // Track info
            Constraint::Length(1), // Hint
        ])
        .split(inner);

    let max_width = usize::from(inner.width.saturating_sub(2));
    let mut lines = vec![
        Line::from(Span::styled(
            format!(" {} ", track.genre),
            Style::default()
                .fg(Color::Black)
                .bg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            truncate_to_width(&track.title, max_width),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            truncate_to_width(&track.artist, max_width),
            Style::default().fg(Color::Cyan),
        )),
    ];

    let mut detail: Vec<Span> = Vec::new();
    if !track.album_name.is_empty() {
        detail.push(Span::styled(
            track.album_name.as_str(),
            Style::default().fg(Color::Yellow),
        ));
    }
    if let Some(year) = track.release_year() {
        if !detail.is_empty() {
            detail.push(Span::styled(" • ", Style::default().fg(Color::DarkGray)));
        }
        detail.push(Span::styled(year, Style::default().fg(Color::DarkGray)));
    }
    if !detail.is_empty() {
        lines.push(Line::from(detail));
    }

    if view.saved {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "♥ saved",
            Style::default().fg(Color::Red),
        )));
    }

    let info = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(info, centered_lines(chunks[0], 7));

    if view.show_hint {
        let hint = Paragraph::new("scroll or j/k to explore")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        frame.render_widget(hint, chunks[1]);
    }
}

/// Cut a string to a display width, appending an ellipsis when shortened.
fn truncate_to_width(text: &str, max_width: usize) -> String {
    let total: usize = text.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= max_width {
        return text.to_string();
    }

    let budget = max_width.saturating_sub(1);
    let mut width = 0usize;
    let mut cut = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if width + w > budget {
            break;
        }
        width += w;
        cut.push(c);
    }
    cut.truncate(cut.trim_end().len());
    cut.push('…');
    cut
}

/// Vertically center `height` lines within `area`.
fn centered_lines(area: Rect, height: u16) -> Rect {
    let height = height.min(area.height);
    let top = (area.height - height) / 2;
    Rect {
        x: area.x,
        y: area.y + top,
        width: area.width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_keeps_fitting_text() {
        assert_eq!(truncate_to_width("Short", 10), "Short");
        assert_eq!(truncate_to_width("Exactly 10", 10), "Exactly 10");
    }

    #[test]
    fn test_truncate_appends_ellipsis() {
        let cut = truncate_to_width("A Fairly Long Track Title", 10);
        assert!(cut.ends_with('…'));
        let width: usize = cut.chars().map(|c| c.width().unwrap_or(0)).sum();
        assert!(width <= 10);
    }
}
