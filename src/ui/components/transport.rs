//! Transport bar component: playback state, position, progress, volume.

use std::time::Duration;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use crate::player::{PlaybackSession, SessionPhase};

use super::Theme;

/// Render the transport bar for the audio session.
pub fn render_transport(frame: &mut Frame, area: Rect, session: &PlaybackSession, theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.accent));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height < 3 {
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // State + times + volume
            Constraint::Length(1), // Spacer
            Constraint::Length(1), // Progress bar
        ])
        .split(inner);

    let info_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(3),  // Play state
            Constraint::Min(10),    // Times
            Constraint::Length(18), // Volume
        ])
        .split(chunks[0]);

    let symbol = Paragraph::new(phase_symbol(session.phase()))
        .style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD));
    frame.render_widget(symbol, info_chunks[0]);

    let times = Line::from(vec![
        Span::styled(
            format_time(session.position()),
            Style::default().fg(Color::White),
        ),
        Span::styled(" / ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format_time(session.duration()),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(times), info_chunks[1]);

    let volume_pct = (session.volume() * 100.0).round() as u8;
    let volume = format!("{} {:>3}%", volume_bar(volume_pct), volume_pct);
    frame.render_widget(
        Paragraph::new(volume).style(Style::default().fg(Color::DarkGray)),
        info_chunks[2],
    );

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(theme.accent).bg(Color::DarkGray))
        .ratio(session.progress())
        .label("");
    frame.render_widget(gauge, chunks[2]);
}

/// Symbol for the session phase.
fn phase_symbol(phase: SessionPhase) -> &'static str {
    match phase {
        SessionPhase::Playing => " ",
        SessionPhase::Paused | SessionPhase::Loaded => " ",
        SessionPhase::Empty => " ",
    }
}

/// Format a duration as MM:SS.
fn format_time(duration: Duration) -> String {
    let total = duration.as_secs();
    format!("{}:{:02}", total / 60, total % 60)
}

/// Render a small volume bar.
fn volume_bar(volume: u8) -> String {
    let filled = usize::from(volume.min(100)) / 10;
    format!("[{}{}]", "█".repeat(filled), "░".repeat(10 - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(Duration::ZERO), "0:00");
        assert_eq!(format_time(Duration::from_secs(29)), "0:29");
        assert_eq!(format_time(Duration::from_secs(61)), "1:01");
        assert_eq!(format_time(Duration::from_secs(600)), "10:00");
    }

    #[test]
    fn test_volume_bar_width_is_stable() {
        for volume in [0, 5, 50, 99, 100] {
            assert_eq!(volume_bar(volume).chars().count(), 12);
        }
        assert_eq!(volume_bar(100), format!("[{}]", "█".repeat(10)));
        assert_eq!(volume_bar(0), format!("[{}]", "░".repeat(10)));
    }
}
