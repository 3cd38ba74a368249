//! Frequency visualizer component.
//!
//! Draws one column per analysis band, scaled to the area height and colored
//! with a three-stop vertical gradient from the active theme.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::player::BANDS;

/// Column width in cells; bands are separated by a single blank column.
const BAR_WIDTH: usize = 2;

/// A named three-stop color gradient for the visualizer bars.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub name: &'static str,
    /// Gradient stops, top to bottom.
    pub stops: [Color; 3],
    pub accent: Color,
}

const THEMES: &[Theme] = &[
    Theme {
        name: "default",
        stops: [
            Color::Rgb(139, 92, 246),
            Color::Rgb(126, 34, 206),
            Color::Rgb(88, 28, 135),
        ],
        accent: Color::Rgb(139, 92, 246),
    },
    Theme {
        name: "ocean",
        stops: [
            Color::Rgb(56, 189, 248),
            Color::Rgb(14, 165, 233),
            Color::Rgb(3, 105, 161),
        ],
        accent: Color::Rgb(56, 189, 248),
    },
    Theme {
        name: "sunset",
        stops: [
            Color::Rgb(251, 146, 60),
            Color::Rgb(249, 115, 22),
            Color::Rgb(194, 65, 12),
        ],
        accent: Color::Rgb(251, 146, 60),
    },
    Theme {
        name: "forest",
        stops: [
            Color::Rgb(74, 222, 128),
            Color::Rgb(34, 197, 94),
            Color::Rgb(21, 128, 61),
        ],
        accent: Color::Rgb(74, 222, 128),
    },
    Theme {
        name: "midnight",
        stops: [
            Color::Rgb(129, 140, 248),
            Color::Rgb(99, 102, 241),
            Color::Rgb(67, 56, 202),
        ],
        accent: Color::Rgb(129, 140, 248),
    },
];

impl Theme {
    /// Resolve a theme by its config token, falling back to the default.
    pub fn from_token(token: &str) -> Self {
        THEMES
            .iter()
            .copied()
            .find(|theme| theme.name == token)
            .unwrap_or(THEMES[0])
    }

    /// Gradient color for a cell, by its height fraction within the bars
    /// (1.0 = top of the area).
    fn stop_at(&self, fraction: f64) -> Color {
        if fraction > 0.66 {
            self.stops[0]
        } else if fraction > 0.33 {
            self.stops[1]
        } else {
            self.stops[2]
        }
    }
}

/// Render the frequency bars for one spectrum snapshot.
pub fn render_visualizer(frame: &mut Frame, area: Rect, bands: &[f32; BANDS], theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let rows = usize::from(inner.height);
    let total_width = BANDS * (BAR_WIDTH + 1) - 1;
    let pad = usize::from(inner.width).saturating_sub(total_width) / 2;

    // Top to bottom: a cell is lit when the band's scaled height reaches its
    // row; the topmost lit cell uses a half block for a rounded look.
    let heights: Vec<usize> = bands
        .iter()
        .map(|level| (f64::from(level.clamp(0.0, 1.0)) * rows as f64).round() as usize)
        .collect();

    let mut lines = Vec::with_capacity(rows);
    for row in 0..rows {
        let cells_above = rows - row;
        let fraction = cells_above as f64 / rows as f64;
        let color = theme.stop_at(fraction);

        let mut spans = vec![Span::raw(" ".repeat(pad))];
        for (i, &height) in heights.iter().enumerate() {
            let cell = if height >= cells_above {
                if height == cells_above { "▄" } else { "█" }
            } else {
                " "
            };
            spans.push(Span::styled(
                cell.repeat(BAR_WIDTH),
                Style::default().fg(color),
            ));
            if i + 1 < BANDS {
                spans.push(Span::raw(" "));
            }
        }
        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_token_falls_back_to_default() {
        let theme = Theme::from_token("neon");
        assert_eq!(theme.name, "default");
    }

    #[test]
    fn test_every_named_theme_resolves() {
        for name in ["default", "ocean", "sunset", "forest", "midnight"] {
            assert_eq!(Theme::from_token(name).name, name);
        }
    }

    #[test]
    fn test_gradient_stops_cover_range() {
        let theme = Theme::from_token("ocean");
        assert_eq!(theme.stop_at(1.0), theme.stops[0]);
        assert_eq!(theme.stop_at(0.5), theme.stops[1]);
        assert_eq!(theme.stop_at(0.1), theme.stops[2]);
    }
}
