use std::time::Duration;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};

use crate::format::clock_time;
use crate::system::snapshot::Snapshot;
use crate::ui::theme::Theme;

pub fn render(
    frame: &mut Frame,
    area: Rect,
    snapshot: Option<&Snapshot>,
    tick_interval: Duration,
    theme: &Theme,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let captured = snapshot
        .map(|s| format!("Sampled at {}", clock_time(s.timestamp)))
        .unwrap_or_else(|| "Waiting for first sample".to_string());

    let line = Line::from(vec![
        Span::styled(
            " hostpulse ",
            Style::default()
                .fg(theme.header_accent_fg)
                .bg(theme.header_accent_bg)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            format!("Every {} ms", tick_interval.as_millis()),
            Style::default().fg(theme.text_secondary),
        ),
        Span::raw("  "),
        Span::styled(captured, Style::default().fg(theme.text_secondary)),
    ]);
    frame.render_widget(Paragraph::new(line), inner);
}
