pub mod header;
pub mod panels;
pub mod statusbar;
pub mod theme;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};

use crate::app::App;

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(chunks[1]);

    let snapshot = app.snapshot.as_ref();

    header::render(frame, chunks[0], snapshot, app.tick_interval, &app.theme);
    panels::render_cpu(frame, columns[0], snapshot.map(|s| &s.cpu), &app.theme);
    panels::render_memory(frame, columns[1], snapshot.map(|s| &s.memory), &app.theme);
    panels::render_accelerator(
        frame,
        columns[2],
        snapshot.map(|s| &s.accelerator),
        app.accelerator_enabled,
        &app.theme,
    );
    statusbar::render(frame, chunks[2], app.active_status(), &app.theme);
}
