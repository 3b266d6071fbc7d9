use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Gauge, Paragraph, Wrap};

use crate::format::{format_bytes, format_mib, format_percent, truncate_unicode};
use crate::system::snapshot::{Accelerator, AcceleratorInfo, CpuUsage, MemoryUsage};
use crate::ui::theme::{GaugeColors, Theme};

const GAUGE_HEIGHT: u16 = 3;

fn panel_block<'a>(title: &'a str, theme: &Theme) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border))
        .title(Span::styled(
            format!(" {title} "),
            Style::default()
                .fg(theme.text_secondary)
                .add_modifier(Modifier::BOLD),
        ))
}

/// Splits a panel into a gauge on top and detail text below.
fn gauge_and_details(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(GAUGE_HEIGHT), Constraint::Min(0)])
        .split(area);
    (chunks[0], chunks[1])
}

fn render_gauge(frame: &mut Frame, area: Rect, ratio: f64, label: String, colors: GaugeColors) {
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::NONE))
        .gauge_style(Style::default().fg(colors.used).bg(colors.free))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(label);
    frame.render_widget(gauge, area);
}

fn detail_line<'a>(label: &'a str, value: String, theme: &Theme) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{label:<7}"), Style::default().fg(theme.text_secondary)),
        Span::styled(value, Style::default().fg(theme.text_primary)),
    ])
}

fn render_placeholder(frame: &mut Frame, area: Rect, text: &str, theme: &Theme) {
    let paragraph = Paragraph::new(text.to_string())
        .alignment(Alignment::Center)
        .style(Style::default().fg(theme.text_secondary));
    frame.render_widget(paragraph, area);
}

pub fn render_cpu(frame: &mut Frame, area: Rect, cpu: Option<&CpuUsage>, theme: &Theme) {
    let block = panel_block("CPU", theme);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(cpu) = cpu else {
        render_placeholder(frame, inner, "Waiting for data", theme);
        return;
    };

    let (gauge_area, details_area) = gauge_and_details(inner);
    render_gauge(
        frame,
        gauge_area,
        cpu.used_percent as f64 / 100.0,
        format!("{} used", format_percent(cpu.used_percent as f64)),
        theme.cpu,
    );

    let lines = vec![
        detail_line("Used", format_percent(cpu.used_percent as f64), theme),
        detail_line("Free", format_percent(cpu.free_percent() as f64), theme),
    ];
    frame.render_widget(Paragraph::new(lines), details_area);
}

pub fn render_memory(frame: &mut Frame, area: Rect, memory: Option<&MemoryUsage>, theme: &Theme) {
    let block = panel_block("Memory", theme);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(memory) = memory else {
        render_placeholder(frame, inner, "Waiting for data", theme);
        return;
    };

    let (gauge_area, details_area) = gauge_and_details(inner);
    let ratio = memory.used_ratio();
    render_gauge(
        frame,
        gauge_area,
        ratio,
        format!("{} used", format_percent(ratio * 100.0)),
        theme.memory,
    );

    let lines = vec![
        detail_line("Total", format_bytes(memory.total_bytes), theme),
        detail_line("Used", format_bytes(memory.used_bytes), theme),
        detail_line("Free", format_bytes(memory.free_bytes), theme),
    ];
    frame.render_widget(Paragraph::new(lines), details_area);
}

/// `enabled` is false when accelerator sampling is switched off in the configuration.
pub fn render_accelerator(
    frame: &mut Frame,
    area: Rect,
    accelerator: Option<&Accelerator>,
    enabled: bool,
    theme: &Theme,
) {
    let block = panel_block("GPU", theme);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match accelerator {
        None => render_placeholder(frame, inner, "Waiting for data", theme),
        Some(Accelerator::Present(info)) => render_reading(frame, inner, info, theme),
        Some(Accelerator::Absent) if !enabled => {
            render_placeholder(frame, inner, "GPU sampling disabled", theme)
        }
        Some(Accelerator::Absent) => render_placeholder(frame, inner, "GPU not found", theme),
        Some(Accelerator::Error { message }) => {
            let lines = vec![
                Line::from(Span::styled(
                    "GPU information unavailable",
                    Style::default()
                        .fg(theme.status_err)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    message.as_str(),
                    Style::default().fg(theme.text_secondary),
                )),
            ];
            frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
        }
    }
}

fn render_reading(frame: &mut Frame, area: Rect, info: &AcceleratorInfo, theme: &Theme) {
    let (gauge_area, details_area) = gauge_and_details(area);
    render_gauge(
        frame,
        gauge_area,
        info.load_percent / 100.0,
        format!("{} load", format_percent(info.load_percent)),
        theme.accelerator,
    );

    let name_width = (details_area.width as usize).saturating_sub(7);
    let lines = vec![
        detail_line("Name", truncate_unicode(&info.name, name_width), theme),
        detail_line("Total", format_mib(info.memory_total_mib), theme),
        detail_line("Used", format_mib(info.memory_used_mib), theme),
        detail_line("Idle", format_percent(info.free_load_percent()), theme),
    ];
    frame.render_widget(Paragraph::new(lines), details_area);
}
