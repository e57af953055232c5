//! Render functions for the TUI.

use crate::app::App;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::{detail, status, timeline};

/// Columns between the list and the detail pane (separator plus padding).
const GUTTER: u16 = 2;

/// Main render function: header, list and detail panes, footer, and the
/// quit prompt on top when it is showing.
pub(super) fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();

    // Guard against zero-width/height to prevent panics
    if area.width < 1 || area.height < 3 {
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(f, app, rows[0]);
    render_panes(f, app, rows[1]);
    status::render(f, app, rows[2]);

    if app.show_quit {
        render_quit_overlay(f);
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let line = Line::from(vec![
        Span::styled("mastty", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::raw(app.stack.breadcrumb()),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

/// Width of the list pane for a total `width`, split `left:right`.
fn split_width(width: u16, left: u16, right: u16) -> u16 {
    let left = u32::from(left.max(1));
    let total = left + u32::from(right.max(1));
    (u32::from(width) * left / total) as u16
}

fn render_panes(f: &mut Frame, app: &mut App, area: Rect) {
    let split = split_width(area.width, app.layout.left_ratio, app.layout.right_ratio);
    let list = Rect {
        width: split,
        ..area
    };
    let detail = Rect {
        x: area.x + split.saturating_add(GUTTER).min(area.width),
        width: area.width.saturating_sub(split + GUTTER),
        ..area
    };

    timeline::render(f, app, list);

    if split < area.width {
        let separator = Rect {
            x: area.x + split,
            width: 1,
            ..area
        };
        let bar = Block::default()
            .borders(Borders::LEFT)
            .border_style(Style::default().fg(Color::DarkGray));
        f.render_widget(bar, separator);
    }

    detail::render(f, app, detail);
}

fn render_quit_overlay(f: &mut Frame) {
    let area = f.area();

    let width = 30u16.min(area.width.saturating_sub(4));
    let height = 5u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let overlay = Rect::new(x, y, width, height);

    if overlay.width < 10 || overlay.height < 3 {
        return;
    }

    f.render_widget(Clear, overlay);
    let paragraph = Paragraph::new("Quit mastty?\n\n(y) Quit  (n) Stay")
        .block(Block::default().borders(Borders::ALL).title(" Confirm "))
        .alignment(Alignment::Center);
    f.render_widget(paragraph, overlay);
}
