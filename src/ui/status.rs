use crate::app::App;
use crate::keybindings::Action;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;

/// Actions advertised in the footer when nothing else is showing.
const HINTS: &[Action] = &[
    Action::OpenThread,
    Action::OpenAccount,
    Action::OpenPost,
    Action::OpenCard,
    Action::Refresh,
    Action::CycleFocus,
    Action::Quit,
];

/// Render the status bar
pub(super) fn render(f: &mut Frame, app: &App, area: Rect) {
    // Guard against zero-width/height areas
    if area.width < 1 || area.height < 1 {
        return;
    }

    let text: Cow<'_, str> = if app.loading {
        Cow::Borrowed("Loading...")
    } else if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else {
        Cow::Owned(hint_line(app))
    };

    let style = Style::default().bg(Color::DarkGray).fg(Color::White);
    f.render_widget(Paragraph::new(text).style(style), area);
}

fn hint_line(app: &App) -> String {
    HINTS
        .iter()
        .filter_map(|&action| {
            let key = app.keybindings.key_for(action)?;
            Some(format!("[{}] {}", key, action.describe()))
        })
        .collect::<Vec<_>>()
        .join("  ")
}
