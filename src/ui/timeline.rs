use crate::app::{App, Focus};
use crate::model::FeedItem;
use crate::util::{format_timestamp, truncate_to_width};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::Line,
    widgets::Paragraph,
    Frame,
};

/// Below this width rows show only the time of day.
const COMPACT_WIDTH: u16 = 60;

/// One list row: `timestamp kind @handle`.
///
/// Kind is `♺` for a boost and `↩` for a reply.
pub(super) fn row_text(item: &FeedItem, compact: bool) -> String {
    match item {
        FeedItem::Post(post) => {
            let kind = if post.is_boost() {
                "♺"
            } else if post.is_reply() {
                "↩"
            } else {
                " "
            };
            format!(
                "{} {} @{}",
                format_timestamp(post.created_at, compact),
                kind,
                post.account.acct
            )
        }
        FeedItem::Account(account) => format!("@{}", account.acct),
    }
}

/// Render the timeline list panel
pub(super) fn render(f: &mut Frame, app: &mut App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }
    app.list_rows = area.height as usize;

    let Some(feed) = app.active_feed().filter(|feed| !feed.is_empty()) else {
        f.render_widget(Paragraph::new("Loading..."), area);
        return;
    };

    let compact = area.width < COMPACT_WIDTH;
    let focused = app.focus == Focus::List;
    let selected = feed.selected_index();

    let lines: Vec<Line> = feed
        .items()
        .iter()
        .enumerate()
        .skip(feed.scroll_offset())
        .take(area.height as usize)
        .map(|(i, item)| {
            let text = row_text(item, compact);
            let text = truncate_to_width(&text, area.width as usize).into_owned();
            let style = if focused && selected == Some(i) {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            Line::styled(text, style)
        })
        .collect();

    f.render_widget(Paragraph::new(lines), area);
}
