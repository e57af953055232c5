//! Detail pane: the selected post, or an account summary.
//!
//! Text and images are stacked top to bottom by [`Column`], which hands out
//! rows until the pane is full. Wrapped text is measured with
//! `Paragraph::line_count` so images below it start on the right row.

use crate::app::App;
use crate::content::{parse_content, to_plain_text, Segment};
use crate::model::{Account, FeedItem, Poll, Post};
use crate::util::{format_count, format_time_since, strip_control_chars};
use chrono::{Local, Utc};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Paragraph, Wrap},
    Frame,
};

use super::tile::draw_image;

const POST_AVATAR: (u16, u16) = (6, 3);
const ACCOUNT_AVATAR: (u16, u16) = (24, 12);
/// Media height when the server sent no dimensions.
const DEFAULT_MEDIA_ROWS: u16 = 10;

/// Render the detail pane
pub(super) fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }
    match app.selected_item() {
        Some(FeedItem::Post(post)) => render_post(f, app, post, area),
        Some(FeedItem::Account(account)) => render_account(f, app, account, area),
        // An account with no posts still shows who it is
        None => {
            if let Some(account) = app.active_feed().and_then(|feed| feed.scope_account()) {
                render_account(f, app, account, area);
            }
        }
    }
}

/// Vertical stacking cursor inside a pane.
struct Column {
    area: Rect,
    y: u16,
}

impl Column {
    fn new(area: Rect) -> Self {
        Self { area, y: 0 }
    }

    fn remaining(&self) -> u16 {
        self.area.height.saturating_sub(self.y)
    }

    fn skip(&mut self, rows: u16) {
        self.y = self.y.saturating_add(rows).min(self.area.height);
    }

    /// Reserve up to `rows` full-width rows.
    fn take(&mut self, rows: u16) -> Option<Rect> {
        let rows = rows.min(self.remaining());
        if rows == 0 {
            return None;
        }
        let rect = Rect::new(self.area.x, self.area.y + self.y, self.area.width, rows);
        self.y += rows;
        Some(rect)
    }

    fn lines(&mut self, f: &mut Frame, lines: Vec<Line<'static>>) {
        let rows = u16::try_from(lines.len()).unwrap_or(u16::MAX);
        if let Some(rect) = self.take(rows) {
            f.render_widget(Paragraph::new(lines), rect);
        }
    }

    fn line(&mut self, f: &mut Frame, line: impl Into<Line<'static>>) {
        self.lines(f, vec![line.into()]);
    }

    /// Word-wrapped text, taking as many rows as it wraps to.
    fn wrapped(&mut self, f: &mut Frame, text: Text<'static>) {
        let paragraph = wrapped_paragraph(text);
        let rows = u16::try_from(paragraph.line_count(self.area.width)).unwrap_or(u16::MAX);
        if let Some(rect) = self.take(rows) {
            f.render_widget(paragraph, rect);
        }
    }
}

// ============================================================================
// Post
// ============================================================================

fn render_post(f: &mut Frame, app: &App, post: &Post, area: Rect) {
    let mut col = Column::new(area);
    let shown = post.original();

    if post.is_boost() {
        col.line(f, format!("Boosted by @{}", post.account.acct));
        col.skip(1);
    } else if post.is_reply() {
        col.line(f, "Continued thread");
        col.skip(1);
    }

    let (avatar_cols, avatar_rows) = POST_AVATAR;
    if let Some(header) = col.take(avatar_rows) {
        if header.width > avatar_cols {
            let avatar = Rect {
                width: avatar_cols,
                ..header
            };
            draw_image(f, app, &shown.account.avatar_static, avatar);
        }
        let meta = Rect {
            x: header.x + avatar_cols + 1,
            width: header.width.saturating_sub(avatar_cols + 1),
            ..header
        };
        f.render_widget(Paragraph::new(post_meta_lines(shown)), meta);
    }
    col.skip(1);

    if shown.sensitive {
        col.line(f, "⚠ Sensitive");
        col.skip(1);
    }

    let segments = parse_content(&shown.content, &shown.tags);
    col.wrapped(f, segment_text(&segments));

    if let Some(poll) = &shown.poll {
        col.skip(1);
        col.lines(f, poll_lines(poll).into_iter().map(Line::from).collect());
    }

    if let Some(card) = shown.card.as_ref() {
        col.skip(1);
        if !card.url.is_empty() {
            let label = if card.title.is_empty() {
                &card.url
            } else {
                &card.title
            };
            col.line(
                f,
                Line::from(vec![
                    Span::raw("↗ "),
                    Span::styled(strip_control_chars(label).into_owned(), link_style()),
                ]),
            );
            col.skip(1);
        }
        if let Some(image) = card.image.as_deref().filter(|url| !url.is_empty()) {
            let dims = (card.width > 0).then_some((card.width, card.height));
            if let Some(rect) = col.take(media_rows(area.width, dims)) {
                draw_image(f, app, image, rect);
            }
        }
    }

    for media in &shown.media_attachments {
        let Some(url) = media.image_url() else {
            continue;
        };
        col.skip(1);
        if let Some(rect) = col.take(media_rows(area.width, media.dimensions())) {
            draw_image(f, app, url, rect);
        }
    }
}

fn post_meta_lines(post: &Post) -> Vec<Line<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let mut name = vec![
        Span::styled(strip_control_chars(post.account.name()).into_owned(), bold),
        Span::styled(format!(" ({})", post.account.acct), bold),
    ];
    if post.account.bot {
        name.push(Span::raw(" · Automated"));
    }

    vec![
        Line::from(name),
        Line::from(format!(
            "{} · {}",
            format_time_since(post.created_at, Utc::now()),
            title_case(post.visibility.as_str())
        )),
        Line::from(format!(
            "{} replies · {} boosts · {} favorites",
            post.replies_count, post.reblogs_count, post.favourites_count
        )),
    ]
}

/// Poll options with vote markers, and percentages once the user voted.
fn poll_lines(poll: &Poll) -> Vec<String> {
    let voted = poll.voted.unwrap_or(false);
    let indicator = if poll.multiple { "☐" } else { "○" };
    let voters = poll.voters_count.unwrap_or(0);

    let mut lines = vec!["Poll".to_string()];
    for (i, option) in poll.options.iter().enumerate() {
        let prefix = if poll.own_votes.contains(&i) {
            "✓"
        } else {
            indicator
        };
        let votes = if voted {
            let pct = if voters > 0 {
                option.votes_count.unwrap_or(0) as f64 / voters as f64 * 100.0
            } else {
                0.0
            };
            format!("{:.0}%", pct)
        } else {
            String::new()
        };
        lines.push(format!(
            "{} {} {}",
            prefix,
            votes,
            strip_control_chars(&option.title)
        ));
    }
    if voted {
        lines.push(format!("Total: {}", voters));
    }
    lines
}

/// Rows for an image `width` columns wide. Cells are about twice as tall
/// as wide, hence the halving.
fn media_rows(width: u16, dims: Option<(u32, u32)>) -> u16 {
    match dims {
        Some((w, h)) if w > 0 => {
            let rows = f64::from(width) * f64::from(h) / f64::from(w) * 0.5;
            (rows as u16).max(1)
        }
        _ => DEFAULT_MEDIA_ROWS,
    }
}

// ============================================================================
// Account
// ============================================================================

fn render_account(f: &mut Frame, app: &App, account: &Account, area: Rect) {
    let mut col = Column::new(area);
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let (avatar_cols, avatar_rows) = ACCOUNT_AVATAR;
    if let Some(header) = col.take(avatar_rows) {
        if header.width > avatar_cols {
            let avatar = Rect {
                width: avatar_cols,
                ..header
            };
            draw_image(f, app, &account.avatar_static, avatar);
        }

        let mut meta = vec![
            Line::styled(strip_control_chars(account.name()).into_owned(), bold),
            Line::styled(format!("@{}", account.acct), bold),
        ];
        if account.bot {
            meta.push(Line::from("Automated"));
        }
        if let Some(created) = account.created_at {
            meta.push(Line::from(format!(
                "Joined {}",
                created.with_timezone(&Local).format("%b %-d, %Y")
            )));
        }
        meta.push(Line::default());
        meta.push(Line::from(format!("{} posts", format_count(account.statuses_count))));
        meta.push(Line::from(format!(
            "{} following",
            format_count(account.following_count)
        )));
        meta.push(Line::from(format!(
            "{} followers",
            format_count(account.followers_count)
        )));

        let rect = Rect {
            x: header.x + avatar_cols + 1,
            width: header.width.saturating_sub(avatar_cols + 1),
            ..header
        };
        f.render_widget(Paragraph::new(meta), rect);
    }

    for field in &account.fields {
        let value = to_plain_text(&field.value, &[]);
        let value = value.split_whitespace().collect::<Vec<_>>().join(" ");
        let mut spans = Vec::with_capacity(3);
        if field.verified_at.is_some() {
            spans.push(Span::styled("✓ ", Style::default().fg(Color::Green)));
        }
        spans.push(Span::styled(
            format!("{}: ", strip_control_chars(&field.name)),
            bold,
        ));
        let value_style = if value.starts_with("https://") || value.starts_with("http://") {
            link_style()
        } else {
            Style::default()
        };
        spans.push(Span::styled(value, value_style));
        col.line(f, Line::from(spans));
    }
    col.skip(1);

    let bio = parse_content(&account.note, &[]);
    col.wrapped(f, segment_text(&bio));
}

// ============================================================================
// Text helpers
// ============================================================================

fn link_style() -> Style {
    Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::UNDERLINED)
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn wrapped_paragraph(text: Text<'static>) -> Paragraph<'static> {
    Paragraph::new(text).wrap(Wrap { trim: false })
}

/// Styled text for `segments`, starting a new line at every `\n`.
fn segment_text(segments: &[Segment]) -> Text<'static> {
    let mut lines = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();

    for segment in segments {
        let style = if segment.link.is_some() {
            link_style()
        } else {
            Style::default()
        };
        for (i, part) in segment.text.split('\n').enumerate() {
            if i > 0 {
                lines.push(Line::from(std::mem::take(&mut current)));
            }
            if !part.is_empty() {
                current.push(Span::styled(part.to_string(), style));
            }
        }
    }
    if !current.is_empty() {
        lines.push(Line::from(current));
    }
    Text::from(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PollOption;
    use pretty_assertions::assert_eq;

    fn text_of(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    fn seg(text: &str) -> Segment {
        Segment {
            text: text.to_string(),
            link: None,
        }
    }

    #[test]
    fn test_newlines_start_new_lines() {
        let text = segment_text(&[seg("one\n\ntwo")]);
        assert_eq!(text_of(&text.lines), vec!["one", "", "two"]);
    }

    #[test]
    fn test_segments_join_on_one_line() {
        let segments = vec![
            seg("see "),
            Segment {
                text: "#rust".to_string(),
                link: Some("https://social.example/tags/rust".to_string()),
            },
            seg(" now\nbye"),
        ];
        let text = segment_text(&segments);
        assert_eq!(text_of(&text.lines), vec!["see #rust now", "bye"]);
        assert_eq!(text.lines[0].spans[1].style, link_style());
        assert_eq!(text.lines[0].spans[0].style, Style::default());
    }

    #[test]
    fn test_wrapped_height_counts_wrapped_rows() {
        let paragraph = wrapped_paragraph(segment_text(&[seg("the quick brown fox")]));
        assert_eq!(paragraph.line_count(10), 2);
        assert_eq!(paragraph.line_count(40), 1);

        // Words wider than the pane are broken across rows
        let paragraph = wrapped_paragraph(segment_text(&[seg("abcdefghij")]));
        assert_eq!(paragraph.line_count(4), 3);
    }

    #[test]
    fn test_media_rows() {
        // 40 columns of a 2:1 image is 20 pixel rows, 10 cell rows
        assert_eq!(media_rows(40, Some((200, 100))), 10);
        assert_eq!(media_rows(40, Some((1000, 1))), 1);
        assert_eq!(media_rows(40, None), DEFAULT_MEDIA_ROWS);
        assert_eq!(media_rows(40, Some((0, 100))), DEFAULT_MEDIA_ROWS);
    }

    #[test]
    fn test_poll_lines_after_voting() {
        let poll = Poll {
            options: vec![
                PollOption {
                    title: "Yes".to_string(),
                    votes_count: Some(3),
                },
                PollOption {
                    title: "No".to_string(),
                    votes_count: Some(1),
                },
            ],
            multiple: false,
            voted: Some(true),
            own_votes: vec![0],
            voters_count: Some(4),
        };
        assert_eq!(
            poll_lines(&poll),
            vec!["Poll", "✓ 75% Yes", "○ 25% No", "Total: 4"]
        );
    }

    #[test]
    fn test_poll_lines_before_voting() {
        let poll = Poll {
            options: vec![PollOption {
                title: "Maybe".to_string(),
                votes_count: None,
            }],
            multiple: true,
            voted: None,
            own_votes: Vec::new(),
            voters_count: None,
        };
        assert_eq!(poll_lines(&poll), vec!["Poll", "☐  Maybe"]);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("unlisted"), "Unlisted");
        assert_eq!(title_case(""), "");
    }
}
