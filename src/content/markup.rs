//! Server-rendered post HTML to display segments.
//!
//! Post bodies use a small HTML subset (`<p>`, `<br>`, `<a>`, `<span>`).
//! We keep paragraph and line breaks and links, and drop every other tag.

use std::path::Path;

use crate::model::Tag;
use crate::util::strip_control_chars;

/// A run of text, optionally a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub link: Option<String>,
}

impl Segment {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            link: None,
        }
    }

    fn link(text: impl Into<String>, href: String) -> Self {
        Self {
            text: text.into(),
            link: Some(href),
        }
    }
}

/// Convert post HTML into segments.
///
/// - `<br>` becomes `"\n"` and `</p>` becomes `"\n\n"`
/// - `<a href=..>` becomes a link segment; links to one of the post's
///   `tags` render as `#tag`
/// - other tags are removed and entities decoded
///
/// Trailing blank lines are dropped. Malformed markup never fails: an
/// unterminated tag is kept as text.
pub fn parse_content(html: &str, tags: &[Tag]) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut rest = html;

    while !rest.is_empty() {
        let Some(open) = rest.find('<') else {
            push_text(&mut segments, rest);
            break;
        };
        push_text(&mut segments, &rest[..open]);

        let Some(close) = rest[open..].find('>').map(|i| open + i) else {
            // Unterminated tag: keep it verbatim
            push_text(&mut segments, &rest[open..]);
            break;
        };
        let tag = &rest[open..=close];
        let after = &rest[close + 1..];

        if is_anchor(tag) {
            match after.find("</a>") {
                Some(end) => {
                    segments.push(anchor_segment(tag, &after[..end], tags));
                    rest = &after[end + "</a>".len()..];
                }
                None => rest = after,
            }
            continue;
        }

        match tag_name(tag).as_str() {
            "br" => segments.push(Segment::text("\n")),
            "/p" => segments.push(Segment::text("\n\n")),
            _ => {}
        }
        rest = after;
    }

    trim_trailing_breaks(&mut segments);
    segments
}

/// Plain text of `html`, for places that cannot show links.
pub fn to_plain_text(html: &str, tags: &[Tag]) -> String {
    parse_content(html, tags)
        .into_iter()
        .map(|segment| segment.text)
        .collect()
}

fn push_text(segments: &mut Vec<Segment>, raw: &str) {
    if raw.is_empty() {
        return;
    }
    let text = unescape(raw);
    let text = strip_control_chars(&text).into_owned();
    if !text.is_empty() {
        segments.push(Segment::text(text));
    }
}

fn is_anchor(tag: &str) -> bool {
    tag.len() > 3 && tag.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("<a "))
}

/// Lowercased element name, with a leading `/` for closing tags.
fn tag_name(tag: &str) -> String {
    tag.trim_start_matches('<')
        .trim_end_matches('>')
        .trim_end_matches('/')
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

fn anchor_segment(open_tag: &str, inner: &str, tags: &[Tag]) -> Segment {
    let href = attribute(open_tag, "href").map(unescape).unwrap_or_default();

    if let Some(name) = hashtag_name(&href, tags) {
        return Segment::link(format!("#{name}"), href);
    }

    let text = strip_control_chars(&unescape(&strip_tags(inner))).into_owned();
    Segment::link(text, href)
}

/// The post's tag whose name matches the last path segment of `href`.
fn hashtag_name<'a>(href: &str, tags: &'a [Tag]) -> Option<&'a str> {
    let parsed = url::Url::parse(href).ok()?;
    let last = Path::new(parsed.path()).file_name()?.to_str()?;
    tags.iter()
        .find(|tag| tag.name.eq_ignore_ascii_case(last))
        .map(|tag| tag.name.as_str())
}

/// Value of a double-quoted attribute.
fn attribute<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!("{name}=\"");
    let start = tag.find(&needle)? + needle.len();
    let len = tag[start..].find('"')?;
    Some(&tag[start..start + len])
}

/// Remove every `<...>` tag, keeping the text between them.
pub fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Decode the HTML entities servers emit in post bodies.
///
/// Named entities beyond the common handful are left as-is.
pub fn unescape(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];
        match candidate.find(';').filter(|end| *end <= 10) {
            Some(end) => match decode_entity(&candidate[1..end]) {
                Some(c) => {
                    out.push(c);
                    rest = &candidate[end + 1..];
                }
                None => {
                    out.push('&');
                    rest = &candidate[1..];
                }
            },
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let numeric = entity.strip_prefix('#')?;
            let code = match numeric.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => numeric.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

fn trim_trailing_breaks(segments: &mut Vec<Segment>) {
    while segments
        .last()
        .is_some_and(|s| s.link.is_none() && s.text.trim().is_empty())
    {
        segments.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tag(name: &str) -> Tag {
        Tag {
            name: name.to_string(),
            url: format!("https://example.social/tags/{name}"),
        }
    }

    fn texts(segments: &[Segment]) -> Vec<&str> {
        segments.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn test_paragraphs_and_breaks() {
        let segments = parse_content("<p>one<br>two</p><p>three</p>", &[]);
        assert_eq!(texts(&segments), vec!["one", "\n", "two", "\n\n", "three"]);
    }

    #[test]
    fn test_self_closing_break() {
        let segments = parse_content("a<br />b", &[]);
        assert_eq!(texts(&segments), vec!["a", "\n", "b"]);
    }

    #[test]
    fn test_link_strips_inner_spans() {
        let html = r#"<p>see <a href="https://blog.example/x" rel="nofollow"><span class="invisible">https://</span><span>blog.example/x</span></a></p>"#;
        let segments = parse_content(html, &[]);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].text, "https://blog.example/x");
        assert_eq!(segments[1].link.as_deref(), Some("https://blog.example/x"));
    }

    #[test]
    fn test_known_hashtag_renders_as_tag() {
        let html = r##"<a href="https://example.social/tags/rustlang" class="mention hashtag">#<span>RustLang</span></a>"##;
        let segments = parse_content(html, &[tag("rustlang")]);
        assert_eq!(segments[0].text, "#rustlang");
        assert!(segments[0].link.is_some());
    }

    #[test]
    fn test_unknown_hashtag_keeps_link_text() {
        let html = r#"<a href="https://example.social/tags/other">#<span>other</span></a>"#;
        let segments = parse_content(html, &[tag("rustlang")]);
        assert_eq!(segments[0].text, "#other");
    }

    #[test]
    fn test_entities_unescaped() {
        let segments = parse_content("<p>Tom &amp; Jerry &lt;3 &#39;hi&#x27; &bogus;</p>", &[]);
        assert_eq!(texts(&segments), vec!["Tom & Jerry <3 'hi' &bogus;"]);
    }

    #[test]
    fn test_malformed_markup_is_kept_as_text() {
        let segments = parse_content("ok <b unterminated", &[]);
        assert_eq!(texts(&segments), vec!["ok ", "<b unterminated"]);

        // Anchor without a closing tag is skipped, its text kept
        let segments = parse_content(r#"<a href="https://x.example">dangling"#, &[]);
        assert_eq!(texts(&segments), vec!["dangling"]);
    }

    #[test]
    fn test_multibyte_tag_names_are_dropped() {
        let segments = parse_content("<p>caf<xé> ok</p>", &[]);
        assert_eq!(texts(&segments), vec!["caf", " ok"]);

        let segments = parse_content("<é>x</é><aé>y", &[]);
        assert_eq!(texts(&segments), vec!["x", "y"]);
    }

    #[test]
    fn test_plain_text_and_strip_tags() {
        assert_eq!(
            to_plain_text("<p>hello <em>there</em></p><p>bye</p>", &[]),
            "hello there\n\nbye"
        );
        assert_eq!(strip_tags("<span>a</span>b<br>"), "ab");
    }
}
