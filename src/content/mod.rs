//! Rich-text handling for post bodies and profile notes.

mod markup;

pub use markup::{parse_content, strip_tags, to_plain_text, unescape, Segment};
