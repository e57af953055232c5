//! Domain types for timeline content.
//!
//! - [`status`] - Posts, accounts and their attachments, decoded from the
//!   server's JSON representation
//! - [`item`] - The closed [`FeedItem`] variant that timelines are built from

mod item;
mod status;

pub use item::{FeedItem, ItemId};
pub use status::{
    Account, Card, Field, MediaAttachment, MediaDimensions, MediaMeta, Notification, Poll,
    PollOption, Post, Tag, Visibility,
};
