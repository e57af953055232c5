//! Applying live updates from the streaming connection to a feed.

use super::feed::{Direction, Feed};
use crate::model::{FeedItem, ItemId, Post};

/// A push update delivered out of band from the subscription stream.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    /// A new post for the home timeline.
    Insert(Post),
    /// A post was edited; replaces the copy with the same id.
    Edit(Post),
    Delete(ItemId),
    /// Someone interacted with the user. Only logged.
    Notification { kind: String, from: String },
    /// The connection failed. Always the last event of a stream.
    StreamError(String),
}

/// Apply `event` to `feed`. Returns true if the feed changed and needs a
/// redraw.
///
/// Unknown ids for edits and deletes are a silent no-op.
pub fn apply(feed: &mut Feed, event: LiveEvent) -> bool {
    match event {
        LiveEvent::Insert(post) => feed.merge(vec![FeedItem::from(post)], Direction::Newer),
        LiveEvent::Edit(post) => {
            let id = post.id.clone();
            let changed = feed.replace(FeedItem::from(post));
            if !changed {
                tracing::debug!(id = %id, "Edit for post not in feed");
            }
            changed
        }
        LiveEvent::Delete(id) => {
            let changed = feed.remove(&id);
            if !changed {
                tracing::debug!(id = %id, "Delete for post not in feed");
            }
            changed
        }
        LiveEvent::Notification { kind, from } => {
            tracing::info!(kind = %kind, from = %from, "Notification received");
            false
        }
        LiveEvent::StreamError(message) => {
            tracing::warn!(error = %message, "Live update stream error");
            false
        }
    }
}
