use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Account, Post};

/// Server-assigned identifier for a post or an account.
///
/// Identifiers are opaque strings. They are only compared for equality;
/// ordering between identifiers is decided by the server via pagination
/// bounds, never locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single row of a timeline.
///
/// Renderers match on the variant; there is no open trait for row kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedItem {
    Post(Box<Post>),
    Account(Box<Account>),
}

impl FeedItem {
    /// Stable identifier, unique within one feed.
    pub fn id(&self) -> &ItemId {
        match self {
            FeedItem::Post(post) => &post.id,
            FeedItem::Account(account) => &account.id,
        }
    }

    pub fn as_post(&self) -> Option<&Post> {
        match self {
            FeedItem::Post(post) => Some(post),
            FeedItem::Account(_) => None,
        }
    }

    pub fn as_account(&self) -> Option<&Account> {
        match self {
            FeedItem::Account(account) => Some(account),
            FeedItem::Post(_) => None,
        }
    }
}

impl From<Post> for FeedItem {
    fn from(post: Post) -> Self {
        FeedItem::Post(Box::new(post))
    }
}

impl From<Account> for FeedItem {
    fn from(account: Account) -> Self {
        FeedItem::Account(Box::new(account))
    }
}
