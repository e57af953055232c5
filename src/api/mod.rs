//! Server access.
//!
//! - [`client`] - [`MastodonClient`], the REST implementation of [`FeedSource`]
//! - [`streaming`] - Server-sent event decoding for live updates
//! - [`error`] - [`ApiError`]
//!
//! The rest of the crate only sees the [`FeedSource`] trait so tests can
//! drive the app with canned data.

mod client;
mod error;
pub mod streaming;

pub use client::MastodonClient;
pub use error::ApiError;

use futures::future::BoxFuture;
use futures::stream::BoxStream;

use crate::model::{Account, ItemId, Post};
use crate::timeline::LiveEvent;

/// Pagination bounds for a timeline request.
///
/// Both ids are exclusive. An empty cursor asks for the newest page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursor {
    /// Only return items older than this id.
    pub max_id: Option<ItemId>,
    /// Only return items newer than this id.
    pub since_id: Option<ItemId>,
    pub limit: Option<u32>,
}

impl Cursor {
    pub fn first_page(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn older_than(id: ItemId, limit: u32) -> Self {
        Self {
            max_id: Some(id),
            since_id: None,
            limit: Some(limit),
        }
    }

    pub fn newer_than(id: ItemId, limit: u32) -> Self {
        Self {
            max_id: None,
            since_id: Some(id),
            limit: Some(limit),
        }
    }
}

/// Posts surrounding a post in its reply tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThreadContext {
    pub ancestors: Vec<Post>,
    pub descendants: Vec<Post>,
}

/// Everything the app needs from the server.
///
/// Implementations must be cheap to share behind an `Arc`; every call is
/// made from a spawned task.
pub trait FeedSource: Send + Sync {
    /// Posts from the authenticated user's home timeline, newest first.
    fn home_timeline(&self, cursor: Cursor) -> BoxFuture<'_, Result<Vec<Post>, ApiError>>;

    fn status_context(&self, id: &ItemId) -> BoxFuture<'_, Result<ThreadContext, ApiError>>;

    fn account(&self, id: &ItemId) -> BoxFuture<'_, Result<Account, ApiError>>;

    /// The account the access token belongs to. Used to verify credentials.
    fn current_account(&self) -> BoxFuture<'_, Result<Account, ApiError>>;

    fn account_statuses(
        &self,
        id: &ItemId,
        cursor: Cursor,
    ) -> BoxFuture<'_, Result<Vec<Post>, ApiError>>;

    /// Open the live update subscription.
    ///
    /// The stream ends when the connection does; a transport failure is
    /// reported as a final [`LiveEvent::StreamError`].
    fn subscribe_live_updates(&self) -> BoxStream<'static, LiveEvent>;
}
