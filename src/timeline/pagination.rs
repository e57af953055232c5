//! Fetch planning and merge for paged timelines.
//!
//! Planning happens on the UI task and produces a self-contained
//! [`PageRequest`]; the fetch runs on a spawned task; the result is merged
//! back on the UI task with [`apply_page`], which re-checks that the target
//! feed still exists.

use super::feed::{Direction, FeedId};
use super::stack::{FeedStack, BASE_FEED};
use crate::api::{ApiError, Cursor, FeedSource};
use crate::model::{FeedItem, ItemId, Post};

/// Which endpoint a feed pages from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSource {
    Home,
    Account(ItemId),
}

/// One planned page fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub feed: FeedId,
    pub source: PageSource,
    pub cursor: Cursor,
    pub direction: Direction,
}

impl PageRequest {
    /// First page of the home timeline, for the empty base feed at startup.
    pub fn initial(limit: u32) -> Self {
        Self {
            feed: BASE_FEED,
            source: PageSource::Home,
            cursor: Cursor::first_page(limit),
            direction: Direction::Older,
        }
    }
}

/// Plan the next older page for the active feed.
///
/// The base feed pages through the home timeline and an account feed
/// through that account's posts. Threads are complete when pushed and
/// have no older pages. Empty feeds have no boundary to page from.
pub fn plan_load_more(stack: &FeedStack, limit: u32) -> Option<PageRequest> {
    let feed = stack.active()?;
    let source = if feed.id() == BASE_FEED {
        PageSource::Home
    } else {
        PageSource::Account(feed.scope_account()?.id.clone())
    };
    let boundary = feed.boundary(Direction::Older)?.clone();

    Some(PageRequest {
        feed: feed.id(),
        source,
        cursor: Cursor::older_than(boundary, limit),
        direction: Direction::Older,
    })
}

/// Plan a fetch of posts newer than the base feed's first item.
pub fn plan_refresh(stack: &FeedStack, limit: u32) -> Option<PageRequest> {
    let feed = stack.base()?;
    let boundary = feed.boundary(Direction::Newer)?.clone();

    Some(PageRequest {
        feed: feed.id(),
        source: PageSource::Home,
        cursor: Cursor::newer_than(boundary, limit),
        direction: Direction::Newer,
    })
}

/// Run a planned fetch.
pub async fn fetch(source: &dyn FeedSource, request: &PageRequest) -> Result<Vec<Post>, ApiError> {
    match &request.source {
        PageSource::Home => source.home_timeline(request.cursor.clone()).await,
        PageSource::Account(id) => source.account_statuses(id, request.cursor.clone()).await,
    }
}

/// Merge a fetched page into its target feed.
///
/// Returns false when nothing new arrived or the target feed was popped
/// while the fetch was in flight.
pub fn apply_page(stack: &mut FeedStack, request: &PageRequest, posts: Vec<Post>) -> bool {
    let Some(feed) = stack.get_mut(request.feed) else {
        tracing::debug!(feed = request.feed, "Dropping page for closed feed");
        return false;
    };

    let count = posts.len();
    let items: Vec<FeedItem> = posts.into_iter().map(FeedItem::from).collect();
    let changed = feed.merge(items, request.direction);
    tracing::debug!(
        feed = request.feed,
        received = count,
        total = feed.len(),
        direction = ?request.direction,
        "Merged page"
    );
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Account;
    use pretty_assertions::assert_eq;

    fn post(id: &str) -> Post {
        Post::new(id, Account::new("1", "alice"))
    }

    fn items(ids: &[&str]) -> Vec<FeedItem> {
        ids.iter().map(|id| FeedItem::from(post(id))).collect()
    }

    #[test]
    fn test_load_more_on_base_uses_last_id() {
        let mut stack = FeedStack::new();
        let initial = PageRequest::initial(20);
        apply_page(&mut stack, &initial, vec![post("30"), post("20"), post("10")]);

        let request = plan_load_more(&stack, 20).unwrap();
        assert_eq!(request.source, PageSource::Home);
        assert_eq!(request.cursor, Cursor::older_than(ItemId::from("10"), 20));
        assert_eq!(request.direction, Direction::Older);
    }

    #[test]
    fn test_load_more_skipped_for_empty_feed_and_threads() {
        let mut stack = FeedStack::new();
        assert_eq!(plan_load_more(&stack, 20), None);

        stack.push(items(&["a", "b"]), None, None);
        assert_eq!(plan_load_more(&stack, 20), None);
    }

    #[test]
    fn test_load_more_on_account_feed_pages_account() {
        let mut stack = FeedStack::new();
        let id = stack
            .push(items(&["a", "b"]), None, Some(Account::new("77", "carol")))
            .unwrap();

        let request = plan_load_more(&stack, 20).unwrap();
        assert_eq!(request.feed, id);
        assert_eq!(request.source, PageSource::Account(ItemId::from("77")));
        assert_eq!(request.cursor.max_id, Some(ItemId::from("b")));
    }

    #[test]
    fn test_refresh_targets_base_even_when_drilled_down() {
        let mut stack = FeedStack::new();
        apply_page(&mut stack, &PageRequest::initial(20), vec![post("5"), post("4")]);
        stack.push(items(&["x"]), None, None);

        let request = plan_refresh(&stack, 40).unwrap();
        assert_eq!(request.feed, BASE_FEED);
        assert_eq!(request.cursor, Cursor::newer_than(ItemId::from("5"), 40));
        assert_eq!(request.direction, Direction::Newer);
    }

    #[test]
    fn test_page_for_popped_feed_is_dropped() {
        let mut stack = FeedStack::new();
        stack.push(Vec::new(), None, Some(Account::new("77", "carol")));
        let request = PageRequest {
            feed: stack.active().unwrap().id(),
            source: PageSource::Account(ItemId::from("77")),
            cursor: Cursor::first_page(20),
            direction: Direction::Older,
        };
        stack.pop();

        assert!(!apply_page(&mut stack, &request, vec![post("1")]));
        assert!(stack.active().unwrap().is_empty());
    }
}
