//! Navigation depth: home, then threads and account feeds pushed on top.

use super::feed::{Feed, FeedId};
use crate::model::{Account, FeedItem, ItemId};

/// Identifier of the base feed created with the stack.
pub const BASE_FEED: FeedId = 0;

/// Ordered, never-empty collection of feeds. The last one is active.
#[derive(Debug, Clone)]
pub struct FeedStack {
    feeds: Vec<Feed>,
    next_id: FeedId,
}

impl Default for FeedStack {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedStack {
    /// A stack holding one empty base feed.
    pub fn new() -> Self {
        Self {
            feeds: vec![Feed::new(BASE_FEED, Vec::new(), None, None)],
            next_id: BASE_FEED + 1,
        }
    }

    /// Push a feed built from `items` and make it active.
    ///
    /// An empty batch is only accepted for a scoped feed (an account with no
    /// posts is still worth showing). Returns the new feed's id, or `None`
    /// when nothing was pushed.
    pub fn push(
        &mut self,
        items: Vec<FeedItem>,
        preferred: Option<&ItemId>,
        scope_account: Option<Account>,
    ) -> Option<FeedId> {
        if items.is_empty() && scope_account.is_none() {
            tracing::debug!("Ignoring push of empty unscoped feed");
            return None;
        }

        let id = self.next_id;
        self.next_id += 1;
        self.feeds.push(Feed::new(id, items, preferred, scope_account));
        tracing::debug!(feed = id, depth = self.feeds.len(), "Pushed feed");
        Some(id)
    }

    /// Drop the active feed. Returns false at depth one, where the base
    /// feed stays and the caller should ask whether to quit.
    pub fn pop(&mut self) -> bool {
        if self.feeds.len() <= 1 {
            return false;
        }
        if let Some(feed) = self.feeds.pop() {
            tracing::debug!(feed = feed.id(), depth = self.feeds.len(), "Popped feed");
        }
        true
    }

    pub fn depth(&self) -> usize {
        self.feeds.len()
    }

    pub fn active(&self) -> Option<&Feed> {
        self.feeds.last()
    }

    pub fn active_mut(&mut self) -> Option<&mut Feed> {
        self.feeds.last_mut()
    }

    pub fn base(&self) -> Option<&Feed> {
        self.feeds.first()
    }

    pub fn base_mut(&mut self) -> Option<&mut Feed> {
        self.feeds.first_mut()
    }

    /// Look a feed up by id. `None` once it has been popped, which is how
    /// late background results find out they are stale.
    pub fn get(&self, id: FeedId) -> Option<&Feed> {
        self.feeds.iter().find(|feed| feed.id() == id)
    }

    pub fn get_mut(&mut self, id: FeedId) -> Option<&mut Feed> {
        self.feeds.iter_mut().find(|feed| feed.id() == id)
    }

    /// Header trail for the active feed.
    pub fn breadcrumb(&self) -> String {
        match self.feeds.last() {
            Some(feed) if self.feeds.len() > 1 => match feed.scope_account() {
                Some(account) => format!("Home → {}", account.name()),
                None => "Home → Thread".to_string(),
            },
            _ => "Home".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Post;

    fn post(id: &str) -> FeedItem {
        FeedItem::from(Post::new(id, Account::new("acct", "alice")))
    }

    #[test]
    fn test_new_stack_has_empty_base() {
        let stack = FeedStack::new();
        assert_eq!(stack.depth(), 1);
        let base = stack.active().unwrap();
        assert_eq!(base.id(), BASE_FEED);
        assert!(base.is_empty());
        assert_eq!(stack.breadcrumb(), "Home");
    }

    #[test]
    fn test_pop_floor_is_one() {
        let mut stack = FeedStack::new();
        assert!(!stack.pop());
        assert_eq!(stack.depth(), 1);

        stack.push(vec![post("a")], None, None);
        assert!(stack.pop());
        assert!(!stack.pop());
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_push_empty_unscoped_is_rejected() {
        let mut stack = FeedStack::new();
        assert_eq!(stack.push(Vec::new(), None, None), None);
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_push_empty_scoped_is_accepted() {
        let mut stack = FeedStack::new();
        let id = stack.push(Vec::new(), None, Some(Account::new("9", "quiet")));
        assert!(id.is_some());
        assert_eq!(stack.depth(), 2);

        let active = stack.active().unwrap();
        assert!(active.is_empty());
        assert_eq!(active.selected_id(), None);
        assert_eq!(active.scope_account().map(|a| a.acct.as_str()), Some("quiet"));
    }

    #[test]
    fn test_breadcrumbs() {
        let mut stack = FeedStack::new();
        stack.push(vec![post("a")], None, None);
        assert_eq!(stack.breadcrumb(), "Home → Thread");

        let mut account = Account::new("5", "dan@example.social");
        account.display_name = "Dan".to_string();
        stack.push(vec![post("b")], None, Some(account));
        assert_eq!(stack.breadcrumb(), "Home → Dan");

        stack.pop();
        stack.pop();
        assert_eq!(stack.breadcrumb(), "Home");
    }

    #[test]
    fn test_popped_feed_ids_are_not_reused() {
        let mut stack = FeedStack::new();
        let first = stack.push(vec![post("a")], None, None).unwrap();
        stack.pop();
        let second = stack.push(vec![post("b")], None, None).unwrap();

        assert_ne!(first, second);
        assert!(stack.get(first).is_none());
        assert!(stack.get(second).is_some());
    }
}
