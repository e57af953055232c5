//! A single timeline: ordered, deduplicated items with a selection cursor.

use std::collections::HashSet;

use crate::model::{Account, FeedItem, ItemId};

/// Identifier assigned by the [`FeedStack`](super::FeedStack) when a feed is
/// pushed. Background results carry it so they can be dropped once the feed
/// has been popped.
pub type FeedId = u64;

/// Where a batch of items belongs relative to the existing sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Items older than the last one shown; appended.
    Older,
    /// Items newer than the first one shown; prepended.
    Newer,
}

/// Cursor movement requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Next,
    Previous,
    First,
    Last,
}

/// Outcome of a cursor movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    /// Selection (and possibly scroll offset) changed.
    Moved,
    /// Nothing to do: empty feed, or already at the requested position.
    Unchanged,
    /// The cursor tried to move past the last item; the caller should fetch
    /// an older page.
    LoadMore,
}

#[derive(Debug, Clone)]
pub struct Feed {
    id: FeedId,
    items: Vec<FeedItem>,
    selected: Option<ItemId>,
    scroll_offset: usize,
    scope_account: Option<Account>,
}

impl Feed {
    /// Build a feed from `items`, dropping repeated identifiers.
    ///
    /// The first item is selected unless `preferred` names an item present
    /// in the batch.
    pub fn new(
        id: FeedId,
        items: Vec<FeedItem>,
        preferred: Option<&ItemId>,
        scope_account: Option<Account>,
    ) -> Self {
        let mut seen = HashSet::with_capacity(items.len());
        let items: Vec<FeedItem> = items
            .into_iter()
            .filter(|item| seen.insert(item.id().clone()))
            .collect();

        let selected = preferred
            .filter(|target| items.iter().any(|item| item.id() == *target))
            .or_else(|| items.first().map(FeedItem::id))
            .cloned();

        Self {
            id,
            items,
            selected,
            scroll_offset: 0,
            scope_account,
        }
    }

    pub fn id(&self) -> FeedId {
        self.id
    }

    pub fn items(&self) -> &[FeedItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn scope_account(&self) -> Option<&Account> {
        self.scope_account.as_ref()
    }

    pub fn selected_id(&self) -> Option<&ItemId> {
        self.selected.as_ref()
    }

    pub fn selected_index(&self) -> Option<usize> {
        let target = self.selected.as_ref()?;
        self.position(target)
    }

    pub fn selected_item(&self) -> Option<&FeedItem> {
        self.selected_index().map(|idx| &self.items[idx])
    }

    fn position(&self, id: &ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    /// Select the item with `id`. Returns false (and leaves the selection
    /// alone) when no such item exists.
    pub fn select(&mut self, id: &ItemId) -> bool {
        if self.position(id).is_none() {
            return false;
        }
        self.selected = Some(id.clone());
        true
    }

    /// Identifier to page from: the last item for [`Direction::Older`], the
    /// first for [`Direction::Newer`]. `None` for an empty feed.
    pub fn boundary(&self, direction: Direction) -> Option<&ItemId> {
        match direction {
            Direction::Older => self.items.last(),
            Direction::Newer => self.items.first(),
        }
        .map(FeedItem::id)
    }

    /// Merge a fetched batch into the feed.
    ///
    /// Items whose identifier is already present (or repeated within the
    /// batch) are dropped. Survivors keep their batch order and go before
    /// the existing items for [`Direction::Newer`], after them for
    /// [`Direction::Older`]. The selection keeps pointing at the same
    /// identifier; a feed that was empty selects its new first item.
    ///
    /// Returns true if any item was added.
    pub fn merge(&mut self, batch: Vec<FeedItem>, direction: Direction) -> bool {
        let mut seen: HashSet<ItemId> = self.items.iter().map(|i| i.id().clone()).collect();
        let fresh: Vec<FeedItem> = batch
            .into_iter()
            .filter(|item| seen.insert(item.id().clone()))
            .collect();

        if fresh.is_empty() {
            return false;
        }

        let was_empty = self.items.is_empty();
        let added = fresh.len();
        match direction {
            Direction::Newer => {
                self.items.splice(0..0, fresh);
                // Keep the same rows on screen once something is visible
                if !was_empty && self.scroll_offset > 0 {
                    self.scroll_offset += added;
                }
            }
            Direction::Older => self.items.extend(fresh),
        }

        if self.selected.is_none() && was_empty {
            self.selected = self.items.first().map(|item| item.id().clone());
        }
        true
    }

    /// Replace the item carrying the same identifier as `item`, in place.
    ///
    /// The selection is keyed by identifier, so a selected item keeps being
    /// selected and readers see the new value. Returns false if absent.
    pub fn replace(&mut self, item: FeedItem) -> bool {
        match self.position(item.id()) {
            Some(idx) => {
                self.items[idx] = item;
                true
            }
            None => false,
        }
    }

    /// Remove the item with `id`.
    ///
    /// If it was selected, the selection moves to the new first item when
    /// the removed item was first, to the preceding item otherwise, and is
    /// cleared when the feed becomes empty. Returns false if absent.
    pub fn remove(&mut self, id: &ItemId) -> bool {
        let Some(idx) = self.position(id) else {
            return false;
        };

        if self.selected.as_ref() == Some(id) {
            self.selected = if self.items.len() == 1 {
                None
            } else if idx == 0 {
                Some(self.items[1].id().clone())
            } else {
                Some(self.items[idx - 1].id().clone())
            };
        }

        self.items.remove(idx);
        let max_offset = self.items.len().saturating_sub(1);
        self.scroll_offset = self.scroll_offset.min(max_offset);
        true
    }

    /// Move the cursor.
    ///
    /// `visible_rows` is the list viewport height recorded at the last
    /// render; the scroll offset only changes when the new selection falls
    /// outside `[scroll_offset, scroll_offset + visible_rows)`.
    pub fn navigate(&mut self, nav: Navigation, visible_rows: usize) -> NavOutcome {
        if self.items.is_empty() {
            return NavOutcome::Unchanged;
        }

        let last = self.items.len() - 1;
        let current = self.selected_index();
        let target = match (nav, current) {
            (Navigation::Next, None) => 0,
            (Navigation::Next, Some(idx)) => idx + 1,
            (Navigation::Previous, None) => last,
            (Navigation::Previous, Some(idx)) => idx.saturating_sub(1),
            (Navigation::First, _) => 0,
            (Navigation::Last, _) => last,
        };

        if target > last {
            return NavOutcome::LoadMore;
        }
        if current == Some(target) {
            return NavOutcome::Unchanged;
        }

        self.scroll_to(target, visible_rows);
        self.selected = Some(self.items[target].id().clone());
        NavOutcome::Moved
    }

    /// Scroll just enough for the selection to be inside a window of
    /// `visible_rows`. A no-op before the first render (`visible_rows == 0`)
    /// or without a selection. Returns true if the offset changed.
    pub fn reveal_selection(&mut self, visible_rows: usize) -> bool {
        if visible_rows == 0 {
            return false;
        }
        let Some(idx) = self.selected_index() else {
            return false;
        };
        let before = self.scroll_offset;
        self.scroll_to(idx, visible_rows);
        self.scroll_offset != before
    }

    fn scroll_to(&mut self, idx: usize, visible_rows: usize) {
        let rows = visible_rows.max(1);
        if idx >= self.scroll_offset + rows {
            self.scroll_offset = idx + 1 - rows;
        }
        if idx < self.scroll_offset {
            self.scroll_offset = idx;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Account, Post};
    use pretty_assertions::assert_eq;

    fn post(id: &str) -> FeedItem {
        FeedItem::from(Post::new(id, Account::new("acct", "alice")))
    }

    fn posts(ids: &[&str]) -> Vec<FeedItem> {
        ids.iter().map(|id| post(id)).collect()
    }

    fn ids(feed: &Feed) -> Vec<&str> {
        feed.items().iter().map(|i| i.id().as_str()).collect()
    }

    #[test]
    fn test_new_selects_first_item() {
        let feed = Feed::new(0, posts(&["a", "b"]), None, None);
        assert_eq!(feed.selected_id().map(ItemId::as_str), Some("a"));
    }

    #[test]
    fn test_new_honors_preferred_selection() {
        let preferred = ItemId::from("b");
        let feed = Feed::new(0, posts(&["a", "b", "c"]), Some(&preferred), None);
        assert_eq!(feed.selected_index(), Some(1));
    }

    #[test]
    fn test_new_ignores_missing_preferred_selection() {
        let preferred = ItemId::from("zzz");
        let feed = Feed::new(0, posts(&["a", "b"]), Some(&preferred), None);
        assert_eq!(feed.selected_id().map(ItemId::as_str), Some("a"));
    }

    #[test]
    fn test_new_drops_duplicate_ids() {
        let feed = Feed::new(0, posts(&["a", "b", "a"]), None, None);
        assert_eq!(ids(&feed), vec!["a", "b"]);
    }

    #[test]
    fn test_merge_older_appends_in_batch_order() {
        let mut feed = Feed::new(0, posts(&["a", "b"]), None, None);
        assert!(feed.merge(posts(&["c", "d"]), Direction::Older));
        assert_eq!(ids(&feed), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_merge_newer_prepends_in_batch_order() {
        let mut feed = Feed::new(0, posts(&["c", "d"]), None, None);
        assert!(feed.merge(posts(&["a", "b"]), Direction::Newer));
        assert_eq!(ids(&feed), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_merge_all_duplicates_is_unchanged() {
        let mut feed = Feed::new(0, posts(&["a", "b"]), None, None);
        assert!(!feed.merge(posts(&["b", "a"]), Direction::Newer));
        assert_eq!(ids(&feed), vec!["a", "b"]);
    }

    #[test]
    fn test_merge_drops_repeats_within_batch() {
        let mut feed = Feed::new(0, Vec::new(), None, None);
        feed.merge(posts(&["a", "b", "a", "c"]), Direction::Older);
        assert_eq!(ids(&feed), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_merge_keeps_selection_on_same_id() {
        let mut feed = Feed::new(0, posts(&["c", "d"]), None, None);
        feed.select(&ItemId::from("d"));
        feed.merge(posts(&["a", "b"]), Direction::Newer);
        assert_eq!(feed.selected_id().map(ItemId::as_str), Some("d"));
        assert_eq!(feed.selected_index(), Some(3));
    }

    #[test]
    fn test_merge_into_empty_selects_first() {
        let mut feed = Feed::new(0, Vec::new(), None, None);
        assert_eq!(feed.selected_id(), None);
        feed.merge(posts(&["a", "b"]), Direction::Older);
        assert_eq!(feed.selected_id().map(ItemId::as_str), Some("a"));
    }

    #[test]
    fn test_boundaries() {
        let feed = Feed::new(0, posts(&["new", "mid", "old"]), None, None);
        assert_eq!(feed.boundary(Direction::Newer).map(ItemId::as_str), Some("new"));
        assert_eq!(feed.boundary(Direction::Older).map(ItemId::as_str), Some("old"));

        let empty = Feed::new(1, Vec::new(), None, None);
        assert_eq!(empty.boundary(Direction::Older), None);
    }

    #[test]
    fn test_replace_in_place_keeps_position() {
        let mut feed = Feed::new(0, posts(&["a", "b", "c"]), None, None);
        feed.select(&ItemId::from("b"));

        let mut edited = Post::new("b", Account::new("acct", "alice"));
        edited.content = "<p>edited</p>".to_string();
        assert!(feed.replace(FeedItem::from(edited)));

        assert_eq!(ids(&feed), vec!["a", "b", "c"]);
        let selected = feed.selected_item().and_then(FeedItem::as_post).unwrap();
        assert_eq!(selected.content, "<p>edited</p>");
    }

    #[test]
    fn test_replace_unknown_is_noop() {
        let mut feed = Feed::new(0, posts(&["a"]), None, None);
        assert!(!feed.replace(post("zzz")));
        assert_eq!(ids(&feed), vec!["a"]);
    }

    #[test]
    fn test_remove_selected_first_moves_to_new_first() {
        let mut feed = Feed::new(0, posts(&["a", "b", "c", "d", "e"]), None, None);
        assert!(feed.remove(&ItemId::from("a")));
        assert_eq!(feed.selected_id().map(ItemId::as_str), Some("b"));
        assert_eq!(feed.selected_index(), Some(0));
    }

    #[test]
    fn test_remove_selected_last_moves_to_new_last() {
        let mut feed = Feed::new(0, posts(&["a", "b", "c", "d", "e"]), None, None);
        feed.select(&ItemId::from("e"));
        feed.remove(&ItemId::from("e"));
        assert_eq!(feed.selected_id().map(ItemId::as_str), Some("d"));
        assert_eq!(feed.selected_index(), Some(feed.len() - 1));
    }

    #[test]
    fn test_remove_selected_middle_moves_to_previous() {
        let mut feed = Feed::new(0, posts(&["a", "b", "c"]), None, None);
        feed.select(&ItemId::from("b"));
        feed.remove(&ItemId::from("b"));
        assert_eq!(feed.selected_id().map(ItemId::as_str), Some("a"));
    }

    #[test]
    fn test_remove_sole_item_clears_selection() {
        let mut feed = Feed::new(0, posts(&["a"]), None, None);
        feed.remove(&ItemId::from("a"));
        assert!(feed.is_empty());
        assert_eq!(feed.selected_id(), None);
    }

    #[test]
    fn test_remove_unselected_leaves_selection() {
        let mut feed = Feed::new(0, posts(&["a", "b", "c"]), None, None);
        feed.remove(&ItemId::from("c"));
        assert_eq!(feed.selected_id().map(ItemId::as_str), Some("a"));
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut feed = Feed::new(0, posts(&["a"]), None, None);
        assert!(!feed.remove(&ItemId::from("zzz")));
        assert_eq!(feed.len(), 1);
    }

    #[test]
    fn test_navigate_clamps_at_top() {
        let mut feed = Feed::new(0, posts(&["a", "b"]), None, None);
        assert_eq!(feed.navigate(Navigation::Previous, 10), NavOutcome::Unchanged);
        assert_eq!(feed.selected_index(), Some(0));
    }

    #[test]
    fn test_navigate_past_end_requests_load_more() {
        let mut feed = Feed::new(0, posts(&["a", "b"]), None, None);
        assert_eq!(feed.navigate(Navigation::Next, 10), NavOutcome::Moved);
        assert_eq!(feed.navigate(Navigation::Next, 10), NavOutcome::LoadMore);
        assert_eq!(feed.selected_index(), Some(1));
    }

    #[test]
    fn test_navigate_first_and_last() {
        let mut feed = Feed::new(0, posts(&["a", "b", "c"]), None, None);
        assert_eq!(feed.navigate(Navigation::Last, 10), NavOutcome::Moved);
        assert_eq!(feed.selected_index(), Some(2));
        // Last never asks for more data
        assert_eq!(feed.navigate(Navigation::Last, 10), NavOutcome::Unchanged);
        assert_eq!(feed.navigate(Navigation::First, 10), NavOutcome::Moved);
        assert_eq!(feed.selected_index(), Some(0));
    }

    #[test]
    fn test_navigate_empty_feed_is_unchanged() {
        let mut feed = Feed::new(0, Vec::new(), None, None);
        assert_eq!(feed.navigate(Navigation::Next, 10), NavOutcome::Unchanged);
    }

    #[test]
    fn test_scroll_follows_selection_forward_and_back() {
        let ids: Vec<String> = (0..10).map(|i| format!("p{i}")).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let mut feed = Feed::new(0, posts(&refs), None, None);

        for _ in 0..4 {
            feed.navigate(Navigation::Next, 3);
        }
        // Selection at 4 sits on the last of 3 visible rows
        assert_eq!(feed.selected_index(), Some(4));
        assert_eq!(feed.scroll_offset(), 2);

        feed.navigate(Navigation::Previous, 3);
        feed.navigate(Navigation::Previous, 3);
        // Index 2 is still visible; no scroll
        assert_eq!(feed.scroll_offset(), 2);

        feed.navigate(Navigation::Previous, 3);
        // Index 1 scrolls back onto the first visible row
        assert_eq!(feed.scroll_offset(), 1);
    }

    #[test]
    fn test_newer_merge_at_top_keeps_selection_visible() {
        let mut feed = Feed::new(0, posts(&["a", "b", "c", "d"]), None, None);
        feed.navigate(Navigation::Next, 3);
        feed.navigate(Navigation::Next, 3);
        assert_eq!((feed.selected_index(), feed.scroll_offset()), (Some(2), 0));

        feed.merge(posts(&["z"]), Direction::Newer);
        assert_eq!(feed.selected_index(), Some(3));
        assert!(feed.reveal_selection(3));
        assert_eq!(feed.scroll_offset(), 1);

        // Already visible: nothing moves
        assert!(!feed.reveal_selection(3));
        assert_eq!(feed.scroll_offset(), 1);
    }

    #[test]
    fn test_reveal_selection_before_first_render_is_noop() {
        let mut feed = Feed::new(0, posts(&["a", "b", "c"]), Some(&ItemId::from("c")), None);
        assert!(!feed.reveal_selection(0));
        assert_eq!(feed.scroll_offset(), 0);
    }
}
