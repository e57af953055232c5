use crate::api::{ApiError, FeedSource, ThreadContext};
use crate::config::{Config, TimelineConfig, UiConfig};
use crate::keybindings::KeybindingRegistry;
use crate::model::{Account, FeedItem, Post};
use crate::tiles::TileCache;
use crate::timeline::{
    live, pagination, Feed, FeedId, FeedStack, LiveEvent, NavOutcome, Navigation, PageRequest,
};
use std::borrow::Cow;
use std::sync::Arc;
use tokio::time::Instant;
use url::Url;

/// How long a status message stays in the footer.
const STATUS_TTL_SECS: u64 = 3;

// ============================================================================
// Focus
// ============================================================================

/// Which pane receives pane-specific keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    List,
    Detail,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::List => Focus::Detail,
            Focus::Detail => Focus::List,
        }
    }
}

// ============================================================================
// Background Events
// ============================================================================

/// A thread or account fetch started from the selected post.
///
/// `origin` is the feed that was active when the fetch started; the result
/// is only pushed if that feed is still on top.
#[derive(Debug, Clone)]
pub struct DrillDown {
    pub origin: FeedId,
    /// The displayed post (boost target for boosts).
    pub post: Post,
}

/// Events from background tasks
#[derive(Debug)]
pub enum AppEvent {
    PageLoaded {
        request: PageRequest,
        result: Result<Vec<Post>, ApiError>,
    },
    ThreadLoaded {
        drill: DrillDown,
        result: Result<ThreadContext, ApiError>,
    },
    AccountLoaded {
        drill: DrillDown,
        result: Result<(Account, Vec<Post>), ApiError>,
    },
    Live(LiveEvent),
    /// The live update stream closed. Terminal for the session.
    StreamEnded,
    /// An image finished loading; a repaint will find it in the tile cache.
    TileReady(String),
    /// A background task panicked.
    ///
    /// Fields:
    /// - `task`: Name of the task that panicked (e.g., "page", "thread")
    /// - `error`: The panic message extracted from the panic payload
    TaskPanicked {
        task: &'static str,
        error: String,
    },
}

// ============================================================================
// Application State
// ============================================================================

/// Central application state
///
/// Only the UI loop mutates this. Spawned tasks report back through
/// [`AppEvent`]s, which are applied by the `on_*` methods.
pub struct App {
    pub source: Arc<dyn FeedSource>,
    /// `None` when images are disabled
    pub tiles: Option<Arc<TileCache>>,
    /// Server base URL, for building web links to posts
    pub server: Url,
    pub keybindings: KeybindingRegistry,
    pub timeline: TimelineConfig,
    pub layout: UiConfig,

    pub stack: FeedStack,
    pub focus: Focus,

    /// A page, thread or account fetch is in flight. Further fetches are
    /// dropped until it lands.
    pub loading: bool,
    /// The live update stream is connected
    pub streaming: bool,
    /// The stream reported an error before closing
    stream_failed: bool,
    pub show_quit: bool,

    pub status_message: Option<(Cow<'static, str>, Instant)>,
    pub needs_redraw: bool,

    /// Rows visible in the timeline list at the last render.
    pub list_rows: usize,
}

impl App {
    pub fn new(source: Arc<dyn FeedSource>, server: Url, config: &Config) -> Self {
        let mut keybindings = KeybindingRegistry::new();
        for warning in keybindings.apply_overrides(&config.keybindings) {
            tracing::warn!("{}", warning);
        }

        Self {
            source,
            tiles: None,
            server,
            keybindings,
            timeline: config.timeline.clone(),
            layout: config.ui.clone(),
            stack: FeedStack::new(),
            focus: Focus::List,
            loading: false,
            streaming: false,
            stream_failed: false,
            show_quit: false,
            status_message: None,
            needs_redraw: true,
            list_rows: 0,
        }
    }

    pub fn with_tiles(mut self, tiles: Arc<TileCache>) -> Self {
        self.tiles = Some(tiles);
        self
    }

    /// Set status message (will auto-expire after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
        self.needs_redraw = true;
    }

    /// Clear status message if expired.
    /// Returns true if a message was actually cleared
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= STATUS_TTL_SECS {
                self.status_message = None;
                return true;
            }
        }
        false
    }

    pub fn active_feed(&self) -> Option<&Feed> {
        self.stack.active()
    }

    pub fn selected_item(&self) -> Option<&FeedItem> {
        self.stack.active()?.selected_item()
    }

    pub fn selected_post(&self) -> Option<&Post> {
        self.selected_item()?.as_post()
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    /// First page of the home timeline.
    pub fn begin_initial_load(&mut self) -> PageRequest {
        self.loading = true;
        PageRequest::initial(self.timeline.page_size)
    }

    /// Move the selection in the active feed. Returns a page request when
    /// the move ran off the end and a load-more should start.
    pub fn navigate(&mut self, nav: Navigation) -> Option<PageRequest> {
        let rows = self.list_rows;
        match self.stack.active_mut()?.navigate(nav, rows) {
            NavOutcome::Moved => {
                self.needs_redraw = true;
                None
            }
            NavOutcome::Unchanged => None,
            NavOutcome::LoadMore => self.begin_load_more(),
        }
    }

    pub fn begin_load_more(&mut self) -> Option<PageRequest> {
        if self.loading {
            tracing::debug!("Load more skipped, fetch in flight");
            return None;
        }
        let request = pagination::plan_load_more(&self.stack, self.timeline.page_size)?;
        self.loading = true;
        Some(request)
    }

    /// Plan a fetch of newer home posts. Live updates already deliver
    /// those, so this is off while streaming.
    pub fn begin_refresh(&mut self) -> Option<PageRequest> {
        if self.loading || self.streaming {
            return None;
        }
        let request = pagination::plan_refresh(&self.stack, self.timeline.refresh_size)?;
        self.loading = true;
        Some(request)
    }

    /// Start a thread or account drill-down from the selected post.
    pub fn begin_drill_down(&mut self) -> Option<DrillDown> {
        if self.loading {
            return None;
        }
        let origin = self.stack.active()?.id();
        let post = self.selected_post()?.original().clone();
        if post.id.as_str().is_empty() {
            return None;
        }
        self.loading = true;
        Some(DrillDown { origin, post })
    }

    /// Returns true if the live stream should be started.
    pub fn begin_streaming(&mut self) -> bool {
        if self.streaming || !self.timeline.streaming {
            return false;
        }
        self.streaming = true;
        true
    }

    /// Pop the active feed, or ask to quit when only the base feed is left.
    pub fn back(&mut self) {
        if self.stack.pop() {
            self.needs_redraw = true;
        } else {
            self.show_quit = true;
        }
    }

    pub fn cycle_focus(&mut self) {
        self.focus = self.focus.next();
    }

    // ------------------------------------------------------------------------
    // Links
    // ------------------------------------------------------------------------

    /// Web page for the selected post: the boost target's URL for boosts,
    /// otherwise the post as seen from the user's own server.
    pub fn post_link(&self) -> Option<String> {
        let post = self.selected_post()?;
        if let Some(url) = post
            .reblog
            .as_ref()
            .and_then(|target| non_empty(target.url.as_deref()))
        {
            return Some(url.to_string());
        }
        non_empty(post.url.as_deref())?;
        self.server
            .join(&format!("@{}/{}", post.account.acct, post.id))
            .ok()
            .map(|url| url.to_string())
    }

    /// The selected post's own canonical URL.
    pub fn original_link(&self) -> Option<String> {
        non_empty(self.selected_post()?.url.as_deref()).map(str::to_string)
    }

    /// Link card URL, preferring the boost target's card.
    pub fn card_link(&self) -> Option<String> {
        let post = self.selected_post()?;
        post.reblog
            .as_deref()
            .and_then(card_url)
            .or_else(|| card_url(post))
            .map(str::to_string)
    }

    // ------------------------------------------------------------------------
    // Event application
    // ------------------------------------------------------------------------

    pub fn on_page_loaded(&mut self, request: PageRequest, result: Result<Vec<Post>, ApiError>) {
        self.loading = false;
        match result {
            Ok(posts) => {
                if pagination::apply_page(&mut self.stack, &request, posts) {
                    let rows = self.list_rows;
                    if let Some(feed) = self.stack.get_mut(request.feed) {
                        feed.reveal_selection(rows);
                    }
                    self.needs_redraw = true;
                }
            }
            Err(e) => self.report_fetch_error("Timeline", &e),
        }
    }

    pub fn on_thread_loaded(&mut self, drill: DrillDown, result: Result<ThreadContext, ApiError>) {
        self.loading = false;
        let context = match result {
            Ok(context) => context,
            Err(e) => return self.report_fetch_error("Thread", &e),
        };
        if !self.is_active(drill.origin) {
            tracing::debug!(origin = drill.origin, "Dropping thread for closed feed");
            return;
        }

        let focus = drill.post.id.clone();
        let items: Vec<FeedItem> = context
            .ancestors
            .into_iter()
            .chain(std::iter::once(drill.post))
            .chain(context.descendants)
            .map(FeedItem::from)
            .collect();
        if self.stack.push(items, Some(&focus), None).is_some() {
            self.needs_redraw = true;
        }
    }

    pub fn on_account_loaded(
        &mut self,
        drill: DrillDown,
        result: Result<(Account, Vec<Post>), ApiError>,
    ) {
        self.loading = false;
        let (account, posts) = match result {
            Ok(loaded) => loaded,
            Err(e) => return self.report_fetch_error("Account", &e),
        };
        if !self.is_active(drill.origin) {
            tracing::debug!(origin = drill.origin, "Dropping account feed for closed feed");
            return;
        }

        let items = posts.into_iter().map(FeedItem::from).collect();
        if self
            .stack
            .push(items, Some(&drill.post.id), Some(account))
            .is_some()
        {
            self.needs_redraw = true;
        }
    }

    /// Live updates always target the base feed.
    pub fn on_live_event(&mut self, event: LiveEvent) {
        if let LiveEvent::StreamError(message) = &event {
            self.stream_failed = true;
            self.set_status(format!("Live updates: {}", message));
        }
        let rows = self.list_rows;
        let Some(base) = self.stack.base_mut() else {
            return;
        };
        if live::apply(base, event) {
            base.reveal_selection(rows);
            self.needs_redraw = true;
        }
    }

    /// The stream closed. A preceding stream error already explained why,
    /// so its message is left in place.
    pub fn on_stream_ended(&mut self) {
        self.streaming = false;
        tracing::info!("Live update stream ended");
        if !std::mem::take(&mut self.stream_failed) {
            self.set_status("Live updates disconnected");
        }
    }

    fn is_active(&self, feed: FeedId) -> bool {
        self.stack.active().is_some_and(|active| active.id() == feed)
    }

    fn report_fetch_error(&mut self, what: &str, error: &ApiError) {
        if error.is_not_found() {
            tracing::debug!(error = %error, "{} not found", what);
            return;
        }
        if error.is_retryable() {
            tracing::warn!(error = %error, "{} fetch failed", what);
        } else {
            tracing::error!(error = %error, "{} fetch failed", what);
        }
        self.set_status(format!("{} failed: {}", what, error));
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

fn card_url(post: &Post) -> Option<&str> {
    non_empty(post.card.as_ref().map(|card| card.url.as_str()))
}
