//! Background task spawning and other shared UI helpers.
//!
//! Every network call runs on a spawned task that reports back with an
//! [`AppEvent`]; none of them touch feed state directly.

use crate::api::{ApiError, Cursor};
use crate::app::{App, AppEvent, DrillDown};
use crate::timeline::{pagination, PageRequest};
use crate::util::validate_url_for_open;
use futures::{FutureExt, StreamExt};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc::UnboundedSender;

/// Wraps a future to catch panics and convert them to errors.
///
/// Instead of the task silently disappearing (caught by Tokio's runtime but
/// not handled), panics are converted to `Err(String)` containing the panic
/// message.
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else if let Some(e) = panic.downcast_ref::<Box<dyn std::error::Error + Send>>() {
                e.to_string()
            } else {
                format!("Unknown panic: {:?}", (*panic).type_id())
            }
        })
}

/// Spawn `work` and forward its event, reporting a panic as
/// [`AppEvent::TaskPanicked`].
fn spawn_reporting<F>(task: &'static str, tx: UnboundedSender<AppEvent>, work: F)
where
    F: Future<Output = AppEvent> + Send + 'static,
{
    tokio::spawn(async move {
        let event = match catch_task_panic(work).await {
            Ok(event) => event,
            Err(error) => {
                tracing::error!(task, error = %error, "Background task panicked");
                AppEvent::TaskPanicked { task, error }
            }
        };
        if tx.send(event).is_err() {
            tracing::warn!(task, "Channel send failed (receiver dropped)");
        }
    });
}

pub(super) fn spawn_page_fetch(app: &App, request: PageRequest, tx: &UnboundedSender<AppEvent>) {
    let source = app.source.clone();
    tracing::debug!(feed = request.feed, direction = ?request.direction, "Fetching page");
    spawn_reporting("page", tx.clone(), async move {
        let result = pagination::fetch(source.as_ref(), &request).await;
        AppEvent::PageLoaded { request, result }
    });
}

pub(super) fn spawn_thread_fetch(app: &App, drill: DrillDown, tx: &UnboundedSender<AppEvent>) {
    let source = app.source.clone();
    tracing::debug!(post = %drill.post.id, "Fetching thread");
    spawn_reporting("thread", tx.clone(), async move {
        let result = source.status_context(&drill.post.id).await;
        AppEvent::ThreadLoaded { drill, result }
    });
}

/// Fetch the author of the drill-down post, then their posts.
pub(super) fn spawn_account_fetch(app: &App, drill: DrillDown, tx: &UnboundedSender<AppEvent>) {
    let source = app.source.clone();
    let first_page = Cursor::first_page(app.timeline.page_size);
    tracing::debug!(account = %drill.post.account.id, "Fetching account");
    spawn_reporting("account", tx.clone(), async move {
        let result: Result<_, ApiError> = async {
            let account = source.account(&drill.post.account.id).await?;
            let posts = source.account_statuses(&account.id, first_page).await?;
            Ok((account, posts))
        }
        .await;
        AppEvent::AccountLoaded { drill, result }
    });
}

/// Forward live updates into the event channel until the stream ends.
pub(super) fn spawn_live_updates(app: &App, tx: &UnboundedSender<AppEvent>) {
    let mut events = app.source.subscribe_live_updates();
    tracing::info!("Subscribing to live updates");
    spawn_reporting("stream", tx.clone(), {
        let tx = tx.clone();
        async move {
            while let Some(event) = events.next().await {
                if tx.send(AppEvent::Live(event)).is_err() {
                    break;
                }
            }
            AppEvent::StreamEnded
        }
    });
}

/// Hand `url` to the system opener after validating it.
pub(super) fn open_link(app: &mut App, url: Option<String>, missing: &'static str) {
    let Some(url) = url else {
        app.set_status(missing);
        return;
    };
    // SEC: Validate URL before open::that() to prevent command injection
    match validate_url_for_open(&url) {
        Err(e) => app.set_status(e.to_string()),
        Ok(url) => {
            if let Err(e) = open::that(url.as_str()) {
                tracing::warn!(url = %url, error = %e, "Failed to open browser");
                app.set_status(format!("Failed to open browser: {}", e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_catch_task_panic_passes_value_through() {
        assert_eq!(catch_task_panic(async { 7 }).await, Ok(7));
    }

    #[tokio::test]
    async fn test_catch_task_panic_reports_message() {
        let result = catch_task_panic(async {
            if true {
                panic!("boom");
            }
        })
        .await;
        assert_eq!(result, Err("boom".to_string()));
    }
}
