//! Application event handling.
//!
//! Applies background task results to the app state. This is the only
//! place spawned work reaches the feed stack.

use crate::app::{App, AppEvent};

pub(super) fn handle_app_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::PageLoaded { request, result } => app.on_page_loaded(request, result),
        AppEvent::ThreadLoaded { drill, result } => app.on_thread_loaded(drill, result),
        AppEvent::AccountLoaded { drill, result } => app.on_account_loaded(drill, result),
        AppEvent::Live(event) => app.on_live_event(event),
        AppEvent::StreamEnded => app.on_stream_ended(),
        AppEvent::TileReady(source) => {
            tracing::trace!(source = %source, "Tile ready");
            app.needs_redraw = true;
        }
        AppEvent::TaskPanicked { task, error } => {
            // The panicked task never delivered its result
            if task == "stream" {
                app.streaming = false;
            } else {
                app.loading = false;
            }
            app.set_status(format!("Internal error in {}: {}", task, error));
        }
    }
}
