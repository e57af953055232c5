//! Input handling for the TUI.
//!
//! Keys are mapped to actions through the keybinding registry, then applied
//! to the app. Actions that need the network spawn a background task.

use crate::app::{App, AppEvent, Focus};
use crate::keybindings::{Action as KbAction, Context as KbContext};
use crate::timeline::Navigation;
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc::UnboundedSender;

use super::helpers::{open_link, spawn_account_fetch, spawn_page_fetch, spawn_thread_fetch};
use super::Action;

/// Map the current focus panel to a keybinding context for context-specific lookups.
fn focus_to_context(focus: Focus) -> KbContext {
    match focus {
        Focus::List => KbContext::Timeline,
        Focus::Detail => KbContext::Detail,
    }
}

/// Main input dispatch function.
pub(super) fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &UnboundedSender<AppEvent>,
) -> Action {
    // The quit prompt captures all keys while visible
    if app.show_quit {
        return handle_quit_input(app, code, modifiers);
    }

    let context = focus_to_context(app.focus);
    let Some(action) = app.keybindings.action_for_key(code, modifiers, context) else {
        return Action::Continue;
    };

    match action {
        KbAction::Quit => app.back(),
        KbAction::ConfirmQuit => return Action::Quit,
        KbAction::CancelQuit => {}
        KbAction::NavDown => navigate(app, Navigation::Next, event_tx),
        KbAction::NavUp => navigate(app, Navigation::Previous, event_tx),
        KbAction::NavTop => navigate(app, Navigation::First, event_tx),
        KbAction::NavBottom => navigate(app, Navigation::Last, event_tx),
        KbAction::CycleFocus => app.cycle_focus(),
        KbAction::FocusList => app.focus = Focus::List,
        KbAction::FocusDetail => app.focus = Focus::Detail,
        KbAction::Refresh => {
            if let Some(request) = app.begin_refresh() {
                spawn_page_fetch(app, request, event_tx);
            }
        }
        KbAction::OpenThread => {
            if let Some(drill) = app.begin_drill_down() {
                spawn_thread_fetch(app, drill, event_tx);
            }
        }
        KbAction::OpenAccount => {
            if let Some(drill) = app.begin_drill_down() {
                spawn_account_fetch(app, drill, event_tx);
            }
        }
        KbAction::OpenPost => {
            let url = app.post_link();
            open_link(app, url, "Post has no URL");
        }
        KbAction::OpenOriginal => {
            let url = app.original_link();
            open_link(app, url, "Post has no URL");
        }
        KbAction::OpenCard => {
            let url = app.card_link();
            open_link(app, url, "No link card to open");
        }
    }
    Action::Continue
}

fn navigate(app: &mut App, nav: Navigation, event_tx: &UnboundedSender<AppEvent>) {
    if let Some(request) = app.navigate(nav) {
        spawn_page_fetch(app, request, event_tx);
    }
}

/// Handle input while the quit prompt is visible.
fn handle_quit_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Action {
    match app
        .keybindings
        .action_for_key(code, modifiers, KbContext::QuitPrompt)
    {
        Some(KbAction::ConfirmQuit) => Action::Quit,
        Some(KbAction::CancelQuit) => {
            app.show_quit = false;
            Action::Continue
        }
        _ => Action::Continue,
    }
}
