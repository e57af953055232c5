//! Terminal User Interface module.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `events` - Background task event processing
//! - `helpers` - Task spawning and link opening
//! - `render` - Layout: header, panes, footer, quit prompt
//! - `timeline` - Timeline list pane
//! - `detail` - Post and account detail pane
//! - `tile` - Half-block image widget
//! - `status` - Status bar widget

mod detail;
mod events;
mod helpers;
mod input;
mod loop_runner;
mod render;
mod status;
mod tile;
mod timeline;

// Re-export the public API
pub use loop_runner::{run, Action};
