//! mastty: a terminal client for Mastodon-compatible timelines.
//!
//! - [`timeline`] - The feed stack: merging, navigation, live updates
//! - [`tiles`] - Asynchronous image loading and scaling for inline images
//! - [`api`] - The server client and the [`api::FeedSource`] seam
//! - [`ui`] - The terminal front end

pub mod api;
pub mod app;
pub mod config;
pub mod content;
pub mod keybindings;
pub mod model;
pub mod tiles;
pub mod timeline;
pub mod ui;
pub mod util;
