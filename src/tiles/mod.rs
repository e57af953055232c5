//! Inline images for the terminal.
//!
//! Images are fetched and decoded in the background, then scaled to a
//! requested cell box and drawn with half-block characters (two pixel rows
//! per cell).
//!
//! - [`cache`] - [`TileCache`], memoized raw and scaled images with
//!   single-flight loading
//! - [`scale`] - Aspect-preserving cover scaling into [`Tile`]s
//! - [`source`] - Where image bytes come from ([`HttpImageSource`])

mod cache;
mod scale;
mod source;

pub use cache::{ReadyCallback, TileCache, TileKey};
pub use scale::{cover_dimensions, Tile};
pub use source::{HttpImageSource, ImageSource};

use thiserror::Error;

/// Why an image could not be loaded. Logged, never shown; the cache keeps
/// no entry so a later request retries.
#[derive(Debug, Error)]
pub enum TileError {
    #[error("Image request failed: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Image request timed out")]
    Timeout,
    #[error("Image exceeds {0} bytes")]
    TooLarge(usize),
    #[error("Image decode failed: {0}")]
    Decode(String),
    #[error("Invalid image URL: {0}")]
    InvalidUrl(String),
}
