//! Utility functions for common operations.
//!
//! - **URL validation**: scheme checks before links reach the OS opener or
//!   the image fetcher
//! - **Text processing**: Unicode-aware width and truncation, control
//!   character stripping, and compact time/count formatting

mod text;
mod url_validator;

pub use text::{
    display_width, format_count, format_time_since, format_timestamp, strip_control_chars,
    truncate_to_width,
};
pub use url_validator::{validate_url_for_open, UrlValidationError};
