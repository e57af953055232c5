//! Timeline state: the feed stack and everything that mutates it.
//!
//! - [`feed`] - One deduplicated timeline with selection and scroll
//! - [`stack`] - Navigation depth (home, thread, account)
//! - [`pagination`] - Planning and merging paged fetches
//! - [`live`] - Applying streaming insert/edit/delete events
//!
//! Nothing in here does I/O. All mutation happens on the UI task; background
//! tasks hand results back through the app event channel.

mod feed;
pub mod live;
pub mod pagination;
mod stack;

pub use feed::{Direction, Feed, FeedId, NavOutcome, Navigation};
pub use live::LiveEvent;
pub use pagination::{PageRequest, PageSource};
pub use stack::{FeedStack, BASE_FEED};
