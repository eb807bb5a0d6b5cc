//! RSS rendering and persistence of change log feeds.
//!
//! - `render` - Converts parsed entries into an [`rss::Channel`], one item per entry
//! - `persist` - Atomic write of the feed file, stamped with the change log's Last-Modified
//!
//! The feed file's modification time doubles as the freshness marker for
//! the next run, so it is only ever set by [`write_feed`] and always to the
//! fetched document's time.

mod persist;
mod render;

pub use persist::{freshness_marker, write_feed, write_with, PersistError};
pub use render::render;
