//! Mirror Slackware `ChangeLog.txt` files into per-release RSS feeds.
//!
//! The pipeline for each (mirror, release) pair:
//!
//! 1. [`feed::freshness_marker`] - read the existing feed file's mtime
//! 2. [`fetch::Fetcher`] - HEAD/GET the change log, gated on that mtime
//! 3. [`changelog::parse`] - split the document into dated entries
//! 4. [`feed::render`] / [`feed::write_feed`] - write the RSS file and
//!    stamp it with the change log's Last-Modified
//!
//! [`sync::run`] drives this over a whole configuration.

pub mod changelog;
pub mod config;
pub mod feed;
pub mod fetch;
pub mod sync;
pub mod util;

pub use changelog::{ChangeLine, Entry, ParseError};
pub use config::{Config, ConfigError, Mirror};
pub use fetch::{ChangeLog, FetchError, FetchOutcome, Fetcher, SourceLocation};
pub use sync::{SyncError, SyncOutcome, SyncReport};
