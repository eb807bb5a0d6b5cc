//! Freshness-gated retrieval of `ChangeLog.txt` from mirrors.
//!
//! - `location` - Mirror/release/prefix tuples and the URLs and file names derived from them
//! - `fetcher` - Conditional (HEAD) and unconditional (GET) fetches
//! - `http_date` - Last-Modified parsing
//!
//! # Example
//!
//! ```ignore
//! use sl_feeds::fetch::{Fetcher, FetchOutcome, SourceLocation};
//!
//! let source = SourceLocation::new("http://slackware.osuosl.org/", "slackware64-current", "")?;
//! let fetcher = Fetcher::new(reqwest::Client::new());
//!
//! match fetcher.newer_changelog(&source, known_fresh_as_of).await? {
//!     FetchOutcome::Fetched(log) => render(log.entries, log.modified),
//!     FetchOutcome::NotModified { .. } => {}
//! }
//! ```

mod fetcher;
mod http_date;
mod location;

pub use fetcher::{ChangeLog, FetchError, FetchOutcome, Fetcher};
pub use location::{LocationError, SourceLocation, CHANGELOG_FILE};
