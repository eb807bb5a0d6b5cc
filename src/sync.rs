//! Per-release synchronization: freshness check, fetch, render, persist.
//!
//! Releases are processed one after another. A failure in one release is
//! logged and recorded in the [`SyncReport`]; it never stops the batch.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::feed::{self, PersistError};
use crate::fetch::{FetchError, FetchOutcome, Fetcher, SourceLocation};

/// Errors that fail a single release.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The existing feed file could not be stat'ed.
    #[error("Failed to read modification time of '{path}': {source}")]
    Marker {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// What happened to a release that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The feed was (re)written and stamped with `modified`.
    Updated {
        entries: usize,
        modified: DateTime<Utc>,
    },
    /// The remote change log is not newer than the existing feed.
    Unchanged { remote: DateTime<Utc> },
}

/// Result for one (mirror, release) pair.
#[derive(Debug)]
pub struct ReleaseReport {
    /// `{prefix}{release}`
    pub name: String,
    pub result: Result<SyncOutcome, SyncError>,
}

/// Results of a whole run, in processing order.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub releases: Vec<ReleaseReport>,
}

impl SyncReport {
    pub fn updated(&self) -> usize {
        self.count(|r| matches!(r, Ok(SyncOutcome::Updated { .. })))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|r| matches!(r, Ok(SyncOutcome::Unchanged { .. })))
    }

    pub fn failed(&self) -> usize {
        self.count(Result::is_err)
    }

    fn count(&self, pred: impl Fn(&Result<SyncOutcome, SyncError>) -> bool) -> usize {
        self.releases.iter().filter(|r| pred(&r.result)).count()
    }
}

/// Brings one release's feed up to date.
///
/// The freshness marker is read once, up front, and passed to the fetcher
/// as a value:
/// - No feed file yet → unconditional fetch
/// - Feed file present → conditional fetch against its modification time
///
/// On a fetch, the entries are rendered and written atomically to
/// `{dest}/{prefix}{release}.rss` with the change log's Last-Modified as
/// the file's modification time.
pub async fn sync_release(
    fetcher: &Fetcher,
    dest: &Path,
    source: &SourceLocation,
) -> Result<SyncOutcome, SyncError> {
    let path = dest.join(source.file_name());
    let marker = feed::freshness_marker(&path).map_err(|e| SyncError::Marker {
        path: path.clone(),
        source: e,
    })?;

    let log = match marker {
        None => fetcher.changelog(source).await?,
        Some(than) => match fetcher.newer_changelog(source, than).await? {
            FetchOutcome::Fetched(log) => log,
            FetchOutcome::NotModified { remote } => {
                return Ok(SyncOutcome::Unchanged { remote });
            }
        },
    };

    let channel = feed::render(&source.feed_title(), &source.link(), &log.entries);
    feed::write_feed(&path, &channel, log.modified)?;

    Ok(SyncOutcome::Updated {
        entries: log.entries.len(),
        modified: log.modified,
    })
}

/// Syncs every source in order and reports per-release results.
///
/// With `quiet` set, progress and "not newer" notices are not logged;
/// failures are always logged.
pub async fn run(
    fetcher: &Fetcher,
    dest: &Path,
    sources: &[SourceLocation],
    quiet: bool,
) -> SyncReport {
    let mut report = SyncReport::default();

    for source in sources {
        let name = source.name();
        if !quiet {
            tracing::info!(release = %name, url = %source.changelog_url(), "Processing");
        }

        let result = sync_release(fetcher, dest, source).await;
        match &result {
            Ok(SyncOutcome::Updated { entries, modified }) => {
                if !quiet {
                    tracing::info!(
                        release = %name,
                        entries = entries,
                        modified = %modified,
                        "Feed written"
                    );
                }
            }
            Ok(SyncOutcome::Unchanged { remote }) => {
                if !quiet {
                    tracing::info!(
                        release = %name,
                        remote = %remote,
                        "Remote change log is not newer than local feed"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(release = %name, error = %e, "Failed to sync release");
            }
        }

        report.releases.push(ReleaseReport { name, result });
    }

    report
}
