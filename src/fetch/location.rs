use thiserror::Error;

use crate::util::{validate_mirror_url, UrlValidationError};

/// Name of the change log document inside each release directory.
pub const CHANGELOG_FILE: &str = "ChangeLog.txt";

/// Errors raised when a (mirror, release, prefix) tuple cannot be turned
/// into a [`SourceLocation`].
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Invalid mirror URL {url:?}: {source}")]
    Mirror {
        url: String,
        #[source]
        source: UrlValidationError,
    },
    /// Releases become single path segments and file names, so they must
    /// be non-empty and free of separators.
    #[error("Invalid release name {0:?}")]
    Release(String),
    #[error("Invalid feed prefix {0:?}")]
    Prefix(String),
}

/// Where a release's change log lives and what its feed is called locally.
///
/// The remote locator is `{mirror}/{release}/ChangeLog.txt`; the prefix
/// only affects the local file name and feed title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Mirror base URL without a trailing slash.
    mirror: String,
    release: String,
    prefix: String,
}

impl SourceLocation {
    pub fn new(mirror: &str, release: &str, prefix: &str) -> Result<Self, LocationError> {
        let url = validate_mirror_url(mirror).map_err(|source| LocationError::Mirror {
            url: mirror.to_string(),
            source,
        })?;

        if !is_path_segment(release) {
            return Err(LocationError::Release(release.to_string()));
        }
        if !prefix.is_empty() && !is_path_segment(prefix) {
            return Err(LocationError::Prefix(prefix.to_string()));
        }

        Ok(Self {
            mirror: url.as_str().trim_end_matches('/').to_string(),
            release: release.to_string(),
            prefix: prefix.to_string(),
        })
    }

    /// `{prefix}{release}`, used in feed titles, file names and log fields.
    pub fn name(&self) -> String {
        format!("{}{}", self.prefix, self.release)
    }

    /// `{mirror}/{release}`, the feed's base link.
    pub fn link(&self) -> String {
        format!("{}/{}", self.mirror, self.release)
    }

    pub fn changelog_url(&self) -> String {
        format!("{}/{}", self.link(), CHANGELOG_FILE)
    }

    /// Local feed file name, `{prefix}{release}.rss`.
    pub fn file_name(&self) -> String {
        format!("{}.rss", self.name())
    }

    pub fn feed_title(&self) -> String {
        format!("{} for {}", CHANGELOG_FILE, self.name())
    }
}

/// A name that stays one path segment when appended to the mirror URL:
/// no separators, no query or fragment delimiters, no whitespace.
fn is_path_segment(s: &str) -> bool {
    !s.is_empty()
        && s != "."
        && s != ".."
        && !s.contains(['/', '\\', '?', '#'])
        && !s.chars().any(|c| c.is_control() || c.is_whitespace())
}
