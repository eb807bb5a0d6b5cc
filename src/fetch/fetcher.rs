use chrono::{DateTime, Utc};
use futures::StreamExt;
use reqwest::header::LAST_MODIFIED;
use thiserror::Error;

use super::http_date::parse_http_date;
use super::location::SourceLocation;
use crate::changelog::{self, Entry, ParseError};

/// Largest change log body accepted (10 MiB).
const MAX_CHANGELOG_SIZE: usize = 10 * 1024 * 1024;

/// Errors that can occur while fetching a change log.
///
/// A remote that is simply not newer is not an error; see
/// [`FetchOutcome::NotModified`].
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, timeout)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {status} from {url}")]
    HttpStatus { status: u16, url: String },
    /// Response carried no Last-Modified header
    #[error("No Last-Modified header from {url}")]
    MissingLastModified { url: String },
    /// Last-Modified was present but not an HTTP date
    #[error("Unparsable Last-Modified {value:?} from {url}")]
    InvalidLastModified { url: String, value: String },
    /// Body could not be parsed as a change log
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    /// Response body exceeded the size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
}

/// A fully fetched and parsed change log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeLog {
    pub entries: Vec<Entry>,
    /// The document's Last-Modified time; becomes the feed file's mtime.
    pub modified: DateTime<Utc>,
}

/// Result of a conditional fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The remote was newer and has been fetched.
    Fetched(ChangeLog),
    /// The remote is not newer than the known-fresh time; nothing to do.
    NotModified { remote: DateTime<Utc> },
}

/// Fetches change logs from mirrors, one request at a time.
///
/// Wraps a [`reqwest::Client`]; timeouts and TLS trust are configured on
/// the client by the caller.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetches and parses the release's change log unconditionally.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Network`] - Connection, TLS or timeout errors
    /// - [`FetchError::HttpStatus`] - Non-2xx HTTP response
    /// - [`FetchError::MissingLastModified`] / [`FetchError::InvalidLastModified`]
    /// - [`FetchError::ResponseTooLarge`] / [`FetchError::IncompleteResponse`]
    /// - [`FetchError::Parse`] - Body is not a valid change log
    pub async fn changelog(&self, source: &SourceLocation) -> Result<ChangeLog, FetchError> {
        let url = source.changelog_url();
        let response = self.client.get(&url).send().await?;
        let response = check_status(response, &url)?;
        let modified = last_modified(&response, &url)?;

        let bytes = read_limited_bytes(response, MAX_CHANGELOG_SIZE).await?;
        let entries = changelog::parse(bytes.as_slice())?;

        tracing::debug!(
            url = %url,
            entries = entries.len(),
            modified = %modified,
            "Fetched change log"
        );

        Ok(ChangeLog { entries, modified })
    }

    /// Fetches the change log only if the remote copy is strictly newer than `than`.
    ///
    /// Issues a HEAD request first. If the remote Last-Modified is after
    /// `than`, falls through to [`Fetcher::changelog`]; otherwise returns
    /// [`FetchOutcome::NotModified`] without transferring the body. An
    /// equal timestamp counts as not newer.
    ///
    /// # Errors
    ///
    /// Same as [`Fetcher::changelog`]. A missing or unparsable
    /// Last-Modified on the HEAD response is an error, never a guess.
    pub async fn newer_changelog(
        &self,
        source: &SourceLocation,
        than: DateTime<Utc>,
    ) -> Result<FetchOutcome, FetchError> {
        let url = source.changelog_url();
        let response = self.client.head(&url).send().await?;
        let response = check_status(response, &url)?;
        let remote = last_modified(&response, &url)?;

        if remote > than {
            tracing::debug!(url = %url, remote = %remote, local = %than, "Remote change log is newer");
            return self.changelog(source).await.map(FetchOutcome::Fetched);
        }

        Ok(FetchOutcome::NotModified { remote })
    }
}

fn check_status(response: reqwest::Response, url: &str) -> Result<reqwest::Response, FetchError> {
    if !response.status().is_success() {
        return Err(FetchError::HttpStatus {
            status: response.status().as_u16(),
            url: url.to_string(),
        });
    }
    Ok(response)
}

fn last_modified(response: &reqwest::Response, url: &str) -> Result<DateTime<Utc>, FetchError> {
    let header = response
        .headers()
        .get(LAST_MODIFIED)
        .ok_or_else(|| FetchError::MissingLastModified {
            url: url.to_string(),
        })?;

    let value = String::from_utf8_lossy(header.as_bytes());
    parse_http_date(&value).ok_or_else(|| FetchError::InvalidLastModified {
        url: url.to_string(),
        value: value.into_owned(),
    })
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    if let Some(len) = expected_length {
        if len > limit as u64 {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
