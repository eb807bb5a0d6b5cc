use thiserror::Error;
use url::Url;

/// Errors that can occur during mirror URL validation.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL carries a query or fragment, which cannot be extended with path segments.
    #[error("Mirror URL must not contain a query or fragment: {0}")]
    NotABase(String),
}

/// Validates a mirror base URL.
///
/// Mirrors are configured by the operator, so private and loopback hosts
/// are allowed (local mirrors are common); only the shape is checked:
/// - The scheme must be `http` or `https`
/// - There must be no query string or fragment, since release paths are
///   appended to the URL verbatim
///
/// # Examples
///
/// ```
/// use sl_feeds::util::validate_mirror_url;
///
/// let url = validate_mirror_url("http://slackware.osuosl.org/").unwrap();
/// assert_eq!(url.host_str(), Some("slackware.osuosl.org"));
///
/// assert!(validate_mirror_url("ftp://ftp.slackware.com/pub").is_err());
/// ```
pub fn validate_mirror_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    if url.query().is_some() || url.fragment().is_some() {
        return Err(UrlValidationError::NotABase(url.to_string()));
    }

    Ok(url)
}
