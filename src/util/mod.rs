//! Utility functions shared by the feed pipeline.
//!
//! - **URL validation**: Shape checks for configured mirror URLs
//! - **Text processing**: Making change log text safe for XML and HTML output

mod text;
mod url_validator;

pub use text::{escape_html, strip_control_chars};
pub use url_validator::{validate_mirror_url, UrlValidationError};
