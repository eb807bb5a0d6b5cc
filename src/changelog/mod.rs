//! Slackware `ChangeLog.txt` model and parser.
//!
//! A change log is a plain-text document made of dated blocks, newest
//! first. Each block has a date header, optional free-form commentary and
//! any number of package change lines:
//!
//! ```text
//! Fri Sep  9 22:34:31 UTC 2016
//! a/bash-4.4-x86_64-1.txz:  Upgraded.
//!   Thanks to Chet Ramey.
//! n/openssl-1.0.2h-x86_64-2.txz:  Rebuilt.
//!   (* Security fix *)
//! +--------------------------+
//! Thu Sep  8 18:03:11 UTC 2016
//! Mirrors are syncing a new ISO, please be patient.
//! ```
//!
//! - `parser` - Line-classifying state machine producing [`Entry`] values
//! - `date` - Header date recognition and time zone handling

mod date;
mod parser;

use std::fmt;

use chrono::{DateTime, Utc};

pub use parser::{parse, ParseError};

/// Marker Slackware puts on change lines that fix a security issue.
pub const SECURITY_FIX_MARKER: &str = "(* Security fix *)";

/// One dated block of a change log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Date declared by the block's header line.
    pub date: DateTime<Utc>,
    /// Commentary lines that are not part of any change line, joined by `\n`.
    pub header: String,
    /// Package change lines in document order.
    pub changes: Vec<ChangeLine>,
}

impl Entry {
    /// True when any change line in this entry is marked as a security fix.
    pub fn security_fix(&self) -> bool {
        self.changes.iter().any(|c| c.security_fix)
    }
}

/// Renders the entry back into change log text.
impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.date.format("%a %b %e %H:%M:%S UTC %Y"))?;
        if !self.header.is_empty() {
            writeln!(f, "{}", self.header)?;
        }
        for change in &self.changes {
            write!(f, "{change}")?;
        }
        Ok(())
    }
}

/// A single `path: action` line plus its indented continuation lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeLine {
    /// Package or path token, e.g. `a/bash-4.4-x86_64-1.txz`.
    pub path: String,
    /// Text after the colon, e.g. `Upgraded.`.
    pub action: String,
    /// Indented lines following the change line, trimmed and joined by `\n`.
    pub notes: String,
    pub security_fix: bool,
}

impl ChangeLine {
    pub(crate) fn new(path: &str, action: &str) -> Self {
        Self {
            path: path.to_string(),
            action: action.to_string(),
            notes: String::new(),
            security_fix: action.contains(SECURITY_FIX_MARKER),
        }
    }

    pub(crate) fn push_note(&mut self, note: &str) {
        if !self.notes.is_empty() {
            self.notes.push('\n');
        }
        self.notes.push_str(note);
        self.security_fix |= note.contains(SECURITY_FIX_MARKER);
    }
}

impl fmt::Display for ChangeLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:  {}", self.path, self.action)?;
        for note in self.notes.lines() {
            writeln!(f, "  {note}")?;
        }
        Ok(())
    }
}
