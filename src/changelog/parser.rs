use std::io::{BufRead, BufReader, Read};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use thiserror::Error;

use super::date::{self, HeaderLine};
use super::{ChangeLine, Entry};

/// `path/to/package.txz:  Action.` - the path token has no whitespace or
/// colon and contains at least one `/`.
static CHANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<path>[^\s:]*/[^\s:]*):\s+(?P<action>\S.*)$").expect("change regex is valid")
});

static SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+-+\+$").expect("separator regex is valid"));

/// Errors that can occur while parsing a change log.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The stream could not be read or was not valid UTF-8.
    #[error("Failed to read change log: {0}")]
    Read(#[from] std::io::Error),
    /// A line that starts like a date header is truncated or names an impossible date.
    #[error("Malformed date header at line {line}: {text:?}")]
    MalformedHeader { line: usize, text: String },
}

/// Parser state: before the first header, or collecting a block.
enum State {
    Outside,
    Inside(Block),
}

/// An entry under construction.
struct Block {
    date: DateTime<Utc>,
    header: Vec<String>,
    changes: Vec<ChangeLine>,
    /// Indented lines continue the last change line while this is set.
    in_change: bool,
}

impl Block {
    fn new(date: DateTime<Utc>) -> Self {
        Self {
            date,
            header: Vec::new(),
            changes: Vec::new(),
            in_change: false,
        }
    }

    fn push_line(&mut self, line: &str) {
        if line.trim().is_empty() || SEPARATOR_RE.is_match(line) {
            return;
        }

        if let Some(caps) = CHANGE_RE.captures(line) {
            self.changes
                .push(ChangeLine::new(&caps["path"], caps["action"].trim()));
            self.in_change = true;
            return;
        }

        let indented = line.starts_with(char::is_whitespace);
        if indented && self.in_change {
            if let Some(change) = self.changes.last_mut() {
                change.push_note(line.trim());
                return;
            }
        }

        self.in_change = false;
        self.header.push(line.trim().to_string());
    }

    fn finish(self) -> Entry {
        Entry {
            date: self.date,
            header: self.header.join("\n"),
            changes: self.changes,
        }
    }
}

/// Parses a change log into entries, preserving document order.
///
/// Each date header opens a new entry that runs until the next header or
/// the end of the stream. Blank lines and `+----+` separators are skipped;
/// text before the first header is ignored. An empty document yields an
/// empty `Vec`.
///
/// # Errors
///
/// - [`ParseError::Read`] if the reader fails or the text is not UTF-8
/// - [`ParseError::MalformedHeader`] if a header line is truncated or invalid
///
/// On error nothing is returned, so a partly collected block is never
/// emitted.
pub fn parse<R: Read>(reader: R) -> Result<Vec<Entry>, ParseError> {
    let reader = BufReader::new(reader);
    let mut entries = Vec::new();
    let mut state = State::Outside;
    let mut preamble = 0usize;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end();

        match date::classify(line) {
            HeaderLine::Date(date) => {
                if let State::Inside(block) =
                    std::mem::replace(&mut state, State::Inside(Block::new(date)))
                {
                    entries.push(block.finish());
                }
                continue;
            }
            HeaderLine::Malformed => {
                return Err(ParseError::MalformedHeader {
                    line: index + 1,
                    text: line.to_string(),
                });
            }
            HeaderLine::NotHeader => {}
        }

        match &mut state {
            State::Outside => {
                if !line.trim().is_empty() {
                    preamble += 1;
                }
            }
            State::Inside(block) => block.push_line(line),
        }
    }

    if let State::Inside(block) = state {
        entries.push(block.finish());
    }

    if preamble > 0 {
        tracing::debug!(lines = preamble, "Ignored text before the first date header");
    }

    Ok(entries)
}
