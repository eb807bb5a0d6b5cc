use std::fs::{FileTimes, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use rss::Channel;
use thiserror::Error;

/// Errors that can occur while writing a feed file.
///
/// Whatever the variant, the destination file is unchanged: its previous
/// content and modification time (if it existed) are intact.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Destination '{0}' has no file name")]
    InvalidPath(PathBuf),

    #[error("Failed to create temporary file '{path}': {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to set modification time on '{path}': {source}")]
    Stamp {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to replace '{path}': {source}")]
    Replace {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Reads the freshness marker of a previously written feed.
///
/// Returns `Ok(None)` when the file does not exist, meaning there is no
/// prior feed and the change log must be fetched unconditionally.
pub fn freshness_marker(path: &Path) -> io::Result<Option<DateTime<Utc>>> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(Some(DateTime::<Utc>::from(meta.modified()?))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Writes `channel` to `path` with its modification time set to `modified`.
///
/// See [`write_with`] for the atomicity guarantees.
pub fn write_feed(path: &Path, channel: &Channel, modified: DateTime<Utc>) -> Result<(), PersistError> {
    let xml = channel.to_string();
    write_with(path, modified, |w| w.write_all(xml.as_bytes()))
}

/// Atomically replaces `path` with the bytes produced by `write`, stamped with `modified`.
///
/// The content goes to a uniquely named temporary file in the same
/// directory, which is synced to disk and given `modified` as both access
/// and modification time before being renamed over `path`. Rename keeps
/// the timestamps, so the new content and its freshness marker appear
/// together. On any failure the temporary file is removed and `path` is
/// left as it was.
pub fn write_with<F>(path: &Path, modified: DateTime<Utc>, write: F) -> Result<(), PersistError>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let temp_path = temp_path_for(path)?;

    let result = write_temp(&temp_path, modified, write).and_then(|()| {
        std::fs::rename(&temp_path, path).map_err(|source| PersistError::Replace {
            path: path.to_path_buf(),
            source,
        })
    });

    if result.is_err() {
        let _ = std::fs::remove_file(&temp_path);
    }
    result
}

fn write_temp<F>(temp_path: &Path, modified: DateTime<Utc>, write: F) -> Result<(), PersistError>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let write_err = |source: io::Error| PersistError::Write {
        path: temp_path.to_path_buf(),
        source,
    };

    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(temp_path)
        .map_err(|source| PersistError::Create {
            path: temp_path.to_path_buf(),
            source,
        })?;

    let mut writer = BufWriter::new(file);
    write(&mut writer).map_err(write_err)?;
    let file = writer
        .into_inner()
        .map_err(|e| write_err(e.into_error()))?;
    file.sync_all().map_err(write_err)?;

    let time = SystemTime::from(modified);
    file.set_times(FileTimes::new().set_accessed(time).set_modified(time))
        .map_err(|source| PersistError::Stamp {
            path: temp_path.to_path_buf(),
            source,
        })
}

/// `.{name}.tmp.{nanos}` next to the destination, so the rename stays on one filesystem.
fn temp_path_for(path: &Path) -> Result<PathBuf, PersistError> {
    let name = path
        .file_name()
        .ok_or_else(|| PersistError::InvalidPath(path.to_path_buf()))?;
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    Ok(path.with_file_name(format!(
        ".{}.tmp.{:016x}",
        name.to_string_lossy(),
        suffix
    )))
}
