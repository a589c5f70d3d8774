//! Building and taking apart resource locations.
//!
//! Plain files are addressed with `file:` URLs. Archive entries use the
//! `jar:<file-url>!/<entry>` form, where the entry part is percent-encoded.

use crate::error::{LoadError, Result};
use crate::uris;
use std::path::{Path, PathBuf};
use url::Url;

pub const ARCHIVE_SCHEME: &str = "jar";
pub const FILE_SCHEME: &str = "file";
pub(crate) const ARCHIVE_SEPARATOR: &str = "!/";

pub fn file_location(path: &Path) -> Result<Url> {
    Url::from_file_path(path)
        .map_err(|_| LoadError::invalid(format!("{} is not an absolute path", path.display())))
}

pub fn dir_location(path: &Path) -> Result<Url> {
    Url::from_directory_path(path)
        .map_err(|_| LoadError::invalid(format!("{} is not an absolute path", path.display())))
}

/// `jar:` location of the archive root, e.g. `jar:file:///lib/a.jar!/`.
pub fn archive_root(archive: &Path) -> Result<Url> {
    archive_entry(archive, "")
}

pub fn archive_entry(archive: &Path, entry: &str) -> Result<Url> {
    let file = file_location(archive)?;
    Ok(Url::parse(&format!(
        "{ARCHIVE_SCHEME}:{file}{ARCHIVE_SEPARATOR}{}",
        uris::encode_path(entry)
    ))?)
}

/// Splits an archive location into the archive file and the still-encoded entry.
pub(crate) fn split_archive(location: &Url) -> Result<(PathBuf, &str)> {
    let raw = location.as_str();
    let body = raw
        .strip_prefix(ARCHIVE_SCHEME)
        .and_then(|s| s.strip_prefix(':'))
        .ok_or_else(|| LoadError::invalid(format!("{raw} is not an archive location")))?;
    let sep = body
        .find(ARCHIVE_SEPARATOR)
        .ok_or_else(|| LoadError::invalid(format!("{raw} has no '{ARCHIVE_SEPARATOR}'")))?;
    let file = Url::parse(&body[..sep])?;
    let archive = file
        .to_file_path()
        .map_err(|_| LoadError::invalid(format!("{file} does not name a local archive")))?;
    Ok((archive, &body[sep + ARCHIVE_SEPARATOR.len()..]))
}

/// The archive root that contains `location`, e.g. `jar:file:///a.jar!/`.
pub(crate) fn archive_root_of(location: &Url) -> Option<Url> {
    let raw = location.as_str();
    let sep = raw.find(ARCHIVE_SEPARATOR)?;
    Url::parse(&raw[..sep + ARCHIVE_SEPARATOR.len()]).ok()
}
