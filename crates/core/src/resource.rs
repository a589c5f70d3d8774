use crate::error::{LoadError, Result};
use crate::location::{self, ARCHIVE_SCHEME, FILE_SCHEME};
use crate::uris;
use std::fmt;
use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io::{Cursor, Read};
use url::Url;
use zip::ZipArchive;

/// A named, addressable artifact found by a loader.
///
/// `name` is the store-relative path (`/` separated, no leading slash).
/// Two resources are equal when their locations are equal.
#[derive(Debug, Clone)]
pub struct Resource {
    name: String,
    location: Url,
}

impl Resource {
    pub fn new(name: impl Into<String>, location: Url) -> Self {
        Self {
            name: name.into(),
            location,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &Url {
        &self.location
    }

    /// Opens the content behind the location. Each call opens a fresh stream.
    pub fn open_stream(&self) -> Result<Box<dyn Read + Send>> {
        match self.location.scheme() {
            FILE_SCHEME => {
                let path = self.location.to_file_path().map_err(|_| {
                    LoadError::invalid(format!("{} is not a local file", self.location))
                })?;
                Ok(Box::new(File::open(path)?))
            }
            ARCHIVE_SCHEME => {
                let (archive, entry) = location::split_archive(&self.location)?;
                let entry = uris::decode(entry)?;
                let mut archive = ZipArchive::new(File::open(archive)?)?;
                let mut file = archive.by_name(&entry)?;
                let mut bytes = Vec::with_capacity(reserve_for(file.size()));
                file.read_to_end(&mut bytes)?;
                Ok(Box::new(Cursor::new(bytes)))
            }
            other => Err(LoadError::invalid(format!(
                "cannot open '{other}' location {}",
                self.location
            ))),
        }
    }
}

/// Upper bound on what an entry header can make us reserve up front.
const MAX_RESERVE: u64 = 1 << 20;

/// The declared size comes from the archive and is not trusted.
fn reserve_for(declared: u64) -> usize {
    usize::try_from(declared.min(MAX_RESERVE)).unwrap_or(0)
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.location == other.location
    }
}

impl Eq for Resource {}

impl Hash for Resource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.location.hash(state);
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.location)
    }
}
