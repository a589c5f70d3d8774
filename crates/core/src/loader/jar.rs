use super::{Advance, Loader, Resources, normalize_path, or_always};
use crate::error::{LoadError, Result};
use crate::filter::SharedFilter;
use crate::location;
use crate::resource::Resource;
use crate::uris;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use url::Url;
use zip::ZipArchive;

/// Loads entries of a zip/jar archive.
///
/// The archive is opened again for every `load`, and closed when the
/// returned sequence is dropped.
#[derive(Debug, Clone)]
pub struct JarLoader {
    context: Url,
    archive: PathBuf,
}

impl JarLoader {
    pub fn new(archive: impl Into<PathBuf>) -> Result<Self> {
        let archive = archive.into();
        let context = location::archive_root(&archive)?;
        Ok(Self { context, archive })
    }

    /// From a `jar:<file-url>!/` location.
    pub fn from_location(location: &Url) -> Result<Self> {
        let (archive, _) = location::split_archive(location)?;
        Self::new(archive)
    }

    /// `context` must be a `jar:` location ending in `/`; entry locations are
    /// appended to it.
    pub fn with_context(context: Url, archive: impl Into<PathBuf>) -> Result<Self> {
        if context.scheme() != location::ARCHIVE_SCHEME || !context.as_str().ends_with('/') {
            return Err(LoadError::invalid(format!(
                "archive context must be a jar location ending in '/', got {context}"
            )));
        }
        Ok(Self {
            context,
            archive: archive.into(),
        })
    }

    pub fn context(&self) -> &Url {
        &self.context
    }

    pub fn archive(&self) -> &Path {
        &self.archive
    }
}

impl Loader for JarLoader {
    fn load_with(
        &self,
        path: &str,
        recursive: bool,
        filter: Option<SharedFilter>,
    ) -> Result<Resources> {
        let archive = ZipArchive::new(File::open(&self.archive)?)?;
        Ok(Resources::new(ArchiveEnumerator::new(
            self.context.clone(),
            archive,
            normalize_path(path),
            recursive,
            or_always(filter),
        )))
    }
}

/// Single pass over the archive's entries, directories skipped.
pub(crate) struct ArchiveEnumerator<R> {
    context: Url,
    archive: ZipArchive<R>,
    index: usize,
    path: String,
    folder: String,
    recursive: bool,
    filter: SharedFilter,
}

impl<R: Read + Seek> ArchiveEnumerator<R> {
    pub(crate) fn new(
        context: Url,
        archive: ZipArchive<R>,
        path: &str,
        recursive: bool,
        filter: SharedFilter,
    ) -> Self {
        let folder = if path.is_empty() || path.ends_with('/') {
            path.to_string()
        } else {
            format!("{path}/")
        };
        debug!(
            "Archive scan of {:?} in {} ({} entries, recursive: {})",
            path,
            context,
            archive.len(),
            recursive
        );
        Self {
            context,
            archive,
            index: 0,
            path: path.to_string(),
            folder,
            recursive,
            filter,
        }
    }

    /// Exact match, or a child (any descendant when recursive) of the folder.
    fn includes(&self, name: &str) -> bool {
        if name == self.path {
            return true;
        }
        match name.strip_prefix(self.folder.as_str()) {
            Some(rest) => self.recursive || !rest.contains('/'),
            None => false,
        }
    }

    fn location_of(&self, name: &str) -> Result<Url> {
        let raw = format!("{}{}", self.context, uris::encode_path(name));
        Url::parse(&raw)
            .map_err(|e| LoadError::state(format!("cannot address {name} in {}: {e}", self.context)))
    }
}

impl<R: Read + Seek + Send> Advance for ArchiveEnumerator<R> {
    fn advance(&mut self) -> Option<Result<Resource>> {
        while self.index < self.archive.len() {
            let index = self.index;
            self.index += 1;

            let name = match self.archive.by_index_raw(index) {
                Ok(entry) if entry.is_dir() => continue,
                Ok(entry) => entry.name().to_string(),
                Err(e) => return Some(Err(e.into())),
            };
            if !self.includes(&name) {
                continue;
            }

            let location = match self.location_of(&name) {
                Ok(location) => location,
                Err(e) => return Some(Err(e)),
            };
            trace!("Candidate {}", name);
            if self.filter.filtrate(&name, &location) {
                return Some(Ok(Resource::new(name, location)));
            }
        }
        None
    }
}
