//! Search paths: where the roots of an aggregated scan come from.

use crate::error::Result;
use crate::location;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use url::Url;
use zip::ZipArchive;

/// Marker whose archive roots are merged in when scanning from the root.
pub const DEFAULT_MARKER: &str = "META-INF/";

pub const CLASSPATH_ENV: &str = "CLASSPATH";

/// Resolves relative paths to the locations bound to them on a search path.
///
/// Locations are `file:` URLs for directory roots and `jar:` URLs for
/// archive roots; other schemes are allowed and ignored by the loaders.
pub trait SearchPath: Send + Sync {
    /// All locations bound to `relative`, in search order.
    fn resolve_roots(&self, relative: &str) -> Result<Vec<Url>>;

    /// Locations of `marker`; used to surface archive roots for the empty path.
    fn resolve_marker_roots(&self, marker: &str) -> Result<Vec<Url>>;
}

impl<S: SearchPath + ?Sized> SearchPath for &S {
    fn resolve_roots(&self, relative: &str) -> Result<Vec<Url>> {
        (**self).resolve_roots(relative)
    }

    fn resolve_marker_roots(&self, marker: &str) -> Result<Vec<Url>> {
        (**self).resolve_marker_roots(marker)
    }
}

impl<S: SearchPath + ?Sized> SearchPath for std::sync::Arc<S> {
    fn resolve_roots(&self, relative: &str) -> Result<Vec<Url>> {
        (**self).resolve_roots(relative)
    }

    fn resolve_marker_roots(&self, marker: &str) -> Result<Vec<Url>> {
        (**self).resolve_marker_roots(marker)
    }
}

fn default_marker() -> String {
    DEFAULT_MARKER.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClasspathConfig {
    /// Directories and archives, in search order.
    #[serde(default)]
    pub entries: Vec<PathBuf>,
    #[serde(default = "default_marker")]
    pub marker: String,
}

impl Default for ClasspathConfig {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            marker: default_marker(),
        }
    }
}

impl ClasspathConfig {
    /// Entries from the `CLASSPATH` environment variable.
    pub fn from_env() -> Self {
        Self::from_env_var(CLASSPATH_ENV)
    }

    pub fn from_env_var(name: &str) -> Self {
        match std::env::var_os(name) {
            Some(value) => Self::parse(&value),
            None => Self::default(),
        }
    }

    /// Splits on the platform path separator; empty elements are dropped.
    pub fn parse(value: &OsStr) -> Self {
        Self {
            entries: std::env::split_paths(value)
                .filter(|p| !p.as_os_str().is_empty())
                .collect(),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// An ordered list of directories and zip/jar archives.
#[derive(Debug, Clone, Default)]
pub struct Classpath {
    entries: Vec<PathBuf>,
}

impl Classpath {
    /// Relative entries are made absolute against the current directory.
    pub fn new(entries: impl IntoIterator<Item = impl AsRef<Path>>) -> Result<Self> {
        let mut absolute = Vec::new();
        for entry in entries {
            let entry = std::path::absolute(entry.as_ref())?;
            if !entry.exists() {
                warn!("Classpath entry {} does not exist", entry.display());
            }
            absolute.push(entry);
        }
        Ok(Self { entries: absolute })
    }

    pub fn from_config(config: &ClasspathConfig) -> Result<Self> {
        Self::new(&config.entries)
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    fn open_archive(entry: &Path) -> Result<ZipArchive<File>> {
        Ok(ZipArchive::new(File::open(entry)?)?)
    }
}

/// Present entries with their kind; missing ones are skipped.
fn present(entries: &[PathBuf]) -> impl Iterator<Item = Result<(&PathBuf, bool)>> {
    entries.iter().filter_map(|entry| match fs::metadata(entry) {
        Ok(meta) => Some(Ok((entry, meta.is_dir()))),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Skipping missing classpath entry {}", entry.display());
            None
        }
        Err(e) => Some(Err(e.into())),
    })
}

/// Name under which `relative` exists in the archive, directory form if implicit.
fn archive_lookup<'a>(names: impl Iterator<Item = &'a str>, relative: &str) -> Option<String> {
    let folder = format!("{relative}/");
    let mut found = None;
    for name in names {
        if name == relative {
            return Some(relative.to_string());
        }
        if name.starts_with(&folder) {
            found = Some(folder.clone());
        }
    }
    found
}

impl SearchPath for Classpath {
    fn resolve_roots(&self, relative: &str) -> Result<Vec<Url>> {
        let mut roots = Vec::new();
        for item in present(&self.entries) {
            let (entry, is_dir) = item?;
            if is_dir {
                let target = if relative.is_empty() {
                    entry.clone()
                } else {
                    entry.join(relative)
                };
                match fs::metadata(&target) {
                    Ok(meta) if meta.is_dir() => roots.push(location::dir_location(&target)?),
                    Ok(_) => roots.push(location::file_location(&target)?),
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            } else if !relative.is_empty() {
                let archive = Self::open_archive(entry)?;
                if let Some(name) = archive_lookup(archive.file_names(), relative) {
                    roots.push(location::archive_entry(entry, &name)?);
                }
            }
        }
        debug!("Resolved {:?} to {} root(s)", relative, roots.len());
        Ok(roots)
    }

    fn resolve_marker_roots(&self, marker: &str) -> Result<Vec<Url>> {
        let mut roots = Vec::new();
        for item in present(&self.entries) {
            let (entry, is_dir) = item?;
            if is_dir {
                let target = entry.join(marker);
                if target.exists() {
                    roots.push(location::dir_location(&target)?);
                }
            } else {
                let archive = Self::open_archive(entry)?;
                if archive.file_names().any(|name| name.starts_with(marker)) {
                    roots.push(location::archive_entry(entry, marker)?);
                }
            }
        }
        Ok(roots)
    }
}
