use super::{Advance, DirLoader, JarLoader, Loader, Resources, normalize_path, or_always};
use crate::classpath::{Classpath, ClasspathConfig, DEFAULT_MARKER, SearchPath};
use crate::error::{LoadError, Result};
use crate::filter::SharedFilter;
use crate::location::{self, ARCHIVE_SCHEME, FILE_SCHEME};
use crate::resource::Resource;
use crate::uris;
use indexmap::IndexSet;
use std::path::PathBuf;
use tracing::debug;
use url::Url;

/// What a resolved search-path location turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootKind {
    Directory { base: PathBuf, context: Url },
    Archive { archive: PathBuf, context: Url },
    Unsupported(String),
}

impl RootKind {
    /// Derives the root by stripping `relative` off the end of `location`.
    pub fn classify(location: &Url, relative: &str) -> Result<Self> {
        match location.scheme() {
            FILE_SCHEME => {
                let decoded = uris::decode(location.path())?;
                let base = PathBuf::from(strip_suffix(&decoded, relative, location)?);
                let context = location::dir_location(&base)?;
                Ok(RootKind::Directory { base, context })
            }
            ARCHIVE_SCHEME => {
                let (archive, entry) = location::split_archive(location)?;
                let entry = uris::decode(entry)?;
                let prefix = strip_suffix(&entry, relative, location)?;
                let context = Url::parse(&format!(
                    "{}{}",
                    location::archive_root(&archive)?,
                    uris::encode_path(prefix)
                ))?;
                Ok(RootKind::Archive { archive, context })
            }
            other => Ok(RootKind::Unsupported(other.to_string())),
        }
    }
}

fn strip_suffix<'a>(decoded: &'a str, relative: &str, location: &Url) -> Result<&'a str> {
    decoded
        .rfind(relative)
        .map(|idx| &decoded[..idx])
        .ok_or_else(|| LoadError::state(format!("{location} does not end with {relative:?}")))
}

/// Aggregates every root of a search path into one lazy sequence.
///
/// Roots are resolved when `load` is called; each root is opened only when
/// the previous one is exhausted.
#[derive(Debug, Clone)]
pub struct ClasspathLoader<S = Classpath> {
    search_path: S,
    marker: String,
}

impl ClasspathLoader<Classpath> {
    /// Uses the `CLASSPATH` environment variable.
    pub fn from_env() -> Result<Self> {
        Self::from_config(&ClasspathConfig::from_env())
    }

    pub fn from_config(config: &ClasspathConfig) -> Result<Self> {
        Ok(Self::new(Classpath::from_config(config)?).with_marker(config.marker.clone()))
    }
}

impl<S: SearchPath> ClasspathLoader<S> {
    pub fn new(search_path: S) -> Self {
        Self {
            search_path,
            marker: DEFAULT_MARKER.to_string(),
        }
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    pub fn search_path(&self) -> &S {
        &self.search_path
    }

    fn resolve(&self, path: &str) -> Result<Vec<Url>> {
        if !path.is_empty() {
            return self.search_path.resolve_roots(path);
        }

        // Archive roots are invisible to the empty path; the marker finds them.
        let mut roots: IndexSet<Url> = self.search_path.resolve_roots(path)?.into_iter().collect();
        for marked in self.search_path.resolve_marker_roots(&self.marker)? {
            if marked.scheme() != ARCHIVE_SCHEME {
                continue;
            }
            if let Some(root) = location::archive_root_of(&marked) {
                roots.insert(root);
            }
        }
        Ok(roots.into_iter().collect())
    }
}

impl<S: SearchPath> Loader for ClasspathLoader<S> {
    fn load_with(
        &self,
        path: &str,
        recursive: bool,
        filter: Option<SharedFilter>,
    ) -> Result<Resources> {
        let path = normalize_path(path);
        let roots = self.resolve(path)?;
        debug!("Loading {:?} from {} root(s)", path, roots.len());
        Ok(Resources::new(ClasspathEnumerator {
            roots: roots.into_iter(),
            path: path.to_string(),
            recursive,
            filter: or_always(filter),
            current: None,
        }))
    }
}

struct ClasspathEnumerator {
    roots: std::vec::IntoIter<Url>,
    path: String,
    recursive: bool,
    filter: SharedFilter,
    current: Option<Resources>,
}

impl ClasspathEnumerator {
    fn open(&self, root: &Url) -> Result<Option<Resources>> {
        let kind = RootKind::classify(root, &self.path).map_err(|e| match e {
            LoadError::State(_) => e,
            other => LoadError::state(format!("cannot derive root of {root}: {other}")),
        })?;
        let filter = Some(self.filter.clone());
        match kind {
            RootKind::Directory { base, context } => DirLoader::with_context(context, base)?
                .load_with(&self.path, self.recursive, filter)
                .map(Some),
            RootKind::Archive { archive, context } => JarLoader::with_context(context, archive)?
                .load_with(&self.path, self.recursive, filter)
                .map(Some),
            RootKind::Unsupported(scheme) => {
                debug!("Skipping {} root {}", scheme, root);
                Ok(None)
            }
        }
    }
}

impl Advance for ClasspathEnumerator {
    fn advance(&mut self) -> Option<Result<Resource>> {
        loop {
            if let Some(inner) = self.current.as_mut() {
                match inner.next() {
                    Some(item) => return Some(item),
                    None => self.current = None,
                }
            }

            let root = self.roots.next()?;
            debug!("Opening root {}", root);
            match self.open(&root) {
                Ok(inner) => self.current = inner,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
