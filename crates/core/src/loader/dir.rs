use super::{Advance, Loader, Resources, normalize_path, or_always};
use crate::error::{LoadError, Result};
use crate::filter::SharedFilter;
use crate::location;
use crate::resource::Resource;
use crate::uris;
use std::collections::VecDeque;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, trace};
use url::Url;

/// Loads resources from a directory tree.
///
/// Names are relative to the `context` directory; locations are `file:` URLs
/// resolved against it. Symlinked files are reported under the link's name;
/// symlinked directories below the requested path are not descended into,
/// so link cycles end the walk.
#[derive(Debug, Clone)]
pub struct DirLoader {
    context: Url,
    root: PathBuf,
}

impl DirLoader {
    /// `root` must be absolute; it doubles as the naming context.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let context = location::dir_location(&root)?;
        Ok(Self { context, root })
    }

    pub fn from_location(location: &Url) -> Result<Self> {
        let path = location
            .to_file_path()
            .map_err(|_| LoadError::invalid(format!("{location} is not a local directory")))?;
        Self::new(path)
    }

    pub fn with_context(context: Url, root: impl Into<PathBuf>) -> Result<Self> {
        if context.scheme() != location::FILE_SCHEME {
            return Err(LoadError::invalid(format!(
                "directory context must be a file location, got {context}"
            )));
        }
        Ok(Self {
            context,
            root: root.into(),
        })
    }

    pub fn context(&self) -> &Url {
        &self.context
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Loader for DirLoader {
    fn load_with(
        &self,
        path: &str,
        recursive: bool,
        filter: Option<SharedFilter>,
    ) -> Result<Resources> {
        let enumerator = DirEnumerator::new(
            self.context.clone(),
            &self.root,
            normalize_path(path),
            recursive,
            or_always(filter),
        )?;
        Ok(Resources::new(enumerator))
    }
}

/// Breadth-first walk driven by an explicit work queue.
struct DirEnumerator {
    context: Url,
    base: PathBuf,
    recursive: bool,
    filter: SharedFilter,
    queue: VecDeque<PathBuf>,
}

impl DirEnumerator {
    fn new(
        context: Url,
        root: &Path,
        path: &str,
        recursive: bool,
        filter: SharedFilter,
    ) -> Result<Self> {
        let base = context
            .to_file_path()
            .map_err(|_| LoadError::invalid(format!("{context} is not a local directory")))?;

        let target = if path.is_empty() {
            root.to_path_buf()
        } else {
            root.join(path)
        };
        let mut queue = VecDeque::new();
        if target.is_dir() {
            queue.extend(list_children(&target)?);
        } else {
            queue.push_back(target);
        }
        debug!(
            "Directory scan of {:?} under {} (recursive: {})",
            path, context, recursive
        );

        Ok(Self {
            context,
            base,
            recursive,
            filter,
            queue,
        })
    }

    fn resource_for(&self, file: &Path) -> Result<Resource> {
        let relative = file.strip_prefix(&self.base).map_err(|_| {
            LoadError::state(format!(
                "{} is outside of {}",
                file.display(),
                self.base.display()
            ))
        })?;

        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(segment) => segments.push(segment.to_str().ok_or_else(|| {
                    LoadError::state(format!("{} is not valid UTF-8", file.display()))
                })?),
                _ => {
                    return Err(LoadError::state(format!(
                        "cannot name {} relative to {}",
                        file.display(),
                        self.base.display()
                    )));
                }
            }
        }
        let name = segments.join("/");

        // "./" keeps a leading "x:" segment from parsing as a scheme.
        let location = self
            .context
            .join(&format!("./{}", uris::encode_path(&name)))
            .map_err(|e| LoadError::state(format!("cannot address {name} in {}: {e}", self.context)))?;
        Ok(Resource::new(name, location))
    }
}

impl Advance for DirEnumerator {
    fn advance(&mut self) -> Option<Result<Resource>> {
        while let Some(entry) = self.queue.pop_front() {
            let (meta, linked) = match entry_metadata(&entry) {
                Ok(Some(found)) => found,
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            };

            if meta.is_file() {
                let resource = match self.resource_for(&entry) {
                    Ok(resource) => resource,
                    Err(e) => return Some(Err(e)),
                };
                trace!("Candidate {}", resource.name());
                if self.filter.filtrate(resource.name(), resource.location()) {
                    return Some(Ok(resource));
                }
            } else if meta.is_dir() && self.recursive {
                if linked {
                    debug!("Not descending into linked directory {}", entry.display());
                    continue;
                }
                match list_children(&entry) {
                    Ok(children) => self.queue.extend(children),
                    Err(e) => return Some(Err(e)),
                }
            }
        }
        None
    }
}

/// Metadata with symlinks resolved, and whether `path` itself is a link.
/// `None` when the path, or the link target, does not exist.
fn entry_metadata(path: &Path) -> Result<Option<(fs::Metadata, bool)>> {
    let link = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if !link.file_type().is_symlink() {
        return Ok(Some((link, false)));
    }
    match fs::metadata(path) {
        Ok(meta) => Ok(Some((meta, true))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Direct children in name order.
fn list_children(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut children = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    children.sort();
    Ok(children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::filters;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    fn touch(root: &Path, name: &str) {
        let path = root.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, name).unwrap();
    }

    fn names(resources: Resources) -> Vec<String> {
        let mut names: Vec<String> = resources
            .map(|r| r.unwrap().name().to_string())
            .collect();
        names.sort();
        names
    }

    fn tree() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        touch(dir.path(), "pkg/A.class");
        touch(dir.path(), "pkg/B.class");
        touch(dir.path(), "pkg/sub/C.class");
        touch(dir.path(), "pkg/sub/deeper/D.txt");
        touch(dir.path(), "other/E.class");
        dir
    }

    #[test]
    fn test_non_recursive_skips_subdirectories() {
        let dir = tree();
        let loader = DirLoader::new(dir.path()).unwrap();
        assert_eq!(
            names(loader.load("pkg").unwrap()),
            vec!["pkg/A.class", "pkg/B.class"]
        );
    }

    #[test]
    fn test_recursive_yields_every_depth_once() {
        let dir = tree();
        let loader = DirLoader::new(dir.path()).unwrap();
        assert_eq!(
            names(loader.load_recursive("/pkg/", true).unwrap()),
            vec![
                "pkg/A.class",
                "pkg/B.class",
                "pkg/sub/C.class",
                "pkg/sub/deeper/D.txt"
            ]
        );
    }

    #[test]
    fn test_single_file_path() {
        let dir = tree();
        let loader = DirLoader::new(dir.path()).unwrap();
        let found = loader.load_first("pkg/sub/C.class").unwrap().unwrap();
        assert_eq!(found.name(), "pkg/sub/C.class");
        assert_eq!(
            found.location(),
            &location::file_location(&dir.path().join("pkg/sub/C.class")).unwrap()
        );
    }

    #[test]
    fn test_missing_path_is_empty() {
        let dir = tree();
        let loader = DirLoader::new(dir.path()).unwrap();
        assert!(loader.load_first("nope/X.class").unwrap().is_none());
    }

    #[test]
    fn test_filter_applies() {
        let dir = tree();
        let loader = DirLoader::new(dir.path()).unwrap();
        let class = filters::shared(|name: &str, _: &Url| name.ends_with(".class"));
        assert_eq!(
            names(loader.load_filtered("", class).unwrap()),
            vec![
                "other/E.class",
                "pkg/A.class",
                "pkg/B.class",
                "pkg/sub/C.class"
            ]
        );
    }

    #[test]
    fn test_names_with_spaces_are_encoded_in_locations() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "my dir/配置 文件.txt");
        let loader = DirLoader::new(dir.path()).unwrap();
        let found = loader.load_first("my dir/配置 文件.txt").unwrap().unwrap();
        assert_eq!(found.name(), "my dir/配置 文件.txt");
        assert!(!found.location().as_str().contains(' '));
        assert_eq!(
            found.location().to_file_path().unwrap(),
            dir.path().join("my dir/配置 文件.txt")
        );
    }

    #[test]
    fn test_first_result_does_not_walk_everything() {
        let dir = tempdir().unwrap();
        for i in 0..50 {
            touch(dir.path(), &format!("bulk/{i:02}.txt"));
            touch(dir.path(), &format!("bulk/nested/{i:02}/file.txt"));
        }
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = {
            let seen = seen.clone();
            filters::shared(move |_: &str, _: &Url| {
                seen.fetch_add(1, Ordering::SeqCst);
                true
            })
        };
        let loader = DirLoader::new(dir.path()).unwrap();
        let mut resources = loader.load_filtered("bulk", counter).unwrap();
        assert!(resources.next().unwrap().is_ok());
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_linked_directories_are_not_followed() {
        use std::os::unix::fs::symlink;

        let dir = tempdir().unwrap();
        touch(dir.path(), "tree/a.txt");
        symlink(dir.path().join("tree"), dir.path().join("tree/loop")).unwrap();
        symlink(dir.path().join("tree/a.txt"), dir.path().join("tree/link.txt")).unwrap();
        symlink(dir.path().join("gone.txt"), dir.path().join("tree/dangling.txt")).unwrap();

        let loader = DirLoader::new(dir.path()).unwrap();
        assert_eq!(
            names(loader.load_recursive("tree", true).unwrap()),
            vec!["tree/a.txt", "tree/link.txt"]
        );
    }

    #[test]
    fn test_relative_root_is_rejected() {
        assert!(matches!(
            DirLoader::new("relative/root"),
            Err(LoadError::InvalidArgument(_))
        ));
    }
}
