//! Loaders and the lazy resource sequence they return.
//!
//! Every loader hands back a [`Resources`] sequence. Nothing is read from
//! a backing store until the caller asks whether another element exists;
//! each such request performs only the I/O needed to find one more match.

mod classpath;
mod dir;
mod jar;
mod pattern;
mod pkg;

pub use classpath::{ClasspathLoader, RootKind};
pub use dir::DirLoader;
pub use jar::JarLoader;
pub use pattern::{AntLoader, PatternLoader, RegexLoader};
pub use pkg::PkgLoader;

use crate::error::Result;
use crate::filter::{SharedFilter, filters};
use crate::resource::Resource;
use std::sync::Arc;

/// Performs a scan and yields the matching resources lazily.
///
/// Only [`load_with`](Loader::load_with) is required; the other entry points
/// fill in defaults.
pub trait Loader: Send + Sync {
    /// `filter == None` accepts everything.
    fn load_with(
        &self,
        path: &str,
        recursive: bool,
        filter: Option<SharedFilter>,
    ) -> Result<Resources>;

    /// Non-recursive, unfiltered.
    fn load(&self, path: &str) -> Result<Resources> {
        self.load_with(path, false, None)
    }

    fn load_recursive(&self, path: &str, recursive: bool) -> Result<Resources> {
        self.load_with(path, recursive, None)
    }

    /// Recursive, filtered.
    fn load_filtered(&self, path: &str, filter: SharedFilter) -> Result<Resources> {
        self.load_with(path, true, Some(filter))
    }

    /// First resource at `path`, if any. Other matches are never looked at.
    fn load_first(&self, path: &str) -> Result<Option<Resource>> {
        self.load(path)?.take_next().transpose()
    }
}

impl<L: Loader + ?Sized> Loader for &L {
    fn load_with(
        &self,
        path: &str,
        recursive: bool,
        filter: Option<SharedFilter>,
    ) -> Result<Resources> {
        (**self).load_with(path, recursive, filter)
    }
}

impl<L: Loader + ?Sized> Loader for Box<L> {
    fn load_with(
        &self,
        path: &str,
        recursive: bool,
        filter: Option<SharedFilter>,
    ) -> Result<Resources> {
        (**self).load_with(path, recursive, filter)
    }
}

impl<L: Loader + ?Sized> Loader for Arc<L> {
    fn load_with(
        &self,
        path: &str,
        recursive: bool,
        filter: Option<SharedFilter>,
    ) -> Result<Resources> {
        (**self).load_with(path, recursive, filter)
    }
}

/// One step of a single-source or aggregated scan.
pub trait Advance: Send {
    /// Finds the next match. `None` means the source is exhausted.
    fn advance(&mut self) -> Option<Result<Resource>>;
}

enum State {
    Idle,
    Peeked(Resource),
    Exhausted,
}

/// Lazy, pull-based sequence of resources.
///
/// Holds at most one buffered element. The first error ends the sequence.
/// An instance belongs to one consumer; start another `load` for a parallel
/// scan.
pub struct Resources {
    state: State,
    source: Box<dyn Advance>,
}

impl Resources {
    pub fn new(source: impl Advance + 'static) -> Self {
        Self {
            state: State::Idle,
            source: Box::new(source),
        }
    }

    pub fn empty() -> Self {
        Self {
            state: State::Exhausted,
            source: Box::new(Empty),
        }
    }

    pub fn from_results<I>(results: I) -> Self
    where
        I: Iterator<Item = Result<Resource>> + Send + 'static,
    {
        Self::new(FromIter(results))
    }

    /// Whether another element exists. May perform I/O when nothing is
    /// buffered; repeated calls do no further work.
    pub fn has_more(&mut self) -> Result<bool> {
        match self.state {
            State::Peeked(_) => Ok(true),
            State::Exhausted => Ok(false),
            State::Idle => match self.source.advance() {
                Some(Ok(resource)) => {
                    self.state = State::Peeked(resource);
                    Ok(true)
                }
                Some(Err(e)) => {
                    self.state = State::Exhausted;
                    Err(e)
                }
                None => {
                    self.state = State::Exhausted;
                    Ok(false)
                }
            },
        }
    }

    pub fn take_next(&mut self) -> Option<Result<Resource>> {
        match self.has_more() {
            Ok(true) => match std::mem::replace(&mut self.state, State::Idle) {
                State::Peeked(resource) => Some(Ok(resource)),
                _ => None,
            },
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

impl Iterator for Resources {
    type Item = Result<Resource>;

    fn next(&mut self) -> Option<Self::Item> {
        self.take_next()
    }
}

impl std::fmt::Debug for Resources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            State::Idle => "Idle",
            State::Peeked(_) => "Peeked",
            State::Exhausted => "Exhausted",
        };
        f.debug_struct("Resources").field("state", &state).finish()
    }
}

struct Empty;

impl Advance for Empty {
    fn advance(&mut self) -> Option<Result<Resource>> {
        None
    }
}

struct FromIter<I>(I);

impl<I> Advance for FromIter<I>
where
    I: Iterator<Item = Result<Resource>> + Send,
{
    fn advance(&mut self) -> Option<Result<Resource>> {
        self.0.next()
    }
}

/// Strips leading and trailing `/`.
pub(crate) fn normalize_path(path: &str) -> &str {
    path.trim_matches('/')
}

pub(crate) fn or_always(filter: Option<SharedFilter>) -> SharedFilter {
    filter.unwrap_or_else(filters::always)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    fn res(name: &str) -> Resource {
        Resource::new(name, Url::parse(&format!("file:///r/{name}")).unwrap())
    }

    struct Counting {
        calls: Arc<AtomicUsize>,
        items: std::vec::IntoIter<Result<Resource>>,
    }

    impl Advance for Counting {
        fn advance(&mut self) -> Option<Result<Resource>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.items.next()
        }
    }

    fn counting(items: Vec<Result<Resource>>) -> (Resources, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let resources = Resources::new(Counting {
            calls: calls.clone(),
            items: items.into_iter(),
        });
        (resources, calls)
    }

    #[test]
    fn test_has_more_is_idempotent_when_peeked() {
        let (mut resources, calls) = counting(vec![Ok(res("a")), Ok(res("b"))]);
        assert!(resources.has_more().unwrap());
        assert!(resources.has_more().unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert_eq!(resources.take_next().unwrap().unwrap().name(), "a");
        assert_eq!(resources.take_next().unwrap().unwrap().name(), "b");
        assert!(resources.take_next().is_none());
        assert!(!resources.has_more().unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_error_ends_the_sequence() {
        let (resources, _) = counting(vec![
            Ok(res("a")),
            Err(LoadError::state("broken")),
            Ok(res("never")),
        ]);
        let items: Vec<_> = resources.collect();
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(LoadError::State(_))));
    }

    #[test]
    fn test_empty() {
        let mut resources = Resources::empty();
        assert!(!resources.has_more().unwrap());
        assert!(resources.next().is_none());
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/org/junit/Assert.class/"), "org/junit/Assert.class");
        assert_eq!(normalize_path("//"), "");
        assert_eq!(normalize_path("a/b"), "a/b");
    }
}
