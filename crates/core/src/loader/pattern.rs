use super::{Loader, Resources};
use crate::error::Result;
use crate::filter::{AllFilter, SharedFilter};
use crate::pattern::{AntCompiler, Compiled, PatternCompiler, RegexCompiler};
use tracing::debug;

/// Narrows a wrapped loader to the scope of a pattern expression.
///
/// The pattern decides the base path and recursion; the caller's
/// `recursive` flag is ignored for patterns. Literal patterns (no
/// wildcard) are passed through untouched, flag and filter included.
#[derive(Debug, Clone)]
pub struct PatternLoader<L, C> {
    delegate: L,
    compiler: C,
}

pub type AntLoader<L> = PatternLoader<L, AntCompiler>;
pub type RegexLoader<L> = PatternLoader<L, RegexCompiler>;

impl<L: Loader, C: PatternCompiler> PatternLoader<L, C> {
    pub fn with_compiler(delegate: L, compiler: C) -> Self {
        Self { delegate, compiler }
    }

    pub fn delegate(&self) -> &L {
        &self.delegate
    }
}

impl<L: Loader> PatternLoader<L, AntCompiler> {
    pub fn ant(delegate: L) -> Self {
        Self::with_compiler(delegate, AntCompiler)
    }
}

impl<L: Loader> PatternLoader<L, RegexCompiler> {
    pub fn regex(delegate: L) -> Self {
        Self::with_compiler(delegate, RegexCompiler)
    }
}

impl<L: Loader, C: PatternCompiler> Loader for PatternLoader<L, C> {
    fn load_with(
        &self,
        pattern: &str,
        recursive: bool,
        filter: Option<SharedFilter>,
    ) -> Result<Resources> {
        let compiled = match self.compiler.compile(pattern)? {
            Compiled::Literal => return self.delegate.load_with(pattern, recursive, filter),
            Compiled::Pattern(compiled) => compiled,
        };
        debug!(
            "Pattern {:?} scans {:?} (recursive: {})",
            pattern, compiled.base_path, compiled.recursive
        );

        let merged = AllFilter::from_filters(compiled.filter.into_iter().chain(filter)).freeze();
        self.delegate
            .load_with(&compiled.base_path, compiled.recursive, Some(merged))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::filters;
    use crate::loader::DirLoader;
    use std::fs;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::tempdir;
    use url::Url;

    /// Records calls and returns nothing.
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, bool, Option<SharedFilter>)>>,
    }

    impl Loader for Recorder {
        fn load_with(
            &self,
            path: &str,
            recursive: bool,
            filter: Option<SharedFilter>,
        ) -> Result<Resources> {
            self.calls
                .lock()
                .unwrap()
                .push((path.to_string(), recursive, filter));
            Ok(Resources::empty())
        }
    }

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

    fn loc() -> Url {
        Url::parse("file:///x").unwrap()
    }

    #[test]
    fn test_ant_narrows_scope_and_forces_recursion() {
        let recorder = Recorder::default();
        let loader = PatternLoader::ant(&recorder);
        loader.load_recursive("a/b/*.txt", false).unwrap();

        let calls = recorder.calls.lock().unwrap();
        let (path, recursive, filter) = &calls[0];
        assert_eq!(path, "a/b/");
        assert!(*recursive);
        let filter = filter.as_ref().unwrap();
        assert!(filter.filtrate("a/b/c.txt", &loc()));
        assert!(!filter.filtrate("a/b/c/d.txt", &loc()));
    }

    #[test]
    fn test_ant_literal_passes_through() {
        let recorder = Recorder::default();
        let loader = PatternLoader::ant(&recorder);
        loader.load("com/acme/app.properties").unwrap();

        let calls = recorder.calls.lock().unwrap();
        let (path, recursive, filter) = &calls[0];
        assert_eq!(path, "com/acme/app.properties");
        assert!(!*recursive);
        assert!(filter.is_none());
    }

    #[test]
    fn test_caller_filter_is_combined() {
        let recorder = Recorder::default();
        let loader = PatternLoader::regex(&recorder);
        let short = filters::shared(|name: &str, _: &Url| name.len() < 12);
        loader.load_filtered(r"com/.*\.class", short).unwrap();

        let calls = recorder.calls.lock().unwrap();
        let (path, recursive, filter) = &calls[0];
        assert_eq!(path, "");
        assert!(*recursive);
        let filter = filter.as_ref().unwrap();
        assert!(filter.filtrate("com/A.class", &loc()));
        assert!(!filter.filtrate("com/acme/A.class", &loc()));
        assert!(!filter.filtrate("com/A.java", &loc()));
    }

    #[test]
    fn test_invalid_regex_fails_before_delegating() {
        let recorder = Recorder::default();
        let loader = PatternLoader::regex(&recorder);
        assert!(loader.load("a(").is_err());
        assert!(recorder.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_ant_over_directory() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "a/b.txt");
        touch(dir.path(), "a/x/b.txt");
        touch(dir.path(), "a/x/y/b.txt");
        touch(dir.path(), "a/x/c.txt");
        touch(dir.path(), "z/b.txt");

        let loader = AntLoader::ant(DirLoader::new(dir.path()).unwrap());
        assert_eq!(
            names(loader.load("a/**/b.txt").unwrap()),
            vec!["a/b.txt", "a/x/b.txt", "a/x/y/b.txt"]
        );
        assert_eq!(names(loader.load("**/c.*").unwrap()), vec!["a/x/c.txt"]);
    }
}
