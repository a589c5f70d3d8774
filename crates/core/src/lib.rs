//! Lazy resource discovery over directories, zip/jar archives and
//! classpath-style search paths.
//!
//! ```no_run
//! use loadkit_core::{ClasspathLoader, Loader, PatternLoader};
//!
//! let loader = PatternLoader::ant(ClasspathLoader::from_env()?);
//! for resource in loader.load("META-INF/**/*.properties")? {
//!     println!("{}", resource?);
//! }
//! # Ok::<(), loadkit_core::LoadError>(())
//! ```

pub mod classpath;
pub mod error;
pub mod filter;
pub mod loader;
pub mod location;
pub mod logging;
pub mod pattern;
pub mod resource;
pub mod uris;

pub use classpath::{Classpath, ClasspathConfig, SearchPath};
pub use error::{LoadError, Result};
pub use filter::{AllFilter, AnyFilter, AntFilter, Filter, RegexFilter, SharedFilter, filters};
pub use loader::{
    AntLoader, ClasspathLoader, DirLoader, JarLoader, Loader, PatternLoader, PkgLoader,
    RegexLoader, Resources,
};
pub use pattern::{AntCompiler, PatternCompiler, RegexCompiler};
pub use resource::Resource;
