//! Pattern compilation: turns a pattern expression into the narrowest
//! base path, a recursion flag and a matcher.
//!
//! Compilation is pure. It never touches a backing store, so an invalid
//! pattern is reported before any I/O happens.

use crate::error::Result;
use crate::filter::{AntFilter, RegexFilter, SharedFilter};
use std::sync::Arc;

/// Scan scope derived from a pattern.
#[derive(Clone)]
pub struct CompiledPattern {
    /// Literal prefix known to contain every match.
    pub base_path: String,
    pub recursive: bool,
    pub filter: Option<SharedFilter>,
}

impl std::fmt::Debug for CompiledPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledPattern")
            .field("base_path", &self.base_path)
            .field("recursive", &self.recursive)
            .field("filter", &self.filter.is_some())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum Compiled {
    /// No wildcard: load the pattern as a plain path, unchanged.
    Literal,
    Pattern(CompiledPattern),
}

pub trait PatternCompiler: Send + Sync {
    fn compile(&self, pattern: &str) -> Result<Compiled>;
}

/// Ant-style globs: `?` one character, `*` within a segment, `**` across segments.
#[derive(Debug, Clone, Copy, Default)]
pub struct AntCompiler;

impl PatternCompiler for AntCompiler {
    fn compile(&self, pattern: &str) -> Result<Compiled> {
        if !has_wildcard(pattern) {
            return Ok(Compiled::Literal);
        }
        Ok(Compiled::Pattern(CompiledPattern {
            base_path: ant_base_path(pattern).to_string(),
            // Matches may sit anywhere below the base path.
            recursive: true,
            filter: Some(Arc::new(AntFilter::new(pattern)?)),
        }))
    }
}

/// Full regular expressions matched against the whole store-relative name.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexCompiler;

impl PatternCompiler for RegexCompiler {
    fn compile(&self, pattern: &str) -> Result<Compiled> {
        Ok(Compiled::Pattern(CompiledPattern {
            base_path: String::new(),
            recursive: true,
            filter: Some(Arc::new(RegexFilter::new(pattern)?)),
        }))
    }
}

pub fn has_wildcard(glob: &str) -> bool {
    glob.contains(['*', '?'])
}

/// Everything up to and including the last `/` before the first wildcard.
pub fn ant_base_path(glob: &str) -> &str {
    let Some(first) = glob.find(['*', '?']) else {
        return glob;
    };
    match glob[..first].rfind('/') {
        Some(slash) => &glob[..=slash],
        None => "",
    }
}
