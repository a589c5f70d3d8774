use super::{Loader, Resources};
use crate::error::Result;
use crate::filter::SharedFilter;

/// Accepts package names (`com.acme.model`) instead of paths.
#[derive(Debug, Clone)]
pub struct PkgLoader<L> {
    delegate: L,
}

impl<L: Loader> PkgLoader<L> {
    pub fn new(delegate: L) -> Self {
        Self { delegate }
    }
}

impl<L: Loader> Loader for PkgLoader<L> {
    fn load_with(
        &self,
        pkg: &str,
        recursive: bool,
        filter: Option<SharedFilter>,
    ) -> Result<Resources> {
        self.delegate
            .load_with(&pkg.replace('.', "/"), recursive, filter)
    }
}
