//! Resource filters.
//!
//! A filter decides whether a candidate `(name, location)` becomes a
//! [`Resource`](crate::Resource). Leaf filters are the constants, regex and
//! Ant-glob matchers and plain closures; [`AllFilter`] and [`AnyFilter`]
//! compose them with short-circuit evaluation.

mod mix;
mod matcher;

pub use self::mix::{AllFilter, AnyFilter};
pub use self::matcher::{AntFilter, RegexFilter, ant_to_regex};

use once_cell::sync::Lazy;
use std::sync::Arc;
use url::Url;

/// Decides whether a candidate is included in a scan.
///
/// Implementations must be free of side effects that change the answer:
/// a filter may be asked about the same candidate any number of times, from
/// any thread.
pub trait Filter: Send + Sync {
    fn filtrate(&self, name: &str, location: &Url) -> bool;
}

/// A frozen filter, shared read-only between a loader and its enumerators.
pub type SharedFilter = Arc<dyn Filter>;

impl<F> Filter for F
where
    F: Fn(&str, &Url) -> bool + Send + Sync,
{
    fn filtrate(&self, name: &str, location: &Url) -> bool {
        self(name, location)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Always;

impl Filter for Always {
    fn filtrate(&self, _name: &str, _location: &Url) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Never;

impl Filter for Never {
    fn filtrate(&self, _name: &str, _location: &Url) -> bool {
        false
    }
}

static ALWAYS: Lazy<SharedFilter> = Lazy::new(|| Arc::new(Always));
static NEVER: Lazy<SharedFilter> = Lazy::new(|| Arc::new(Never));

/// Shorthand constructors.
pub mod filters {
    use super::*;

    pub fn always() -> SharedFilter {
        ALWAYS.clone()
    }

    pub fn never() -> SharedFilter {
        NEVER.clone()
    }

    pub fn shared(filter: impl Filter + 'static) -> SharedFilter {
        Arc::new(filter)
    }

    pub fn all(filters: impl IntoIterator<Item = SharedFilter>) -> SharedFilter {
        AllFilter::from_filters(filters).freeze()
    }

    pub fn and(filters: impl IntoIterator<Item = SharedFilter>) -> SharedFilter {
        all(filters)
    }

    pub fn any(filters: impl IntoIterator<Item = SharedFilter>) -> SharedFilter {
        AnyFilter::from_filters(filters).freeze()
    }

    pub fn or(filters: impl IntoIterator<Item = SharedFilter>) -> SharedFilter {
        any(filters)
    }
}
