use super::{Filter, SharedFilter};
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Ordered set of child filters, unique by identity.
#[derive(Clone, Default)]
struct FilterSet {
    filters: Vec<SharedFilter>,
}

impl FilterSet {
    fn from_filters(filters: impl IntoIterator<Item = SharedFilter>) -> Self {
        let mut set = Self::default();
        for filter in filters {
            set.add(filter);
        }
        set
    }

    fn position(&self, filter: &SharedFilter) -> Option<usize> {
        self.filters
            .iter()
            .position(|f| std::ptr::addr_eq(Arc::as_ptr(f), Arc::as_ptr(filter)))
    }

    fn add(&mut self, filter: SharedFilter) -> bool {
        if self.position(&filter).is_some() {
            return false;
        }
        self.filters.push(filter);
        true
    }

    fn remove(&mut self, filter: &SharedFilter) -> bool {
        match self.position(filter) {
            Some(idx) => {
                self.filters.remove(idx);
                true
            }
            None => false,
        }
    }
}

macro_rules! mix_filter {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Default)]
        pub struct $name {
            set: FilterSet,
        }

        impl $name {
            pub fn new() -> Self {
                Self::default()
            }

            pub fn from_filters(filters: impl IntoIterator<Item = SharedFilter>) -> Self {
                Self {
                    set: FilterSet::from_filters(filters),
                }
            }

            /// Returns `false` when the filter was already present.
            pub fn add(&mut self, filter: SharedFilter) -> bool {
                self.set.add(filter)
            }

            /// Returns `false` when the filter was not present.
            pub fn remove(&mut self, filter: &SharedFilter) -> bool {
                self.set.remove(filter)
            }

            /// Builder-style [`add`](Self::add).
            pub fn mix(mut self, filter: SharedFilter) -> Self {
                self.set.add(filter);
                self
            }

            pub fn len(&self) -> usize {
                self.set.filters.len()
            }

            pub fn is_empty(&self) -> bool {
                self.set.filters.is_empty()
            }

            /// Ends configuration. The returned filter can no longer change.
            pub fn freeze(self) -> SharedFilter {
                Arc::new(self)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("filters", &self.len())
                    .finish()
            }
        }
    };
}

mix_filter! {
    /// Passes when every child passes; stops at the first rejection.
    /// Vacuously true when empty.
    AllFilter
}

mix_filter! {
    /// Passes when some child passes; stops at the first acceptance.
    /// Vacuously false when empty.
    AnyFilter
}

impl Filter for AllFilter {
    fn filtrate(&self, name: &str, location: &Url) -> bool {
        self.set.filters.iter().all(|f| f.filtrate(name, location))
    }
}

impl Filter for AnyFilter {
    fn filtrate(&self, name: &str, location: &Url) -> bool {
        self.set.filters.iter().any(|f| f.filtrate(name, location))
    }
}
