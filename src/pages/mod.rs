//! Routed pages.
//!
//! ARCHITECTURE
//! ============
//! Route handlers load everything a page needs, then provide it as context
//! before rendering the app. Pages read their data with `use_context` and
//! fall back to an empty default.

pub mod events;
pub mod games;
pub mod home;
pub mod locations;
pub mod not_found;
pub mod sign_in;

/// Context for a list page: the current result set, or a load failure.
#[derive(Debug, Clone)]
pub struct ListData<T> {
    pub items: Vec<T>,
    pub failed: bool,
}

impl<T> ListData<T> {
    #[must_use]
    pub fn loaded(items: Vec<T>) -> Self {
        Self { items, failed: false }
    }

    #[must_use]
    pub fn failed() -> Self {
        Self { items: Vec::new(), failed: true }
    }
}

impl<T> Default for ListData<T> {
    fn default() -> Self {
        Self::loaded(Vec::new())
    }
}

#[cfg(test)]
#[path = "pages_test.rs"]
mod tests;
