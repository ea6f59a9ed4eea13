//! Tag filter construction for `search_by_tag` and `delete_by_tag`.

use crate::memory::store::StoreFilter;

/// A disjunctive tag filter, or the sentinel meaning "nothing can match".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagFilter {
    /// No usable tags were requested. Callers return an empty result without
    /// touching the store.
    Empty,
    /// A record matches if any of its tags equals any of these (case-sensitive).
    AnyOf(Vec<String>),
}

impl TagFilter {
    /// Trim each requested tag and drop blanks.
    pub fn build<S: AsRef<str>>(requested: &[S]) -> Self {
        let tags: Vec<String> = requested
            .iter()
            .map(|t| t.as_ref().trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        if tags.is_empty() {
            Self::Empty
        } else {
            Self::AnyOf(tags)
        }
    }

    /// The store predicate, or `None` for the empty sentinel.
    pub fn to_store_filter(&self) -> Option<StoreFilter> {
        match self {
            Self::Empty => None,
            Self::AnyOf(tags) => Some(StoreFilter::AnyTag(tags.clone())),
        }
    }
}
