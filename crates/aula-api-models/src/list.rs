//! List endpoint responses.
//!
//! Collection endpoints answer either with a bare JSON array or with a
//! paginated envelope carrying the items under `results`. Both shapes decode
//! into [`ListResponse`] and are flattened by [`ListResponse::into_items`].

use serde::{Deserialize, Serialize};

/// Paginated list envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page<T> {
    /// Total number of matching rows, when the server reports it.
    #[serde(default)]
    pub count: Option<u64>,
    /// Link to the next page.
    #[serde(default)]
    pub next: Option<String>,
    /// Link to the previous page.
    #[serde(default)]
    pub previous: Option<String>,
    /// Items on this page.
    pub results: Vec<T>,
}

/// Either list shape returned by a collection endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ListResponse<T> {
    /// Plain JSON array.
    Bare(Vec<T>),
    /// Envelope with a `results` array.
    Paginated(Page<T>),
}

impl<T> ListResponse<T> {
    /// Items of the response regardless of its shape.
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Bare(items) => items,
            Self::Paginated(page) => page.results,
        }
    }

    /// Number of items carried by this response.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Bare(items) => items.len(),
            Self::Paginated(page) => page.results.len(),
        }
    }

    /// Whether the response carries no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> From<ListResponse<T>> for Vec<T> {
    fn from(response: ListResponse<T>) -> Self {
        response.into_items()
    }
}
