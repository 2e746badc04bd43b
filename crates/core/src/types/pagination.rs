//! Pagination envelope returned by listing endpoints.

use serde::{Deserialize, Serialize};

/// Pagination metadata accompanying a listing response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

/// A page of results plus its pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> Paginated<T> {
    /// An empty first page, used by degraded prefetch paths.
    #[must_use]
    pub const fn empty(per_page: u32) -> Self {
        Self {
            data: Vec::new(),
            pagination: PaginationMeta {
                page: 1,
                per_page,
                total_items: 0,
                total_pages: 0,
            },
        }
    }
}
