//! Catalog query state.
//!
//! [`CatalogQuery`] holds the shopper's current filter/sort/search/page
//! state and produces the canonical query parameters sent to the catalog
//! API - the same parameter set the cache key is derived from, so equal
//! queries always hit the same entry.
//!
//! Changing a filter resets pagination: a shopper on page 3 of "Kitchen"
//! who switches to "Garden" starts at page 1 of the new result set.

use uuid::Uuid;

use meridian_core::ProductSort;

use crate::sync::key::{CacheKey, build_key};

/// Grid page size used by the storefront.
pub const DEFAULT_PER_PAGE: u32 = 12;
/// Server-side page size ceiling.
const MAX_PER_PAGE: u32 = 100;

/// Catalog filter, sort, search, and pagination state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    page: u32,
    per_page: u32,
    category_id: Option<Uuid>,
    sort: ProductSort,
    search: Option<String>,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            category_id: None,
            sort: ProductSort::default(),
            search: None,
        }
    }
}

impl CatalogQuery {
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn per_page(&self) -> u32 {
        self.per_page
    }

    #[must_use]
    pub const fn category_id(&self) -> Option<Uuid> {
        self.category_id
    }

    #[must_use]
    pub const fn sort(&self) -> ProductSort {
        self.sort
    }

    #[must_use]
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Whether any filter deviates from the defaults (drives the
    /// "clear filters" affordance).
    #[must_use]
    pub fn has_active_filters(&self) -> bool {
        self.category_id.is_some()
            || self.search.is_some()
            || self.sort != ProductSort::default()
    }

    /// Set the page size, clamped to the server's 1..=100 contract.
    #[must_use]
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.clamp(1, MAX_PER_PAGE);
        self
    }

    /// Jump to a page. Leaves every filter untouched.
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Filter by category (`None` clears). Resets to page 1 if the value
    /// actually changes.
    pub fn set_category(&mut self, category_id: Option<Uuid>) {
        if self.category_id != category_id {
            self.category_id = category_id;
            self.page = 1;
        }
    }

    /// Change the sort order. Resets to page 1 if the value actually
    /// changes.
    pub fn set_sort(&mut self, sort: ProductSort) {
        if self.sort != sort {
            self.sort = sort;
            self.page = 1;
        }
    }

    /// Set the search text (empty clears). Resets to page 1 if the
    /// normalized value actually changes.
    pub fn set_search(&mut self, search: &str) {
        let normalized = if search.is_empty() {
            None
        } else {
            Some(search.to_string())
        };
        if self.search != normalized {
            self.search = normalized;
            self.page = 1;
        }
    }

    /// Back to the default view: page 1, newest first, no category, no
    /// search. Page size is kept.
    pub fn clear_filters(&mut self) {
        self.page = 1;
        self.category_id = None;
        self.sort = ProductSort::default();
        self.search = None;
    }

    /// The full canonical parameter set, absent values included. Feeds both
    /// the cache key and the query string, so the two can never disagree.
    /// Only active products are listed on the storefront.
    #[must_use]
    pub fn params(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("page", Some(self.page.to_string())),
            ("per_page", Some(self.per_page.to_string())),
            ("status", Some("active".to_string())),
            ("category_id", self.category_id.map(|id| id.to_string())),
            ("sort", Some(self.sort.as_str().to_string())),
            ("q", self.search.clone()),
        ]
    }

    /// Present parameters only, ready for `reqwest::RequestBuilder::query`.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        self.params()
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name, v)))
            .filter(|(_, v)| !v.is_empty())
            .collect()
    }

    /// Canonical cache key for this query.
    #[must_use]
    pub fn cache_key(&self) -> CacheKey {
        build_key("products", &self.params())
    }
}

// =============================================================================
// Pagination window
// =============================================================================

/// The visible slice of page numbers around the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageWindow {
    /// Page numbers to render, always contiguous.
    pub pages: Vec<u32>,
    /// Render a "1" shortcut before the window.
    pub show_first: bool,
    /// Render a gap marker between "1" and the window.
    pub leading_gap: bool,
    /// Render a shortcut to the last page after the window.
    pub show_last: bool,
    /// Render a gap marker between the window and the last page.
    pub trailing_gap: bool,
}

/// Compute the visible page window: two pages either side of the current
/// one, clamped to `[1, total_pages]`. Returns `None` when there is a single
/// page or less - no pagination control is rendered.
#[must_use]
pub fn page_window(page: u32, total_pages: u32) -> Option<PageWindow> {
    if total_pages <= 1 {
        return None;
    }
    let page = page.clamp(1, total_pages);
    let start = page.saturating_sub(2).max(1);
    let end = (page + 2).min(total_pages);

    Some(PageWindow {
        pages: (start..=end).collect(),
        show_first: start > 1,
        leading_gap: start > 2,
        show_last: end < total_pages,
        trailing_gap: end + 1 < total_pages,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_change_resets_page() {
        let mut query = CatalogQuery::default();
        query.set_page(3);
        assert_eq!(query.page(), 3);

        query.set_category(Some(Uuid::new_v4()));
        assert_eq!(query.page(), 1, "category change resets pagination");

        query.set_page(5);
        query.set_sort(ProductSort::PriceAsc);
        assert_eq!(query.page(), 1, "sort change resets pagination");

        query.set_page(2);
        query.set_search("kettle");
        assert_eq!(query.page(), 1, "search change resets pagination");
    }

    #[test]
    fn test_unchanged_filter_keeps_page() {
        let mut query = CatalogQuery::default();
        query.set_search("kettle");
        query.set_page(4);

        query.set_search("kettle");
        assert_eq!(query.page(), 4, "setting the same value is not a change");

        query.set_sort(ProductSort::default());
        assert_eq!(query.page(), 4);
    }

    #[test]
    fn test_empty_search_equals_no_search() {
        let mut query = CatalogQuery::default();
        query.set_page(3);
        query.set_search("");
        assert_eq!(query.page(), 3, "clearing an absent search changes nothing");
        assert!(query.search().is_none());

        let with_empty = query.clone();
        assert_eq!(with_empty.cache_key(), query.cache_key());
    }

    #[test]
    fn test_clear_filters_restores_defaults() {
        let mut query = CatalogQuery::default().with_per_page(24);
        query.set_category(Some(Uuid::new_v4()));
        query.set_sort(ProductSort::NameAsc);
        query.set_search("board");
        query.set_page(7);

        query.clear_filters();
        assert_eq!(query, CatalogQuery::default().with_per_page(24));
        assert!(!query.has_active_filters());
    }

    #[test]
    fn test_per_page_clamped() {
        assert_eq!(CatalogQuery::default().with_per_page(500).per_page(), 100);
        assert_eq!(CatalogQuery::default().with_per_page(0).per_page(), 1);
    }

    #[test]
    fn test_cache_key_ignores_param_order_and_absent_values() {
        let mut a = CatalogQuery::default();
        a.set_search("mug");
        let mut b = CatalogQuery::default();
        b.set_search("mug");
        assert_eq!(a.cache_key(), b.cache_key());

        let mut c = CatalogQuery::default();
        c.set_search("teapot");
        assert_ne!(a.cache_key(), c.cache_key());
    }

    #[test]
    fn test_query_pairs_omit_absent() {
        let query = CatalogQuery::default();
        let pairs = query.query_pairs();
        assert!(pairs.iter().any(|(k, v)| *k == "status" && v == "active"));
        assert!(pairs.iter().all(|(k, _)| *k != "q"));
        assert!(pairs.iter().all(|(k, _)| *k != "category_id"));
    }

    #[test]
    fn test_window_at_first_page() {
        let window = page_window(1, 10).unwrap();
        assert_eq!(window.pages, vec![1, 2, 3]);
        assert!(!window.show_first);
        assert!(!window.leading_gap);
        assert!(window.show_last);
        assert!(window.trailing_gap);
    }

    #[test]
    fn test_window_in_the_middle() {
        let window = page_window(5, 10).unwrap();
        assert_eq!(window.pages, vec![3, 4, 5, 6, 7]);
        assert!(window.show_first);
        assert!(window.leading_gap);
        assert!(window.show_last);
        assert!(window.trailing_gap);
    }

    #[test]
    fn test_window_at_last_page() {
        let window = page_window(10, 10).unwrap();
        assert_eq!(window.pages, vec![8, 9, 10]);
        assert!(window.show_first);
        assert!(window.leading_gap);
        assert!(!window.show_last);
        assert!(!window.trailing_gap);
    }

    #[test]
    fn test_window_adjacent_to_edges_has_no_gap() {
        // start == 2: the "1" shortcut renders but no gap marker.
        let window = page_window(4, 10).unwrap();
        assert_eq!(window.pages, vec![2, 3, 4, 5, 6]);
        assert!(window.show_first);
        assert!(!window.leading_gap);

        // end == total - 1: last-page shortcut but no gap marker.
        let window = page_window(7, 10).unwrap();
        assert_eq!(window.pages, vec![5, 6, 7, 8, 9]);
        assert!(window.show_last);
        assert!(!window.trailing_gap);
    }

    #[test]
    fn test_no_control_for_single_page() {
        assert!(page_window(1, 1).is_none());
        assert!(page_window(1, 0).is_none());
    }

    #[test]
    fn test_out_of_range_page_is_clamped() {
        let window = page_window(50, 10).unwrap();
        assert_eq!(window.pages, vec![8, 9, 10]);
    }
}
