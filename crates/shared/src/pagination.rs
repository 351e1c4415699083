//! Page/offset pagination utilities.

use serde::{Deserialize, Serialize};

/// Default page size for list endpoints.
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Upper bound for `per_page`.
pub const MAX_PER_PAGE: u32 = 100;

/// Pagination metadata returned alongside list data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub total_pages: u32,
}

impl Pagination {
    /// Builds pagination metadata for a result set of `total` rows.
    pub fn new(page: u32, per_page: u32, total: i64) -> Self {
        Self {
            page,
            per_page,
            total,
            total_pages: total_pages(total, per_page),
        }
    }
}

/// Resolves optional query values into a `(page, per_page)` pair.
///
/// Page is at least 1; per_page is clamped to `1..=MAX_PER_PAGE`.
pub fn normalize(page: Option<u32>, per_page: Option<u32>) -> (u32, u32) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
    (page, per_page)
}

/// Row offset for a 1-based page.
pub fn offset(page: u32, per_page: u32) -> i64 {
    i64::from(page.saturating_sub(1)) * i64::from(per_page)
}

/// Number of pages needed to hold `total` rows.
pub fn total_pages(total: i64, per_page: u32) -> u32 {
    if total <= 0 || per_page == 0 {
        return 0;
    }
    let per_page = i64::from(per_page);
    ((total + per_page - 1) / per_page) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_defaults() {
        assert_eq!(normalize(None, None), (1, DEFAULT_PER_PAGE));
    }

    #[test]
    fn test_normalize_clamps() {
        assert_eq!(normalize(Some(0), Some(0)), (1, 1));
        assert_eq!(normalize(Some(3), Some(500)), (3, MAX_PER_PAGE));
    }

    #[test]
    fn test_offset() {
        assert_eq!(offset(1, 20), 0);
        assert_eq!(offset(2, 20), 20);
        assert_eq!(offset(5, 7), 28);
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(1, 20), 1);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
        assert_eq!(total_pages(10, 0), 0);
    }

    #[test]
    fn test_pagination_serialization() {
        let p = Pagination::new(2, 10, 35);
        assert_eq!(p.total_pages, 4);
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("\"per_page\":10"));
        assert!(json.contains("\"total_pages\":4"));
    }
}
