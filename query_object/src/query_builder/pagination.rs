//! Query builder utilities
//!
//! This module provides skip/limit pagination.

/// Page size used when the caller does not pick one
pub const DEFAULT_PAGE_SIZE: i64 = 5;

/// Pagination configuration
///
/// Page numbers are 1-indexed. No bounds checking happens here: a page number
/// of zero or below produces a negative skip, which is left for the engine to
/// reject.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

impl Pagination {
    pub fn new() -> Self {
        Self {
            limit: None,
            skip: None,
        }
    }

    /// Skip/limit pair for a 1-indexed page
    pub fn page(page_number: i64, page_size: i64) -> Self {
        let skip = page_number.saturating_sub(1).saturating_mul(page_size);
        Self {
            limit: Some(page_size),
            skip: Some(skip),
        }
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_skip(mut self, skip: i64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.limit.is_none() && self.skip.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page_has_no_skip() {
        let page = Pagination::page(1, DEFAULT_PAGE_SIZE);
        assert_eq!(page.skip, Some(0));
        assert_eq!(page.limit, Some(5));
    }

    #[test]
    fn test_page_skip_grows_with_size() {
        for (n, s) in [(2, 5), (3, 10), (7, 1), (10, 25)] {
            let page = Pagination::page(n, s);
            assert_eq!(page.skip, Some((n - 1) * s));
            assert_eq!(page.limit, Some(s));
        }
    }

    #[test]
    fn test_page_zero_gives_negative_skip() {
        assert_eq!(Pagination::page(0, 5).skip, Some(-5));
        assert_eq!(Pagination::page(-1, 5).skip, Some(-10));
    }

    #[test]
    fn test_builder_methods() {
        let pagination = Pagination::new().with_limit(3).with_skip(6);
        assert_eq!(pagination.limit, Some(3));
        assert_eq!(pagination.skip, Some(6));
        assert!(!pagination.is_empty());
        assert!(Pagination::default().is_empty());
    }
}
