// ABOUTME: Pagination for list endpoints
// ABOUTME: Normalises page/limit query values and builds the response metadata

use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// A clamped page window. Pages are 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationParams {
    page: i64,
    limit: i64,
}

impl PaginationParams {
    /// Build from raw query values; missing ones take defaults, the rest are clamped
    pub fn from_query(page: Option<i64>, limit: Option<i64>) -> Self {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        // Highest page whose offset still fits in an i64
        let last_page = i64::MAX / limit;
        Self {
            page: page.unwrap_or(1).clamp(1, last_page),
            limit,
        }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self::from_query(None, None)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: i64,
    pub page_size: i64,
    pub total_items: i64,
    pub total_pages: i64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl PaginationMeta {
    pub fn new(params: &PaginationParams, total_items: i64) -> Self {
        let total_pages = (total_items + params.limit - 1) / params.limit;
        Self {
            page: params.page,
            page_size: params.limit,
            total_items,
            total_pages,
            has_next_page: params.page < total_pages,
            has_previous_page: params.page > 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, params: &PaginationParams, total_items: i64) -> Self {
        Self {
            data,
            pagination: PaginationMeta::new(params, total_items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_from_query_clamps() {
        let p = PaginationParams::from_query(Some(3), Some(10));
        assert_eq!((p.page(), p.limit(), p.offset()), (3, 10, 20));

        let p = PaginationParams::from_query(Some(0), Some(500));
        assert_eq!((p.page(), p.limit(), p.offset()), (1, MAX_PAGE_SIZE, 0));

        let p = PaginationParams::from_query(Some(-2), Some(0));
        assert_eq!((p.page(), p.limit()), (1, 1));

        assert_eq!(PaginationParams::default().limit(), DEFAULT_PAGE_SIZE);
    }

    #[rstest]
    #[case(Some(1))]
    #[case(Some(20))]
    #[case(Some(MAX_PAGE_SIZE))]
    fn test_huge_page_does_not_overflow(#[case] limit: Option<i64>) {
        let p = PaginationParams::from_query(Some(i64::MAX), limit);
        assert!(p.offset() >= 0);
        assert!(p.page() <= i64::MAX / p.limit());

        // The page reported in metadata is the clamped one
        let meta = PaginationMeta::new(&p, 5);
        assert_eq!(meta.page, p.page());
        assert!(!meta.has_next_page);
    }

    #[test]
    fn test_meta() {
        let meta = PaginationMeta::new(&PaginationParams::from_query(Some(2), Some(10)), 25);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next_page);
        assert!(meta.has_previous_page);

        let empty = PaginationMeta::new(&PaginationParams::default(), 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next_page);
        assert!(!empty.has_previous_page);
    }
}
