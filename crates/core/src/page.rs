use serde::Serialize;

/// Default page size when the caller does not ask for one.
pub const DEFAULT_PER_PAGE: u32 = 10;

/// Largest page size a caller may request.
pub const MAX_PER_PAGE: u32 = 100;

/// Normalized offset pagination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    per_page: u32,
}

impl PageRequest {
    /// Builds a request, clamping `page` to at least 1 and `per_page` to `1..=MAX_PER_PAGE`.
    #[must_use]
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page
                .unwrap_or(DEFAULT_PER_PAGE)
                .clamp(1, MAX_PER_PAGE),
        }
    }

    /// One-based page number.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Rows per page.
    #[must_use]
    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Rows skipped before this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }

    /// Wraps one page of items together with the unpaged total.
    #[must_use]
    pub fn into_page<T>(self, items: Vec<T>, total: u64) -> Page<T> {
        Page {
            items,
            page: self.page,
            per_page: self.per_page,
            total,
            total_pages: total.div_ceil(u64::from(self.per_page)),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// One-based page number.
    pub page: u32,
    /// Requested page size.
    pub per_page: u32,
    /// Total matching rows across all pages.
    pub total: u64,
    /// Number of pages needed for `total` rows.
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Maps page items while keeping pagination metadata.
    pub fn map<U>(self, transform: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(transform).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MAX_PER_PAGE, PageRequest};

    #[test]
    fn defaults_to_first_page_of_ten() {
        let request = PageRequest::default();
        assert_eq!(request.page(), 1);
        assert_eq!(request.per_page(), 10);
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn clamps_out_of_range_values() {
        let request = PageRequest::new(Some(0), Some(10_000));
        assert_eq!(request.page(), 1);
        assert_eq!(request.per_page(), MAX_PER_PAGE);

        let request = PageRequest::new(Some(3), Some(0));
        assert_eq!(request.per_page(), 1);
        assert_eq!(request.offset(), 2);
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = PageRequest::new(Some(3), Some(20)).into_page(vec![1, 2], 42);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, 3);

        let empty = PageRequest::default().into_page(Vec::<u8>::new(), 0);
        assert_eq!(empty.total_pages, 0);
    }
}
