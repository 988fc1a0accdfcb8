//! Paginated list responses.

use serde::Serialize;

/// `{items, page, per_page, total, total_pages}`
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, page: u32, per_page: u32, total: i64) -> Self {
        let per_page_i64 = i64::from(per_page.max(1));
        Self {
            items,
            page,
            per_page,
            total,
            total_pages: (total + per_page_i64 - 1) / per_page_i64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(Page::<u8>::new(vec![], 1, 20, 0).total_pages, 0);
        assert_eq!(Page::<u8>::new(vec![], 1, 20, 20).total_pages, 1);
        assert_eq!(Page::<u8>::new(vec![], 2, 20, 41).total_pages, 3);
    }
}
