use crate::record::WebhookRecord;

/// Records per page.
pub const PAGE_SIZE: usize = 20;

/// One page of stored records, newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPage {
    pub records: Vec<WebhookRecord>,
    /// Total rows in the store, across all pages.
    pub total: usize,
    pub page: usize,
}

/// Pagination state over the persisted record set.
///
/// `page` always stays inside `0..total_pages()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    page: usize,
    page_size: usize,
    total: usize,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::new(PAGE_SIZE)
    }
}

impl PageCursor {
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 0,
            page_size: page_size.max(1),
            total: 0,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// `max(1, ceil(total / page_size))`.
    pub fn total_pages(&self) -> usize {
        if self.total == 0 {
            1
        } else {
            self.total.div_ceil(self.page_size)
        }
    }

    /// Rows skipped before the current page.
    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.page_size)
    }

    /// Page index to load for "next", if one exists.
    pub fn next_page(&self) -> Option<usize> {
        (self.page + 1 < self.total_pages()).then_some(self.page + 1)
    }

    /// Page index to load for "previous", if one exists.
    pub fn prev_page(&self) -> Option<usize> {
        self.page.checked_sub(1)
    }

    /// Adopt the result of a page query, clamping the page into range.
    pub fn apply(&mut self, page: usize, total: usize) {
        self.total = total;
        self.page = page.min(self.total_pages() - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_has_one_page() {
        let cursor = PageCursor::default();
        assert_eq!(cursor.total_pages(), 1);
        assert_eq!(cursor.next_page(), None);
        assert_eq!(cursor.prev_page(), None);
    }

    #[test]
    fn total_pages_rounds_up() {
        let mut cursor = PageCursor::default();
        cursor.apply(0, 20);
        assert_eq!(cursor.total_pages(), 1);
        cursor.apply(0, 21);
        assert_eq!(cursor.total_pages(), 2);
        cursor.apply(0, 45);
        assert_eq!(cursor.total_pages(), 3);
    }

    #[test]
    fn navigation_guard_never_leaves_range() {
        let mut cursor = PageCursor::default();
        cursor.apply(0, 45);
        assert_eq!(cursor.next_page(), Some(1));
        cursor.apply(2, 45);
        assert_eq!(cursor.next_page(), None);
        assert_eq!(cursor.prev_page(), Some(1));
        assert_eq!(cursor.offset(), 40);
    }

    #[test]
    fn apply_clamps_out_of_range_page() {
        let mut cursor = PageCursor::default();
        cursor.apply(7, 25);
        assert_eq!(cursor.page(), 1);
        cursor.apply(3, 0);
        assert_eq!(cursor.page(), 0);
    }

    #[test]
    fn zero_page_size_is_treated_as_one() {
        let mut cursor = PageCursor::new(0);
        cursor.apply(0, 3);
        assert_eq!(cursor.page_size(), 1);
        assert_eq!(cursor.total_pages(), 3);
    }
}
