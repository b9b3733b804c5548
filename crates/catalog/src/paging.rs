//! Fixed-size pages over a result list.
//!
//! Page numbers are 1-based. Out-of-range requests are clamped, never rejected.

/// One page of results.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Page actually returned after clamping.
    pub page: usize,
    pub page_count: usize,
}

/// `max(1, ceil(count / page_size))`. A page size of 0 is treated as 1.
pub fn page_count(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1)).max(1)
}

/// Clamps `requested` into `[1, page_count]`.
pub fn clamp_page(requested: usize, page_count: usize) -> usize {
    requested.clamp(1, page_count.max(1))
}

/// Slices `items` into the requested page.
pub fn paginate<T: Clone>(items: &[T], page_size: usize, requested: usize) -> Page<T> {
    let size = page_size.max(1);
    let page_count = page_count(items.len(), size);
    let page = clamp_page(requested, page_count);
    let start = (page - 1).saturating_mul(size).min(items.len());
    let end = start.saturating_add(size).min(items.len());
    Page {
        items: items[start..end].to_vec(),
        page,
        page_count,
    }
}

/// Selected page for a session. Falls back to page 1 whenever a new result
/// count or page size leaves the selection past the last page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    page: usize,
    page_size: usize,
    count: usize,
}

impl Pagination {
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            count: 0,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn page_count(&self) -> usize {
        page_count(self.count, self.page_size)
    }

    /// Selects a page, clamped to the current page count.
    pub fn select(&mut self, page: usize) -> usize {
        self.page = clamp_page(page, self.page_count());
        self.page
    }

    /// Applies a new result count and page size.
    pub fn update(&mut self, count: usize, page_size: usize) {
        self.count = count;
        self.page_size = page_size.max(1);
        if self.page > self.page_count() {
            self.page = 1;
        }
    }

    /// Selects `page` for a result of `count` items, clamped to the page
    /// count. When the count or page size changed and the previously selected
    /// page no longer exists, the selection resets to 1 instead.
    pub fn request(&mut self, page: usize, count: usize, page_size: usize) -> usize {
        let page_size = page_size.max(1);
        let changed = count != self.count || page_size != self.page_size;
        let previous = self.page;
        self.count = count;
        self.page_size = page_size;
        self.page = if changed && previous > self.page_count() {
            1
        } else {
            clamp_page(page, self.page_count())
        };
        self.page
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_contract() {
        assert_eq!(page_count(0, 10), 1);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(5, 0), 5);
    }

    #[test]
    fn every_page_but_the_last_is_full() {
        let items: Vec<u32> = (0..23).collect();
        let count = page_count(items.len(), 5);
        for page in 1..count {
            assert_eq!(paginate(&items, 5, page).items.len(), 5);
        }
        let last = paginate(&items, 5, count);
        assert_eq!(last.items, vec![20, 21, 22]);
    }

    #[test]
    fn requests_are_clamped() {
        let items = [1, 2, 3];
        let high = paginate(&items, 2, 9);
        assert_eq!((high.page, high.items), (2, vec![3]));
        let low = paginate(&items, 2, 0);
        assert_eq!((low.page, low.items), (1, vec![1, 2]));
        let empty = paginate::<u8>(&[], 10, 3);
        assert_eq!((empty.page, empty.page_count), (1, 1));
        assert!(empty.items.is_empty());
    }

    #[test]
    fn tracker_resets_when_page_disappears() {
        let mut pagination = Pagination::new(10);
        pagination.update(100, 10);
        assert_eq!(pagination.select(7), 7);

        pagination.update(80, 10);
        assert_eq!(pagination.page(), 7);
        pagination.update(80, 20);
        assert_eq!(pagination.page(), 1);

        pagination.select(2);
        pagination.update(30, 50);
        assert_eq!(pagination.page(), 1);
    }

    #[test]
    fn requests_clamp_unless_the_selection_disappeared() {
        let mut pagination = Pagination::new(50);
        assert_eq!(pagination.request(3, 30, 10), 3);
        assert_eq!(pagination.request(4, 30, 10), 3);
        assert_eq!(pagination.request(0, 30, 10), 1);

        assert_eq!(pagination.request(3, 30, 10), 3);
        assert_eq!(pagination.request(3, 12, 10), 1);
        assert_eq!(pagination.request(2, 12, 10), 2);
        assert_eq!(pagination.request(9, 12, 5), 3);
    }
}
