//! Pagination primitives shared by list queries.

use serde::{Deserialize, Serialize};

/// Requested page (1-based).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page: u32,
    pub per_page: u32,
}

impl Page {
    pub const DEFAULT_PER_PAGE: u32 = 20;
    pub const MAX_PER_PAGE: u32 = 200;

    /// Build a page request, clamping to sane bounds.
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, Self::MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> usize {
        ((self.page - 1) as usize) * self.per_page as usize
    }

    /// Slice an already filtered and sorted result set.
    pub fn apply<T>(&self, rows: Vec<T>) -> Paginated<T> {
        let total = rows.len();
        let items = rows
            .into_iter()
            .skip(self.offset())
            .take(self.per_page as usize)
            .collect();
        Paginated {
            items,
            page: self.page,
            per_page: self.per_page,
            total,
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_PER_PAGE)
    }
}

/// One page of results plus the unpaginated total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: usize,
}

impl<T> Paginated<T> {
    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.per_page as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_slices_and_keeps_total() {
        let page = Page::new(2, 3).apply((1..=8).collect::<Vec<_>>());
        assert_eq!(page.items, vec![4, 5, 6]);
        assert_eq!(page.total, 8);
        assert_eq!(page.total_pages(), 3);
    }

    #[test]
    fn new_clamps_zero_values() {
        let page = Page::new(0, 0);
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, 1);
    }
}
