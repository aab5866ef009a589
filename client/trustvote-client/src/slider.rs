//! Fixed-size pages over a list of elections.

/// Number of items per page on the dashboards.
pub const DEFAULT_PAGE_SIZE: usize = 3;

/// One position on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot<T> {
    /// A real item.
    Item(T),
    /// Padding that keeps every page the same size.
    Placeholder,
}

impl<T> Slot<T> {
    /// The item, if this slot holds one.
    pub fn item(self) -> Option<T> {
        match self {
            Slot::Item(item) => Some(item),
            Slot::Placeholder => None,
        }
    }
}

/// Tracks the current page of a list.
///
/// The list itself is passed on every call, so the slider stays valid when the
/// list is re-fetched and shrinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slider {
    page_size: usize,
    page: usize,
}

impl Default for Slider {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Slider {
    /// Creates a slider on the first page. A zero page size is treated as one.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            page: 0,
        }
    }

    /// Items per page.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of pages needed for `len` items.
    pub fn page_count(&self, len: usize) -> usize {
        len.div_ceil(self.page_size)
    }

    /// Index of the current page, clamped to the pages `len` items fill.
    pub fn current_page(&self, len: usize) -> usize {
        self.page.min(self.page_count(len).saturating_sub(1))
    }

    /// Whether the navigation buttons are shown at all.
    pub fn has_navigation(&self, len: usize) -> bool {
        len > self.page_size
    }

    /// Whether there is a page before the current one.
    pub fn has_prev(&self, len: usize) -> bool {
        self.current_page(len) > 0
    }

    /// Whether there is a page after the current one.
    pub fn has_next(&self, len: usize) -> bool {
        self.current_page(len) + 1 < self.page_count(len)
    }

    /// Moves forward one page; no-op on the last page.
    pub fn next(&mut self, len: usize) {
        let current = self.current_page(len);
        self.page = if current + 1 < self.page_count(len) {
            current + 1
        } else {
            current
        };
    }

    /// Moves back one page; no-op on the first page.
    pub fn prev(&mut self, len: usize) {
        self.page = self.current_page(len).saturating_sub(1);
    }

    /// The current page of `items`, padded with placeholders to the page size.
    pub fn page<'a, T>(&self, items: &'a [T]) -> Vec<Slot<&'a T>> {
        let start = self.current_page(items.len()) * self.page_size;
        let mut slots: Vec<_> = items
            .iter()
            .skip(start)
            .take(self.page_size)
            .map(Slot::Item)
            .collect();
        slots.resize(self.page_size, Slot::Placeholder);
        slots
    }
}
