use std::ops::RangeInclusive;
use std::sync::Arc;

const DEFAULT_ITEMS_PER_PAGE: usize = 10;

/// Page-based view over a shared, ordered collection.
///
/// Follows the deferred clamping approach of list widget state: `set_page`
/// clamps against the collection it sees at the time, and every read clamps
/// again, so a source that shrinks underneath the paginator settles on the
/// last valid page on the next read instead of producing an empty window.
///
/// Pages are 1-indexed. An empty collection has zero pages, and
/// `current_page()` still reports `1` in that case.
#[derive(Debug, Clone)]
pub struct WindowedListPaginator<T> {
    elements: Arc<[T]>,
    items_per_page: usize,
    current_page: usize,
}

/// Snapshot of one page, produced by [`WindowedListPaginator::window`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationWindow<'a, T> {
    pub current_page: usize,
    pub items_per_page: usize,
    pub total_elements: usize,
    pub page_count: usize,
    pub visible: &'a [T],
}

impl<T> PaginationWindow<'_, T> {
    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    /// 1-based positions of the visible items within the whole collection,
    /// e.g. `11..=20` for the second page of ten. `None` when nothing is visible.
    pub fn display_range(&self) -> Option<RangeInclusive<usize>> {
        if self.visible.is_empty() {
            return None;
        }
        let first = (self.current_page - 1) * self.items_per_page + 1;
        Some(first..=first + self.visible.len() - 1)
    }
}

impl<T> Default for WindowedListPaginator<T> {
    fn default() -> Self {
        Self {
            elements: Arc::from(Vec::new()),
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            current_page: 1,
        }
    }
}

impl<T> WindowedListPaginator<T> {
    pub fn new(elements: impl Into<Arc<[T]>>, items_per_page: usize) -> Self {
        let mut paginator = Self::default();
        paginator.configure(elements, items_per_page);
        paginator
    }

    /// Replaces the source collection and page size and goes back to page 1.
    pub fn configure(&mut self, elements: impl Into<Arc<[T]>>, items_per_page: usize) {
        self.elements = elements.into();
        self.items_per_page = normalize_page_size(items_per_page);
        self.current_page = 1;
    }

    /// Replaces the source collection but keeps the requested page.
    pub fn set_elements(&mut self, elements: impl Into<Arc<[T]>>) {
        self.elements = elements.into();
    }

    /// Replaces the page size but keeps the requested page.
    pub fn set_items_per_page(&mut self, items_per_page: usize) {
        self.items_per_page = normalize_page_size(items_per_page);
    }

    /// Requests `page`. Out-of-range requests settle on the nearest valid page.
    pub fn set_page(&mut self, page: usize) {
        let clamped = self.clamp(page);
        if clamped != page {
            log::debug!(
                "requested page {} clamped to {} (page_count={})",
                page,
                clamped,
                self.page_count()
            );
        }
        self.current_page = clamped;
    }

    pub fn current_page(&self) -> usize {
        self.clamp(self.current_page)
    }

    pub fn items_per_page(&self) -> usize {
        self.items_per_page
    }

    pub fn total_elements(&self) -> usize {
        self.elements.len()
    }

    pub fn elements(&self) -> &Arc<[T]> {
        &self.elements
    }

    /// `ceil(total / items_per_page)`, and `0` for an empty collection.
    pub fn page_count(&self) -> usize {
        self.elements.len().div_ceil(self.items_per_page)
    }

    /// Items on the current page, clipped to the collection bounds.
    pub fn visible_elements(&self) -> &[T] {
        let len = self.elements.len();
        let start = (self.current_page() - 1).saturating_mul(self.items_per_page);
        if start >= len {
            return &[];
        }
        let end = start.saturating_add(self.items_per_page).min(len);
        &self.elements[start..end]
    }

    /// `1..=page_count()`, empty when there are no pages.
    pub fn page_numbers(&self) -> RangeInclusive<usize> {
        1..=self.page_count()
    }

    pub fn has_previous(&self) -> bool {
        self.current_page() > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page() < self.page_count()
    }

    /// Moves forward one page. Returns whether the page changed.
    pub fn next_page(&mut self) -> bool {
        let before = self.current_page();
        self.set_page(before.saturating_add(1));
        self.current_page != before
    }

    /// Moves back one page. Returns whether the page changed.
    pub fn previous_page(&mut self) -> bool {
        let before = self.current_page();
        self.set_page(before.saturating_sub(1));
        self.current_page != before
    }

    pub fn first_page(&mut self) {
        self.set_page(1);
    }

    pub fn last_page(&mut self) {
        self.set_page(self.page_count());
    }

    pub fn window(&self) -> PaginationWindow<'_, T> {
        PaginationWindow {
            current_page: self.current_page(),
            items_per_page: self.items_per_page,
            total_elements: self.elements.len(),
            page_count: self.page_count(),
            visible: self.visible_elements(),
        }
    }

    fn clamp(&self, page: usize) -> usize {
        page.clamp(1, self.page_count().max(1))
    }
}

fn normalize_page_size(items_per_page: usize) -> usize {
    if items_per_page == 0 {
        log::warn!("items_per_page must be at least 1, using 1");
        return 1;
    }
    items_per_page
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn numbers(n: usize) -> Vec<usize> {
        (1..=n).collect()
    }

    #[test]
    fn test_twenty_three_items_ten_per_page() {
        let mut paginator = WindowedListPaginator::new(numbers(23), 10);
        assert_eq!(paginator.page_count(), 3);
        assert_eq!(paginator.visible_elements(), &numbers(10)[..]);

        paginator.set_page(3);
        assert_eq!(paginator.visible_elements(), &[21, 22, 23]);

        paginator.set_page(4);
        assert_eq!(paginator.current_page(), 3);
        assert_eq!(paginator.visible_elements(), &[21, 22, 23]);
    }

    #[test]
    fn test_empty_collection_has_no_pages() {
        let mut paginator = WindowedListPaginator::<u32>::new(Vec::new(), 10);
        assert_eq!(paginator.page_count(), 0);
        assert!(paginator.visible_elements().is_empty());
        assert_eq!(paginator.page_numbers().count(), 0);

        paginator.set_page(5);
        assert_eq!(paginator.current_page(), 1);
        assert!(!paginator.has_next());
        assert!(!paginator.has_previous());
    }

    #[test]
    fn test_page_size_larger_than_collection_is_one_page() {
        let paginator = WindowedListPaginator::new(numbers(4), 50);
        assert_eq!(paginator.page_count(), 1);
        assert_eq!(paginator.visible_elements(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_page_zero_clamps_to_first() {
        let mut paginator = WindowedListPaginator::new(numbers(30), 10);
        paginator.set_page(2);
        paginator.set_page(0);
        assert_eq!(paginator.current_page(), 1);
    }

    #[test]
    fn test_configure_resets_to_first_page() {
        let mut paginator = WindowedListPaginator::new(numbers(30), 10);
        paginator.set_page(3);
        paginator.configure(numbers(100), 5);
        assert_eq!(paginator.current_page(), 1);
        assert_eq!(paginator.page_count(), 20);
    }

    #[test]
    fn test_shrinking_source_reclamps_on_read() {
        let mut paginator = WindowedListPaginator::new(numbers(50), 10);
        paginator.set_page(5);
        assert_eq!(paginator.current_page(), 5);

        paginator.set_elements(numbers(15));
        assert_eq!(paginator.current_page(), 2);
        assert_eq!(paginator.visible_elements(), &[11, 12, 13, 14, 15]);
    }

    #[test]
    fn test_growing_source_keeps_page() {
        let mut paginator = WindowedListPaginator::new(numbers(20), 10);
        paginator.set_page(2);
        paginator.set_elements(numbers(40));
        assert_eq!(paginator.current_page(), 2);
        assert_eq!(paginator.visible_elements()[0], 11);
    }

    #[test]
    fn test_zero_page_size_becomes_one() {
        let paginator = WindowedListPaginator::new(numbers(3), 0);
        assert_eq!(paginator.items_per_page(), 1);
        assert_eq!(paginator.page_count(), 3);
    }

    #[test]
    fn test_page_numbers() {
        let paginator = WindowedListPaginator::new(numbers(23), 10);
        assert_eq!(paginator.page_numbers().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_navigation() {
        let mut paginator = WindowedListPaginator::new(numbers(25), 10);
        assert!(!paginator.previous_page());
        assert!(paginator.next_page());
        assert!(paginator.next_page());
        assert_eq!(paginator.current_page(), 3);
        assert!(!paginator.next_page());

        paginator.first_page();
        assert_eq!(paginator.current_page(), 1);
        paginator.last_page();
        assert_eq!(paginator.current_page(), 3);
        assert!(paginator.has_previous());
        assert!(!paginator.has_next());
    }

    #[test]
    fn test_window_snapshot() {
        let mut paginator = WindowedListPaginator::new(numbers(23), 10);
        paginator.set_page(2);
        let window = paginator.window();
        assert_eq!(window.current_page, 2);
        assert_eq!(window.total_elements, 23);
        assert_eq!(window.page_count, 3);
        assert_eq!(window.visible.len(), 10);
        assert_eq!(window.display_range(), Some(11..=20));

        let empty = WindowedListPaginator::<u8>::default();
        assert_eq!(empty.window().display_range(), None);
    }

    #[test]
    fn test_paginators_share_one_collection() {
        let shared: Arc<[usize]> = Arc::from(numbers(12));
        let mut a = WindowedListPaginator::new(shared.clone(), 5);
        let b = WindowedListPaginator::new(shared.clone(), 12);
        a.set_page(3);
        assert_eq!(a.visible_elements(), &[11, 12]);
        assert_eq!(b.visible_elements().len(), 12);
        assert!(Arc::ptr_eq(a.elements(), b.elements()));
    }

    proptest! {
        #[test]
        fn page_count_covers_every_element(total in 0usize..500, per_page in 1usize..60) {
            let paginator = WindowedListPaginator::new(numbers(total), per_page);
            let pages = paginator.page_count();
            prop_assert!(pages * per_page >= total);
            if pages > 0 {
                prop_assert!((pages - 1) * per_page < total);
            } else {
                prop_assert_eq!(total, 0);
            }
        }

        #[test]
        fn requested_page_is_clamped(total in 0usize..300, per_page in 1usize..40, page in 0usize..100) {
            let mut paginator = WindowedListPaginator::new(numbers(total), per_page);
            paginator.set_page(page);
            let current = paginator.current_page();
            prop_assert!(current >= 1);
            prop_assert!(current <= paginator.page_count().max(1));
            if (1..=paginator.page_count()).contains(&page) {
                prop_assert_eq!(current, page);
            }
        }

        #[test]
        fn pages_partition_the_collection(total in 0usize..200, per_page in 1usize..30) {
            let mut paginator = WindowedListPaginator::new(numbers(total), per_page);
            let mut seen = Vec::new();
            for page in paginator.page_numbers() {
                paginator.set_page(page);
                seen.extend_from_slice(paginator.visible_elements());
            }
            prop_assert_eq!(seen, numbers(total));
        }
    }
}
