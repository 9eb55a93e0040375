//! Page-number strip shown under the paginated tables.

use super::model::PageResponse;

/// Numbered pages shown around the current one.
const MAX_VISIBLE_PAGES: u32 = 5;

/// One slot in the page-number strip. Page numbers are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page { number: u32, current: bool },
    Ellipsis,
}

/// Build the page-number strip for a 1-based `current` page.
///
/// A `current` page outside `1..=total_pages` is clamped into range.
///
/// Shows up to five pages centered on the current one, shifted left near
/// the end. The first and last pages are always reachable, with an
/// ellipsis when they are not adjacent to the window. Empty for a single
/// page.
pub fn page_window(current: u32, total_pages: u32) -> Vec<PageItem> {
    if total_pages <= 1 {
        return Vec::new();
    }

    let current = current.clamp(1, total_pages);
    let mut start = current.saturating_sub(MAX_VISIBLE_PAGES / 2).max(1);
    let end = (start + MAX_VISIBLE_PAGES - 1).min(total_pages);
    if end - start < MAX_VISIBLE_PAGES - 1 {
        start = end.saturating_sub(MAX_VISIBLE_PAGES - 1).max(1);
    }

    let mut items = Vec::with_capacity(MAX_VISIBLE_PAGES as usize + 4);
    if start > 1 {
        items.push(PageItem::Page {
            number: 1,
            current: current == 1,
        });
        if start > 2 {
            items.push(PageItem::Ellipsis);
        }
    }
    items.extend((start..=end).map(|number| PageItem::Page {
        number,
        current: number == current,
    }));
    if end < total_pages {
        if end < total_pages - 1 {
            items.push(PageItem::Ellipsis);
        }
        items.push(PageItem::Page {
            number: total_pages,
            current: current == total_pages,
        });
    }
    items
}

/// 1-based first and last record shown by a page; `(0, 0)` when empty.
pub fn record_range<T>(page: &PageResponse<T>) -> (u64, u64) {
    if page.total_elements == 0 {
        return (0, 0);
    }
    let size = u64::from(page.size);
    let first = (u64::from(page.page) * size + 1).min(page.total_elements);
    let last = ((u64::from(page.page) + 1) * size).clamp(first, page.total_elements);
    (first, last)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(items: &[PageItem]) -> String {
        items
            .iter()
            .map(|item| match item {
                PageItem::Page { number, current: true } => format!("[{}]", number),
                PageItem::Page { number, .. } => number.to_string(),
                PageItem::Ellipsis => "...".to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_single_page_has_no_window() {
        assert!(page_window(1, 0).is_empty());
        assert!(page_window(1, 1).is_empty());
    }

    #[test]
    fn test_few_pages_show_all() {
        assert_eq!(numbers(&page_window(2, 3)), "1 [2] 3");
    }

    #[test]
    fn test_window_at_start() {
        assert_eq!(numbers(&page_window(1, 10)), "[1] 2 3 4 5 ... 10");
    }

    #[test]
    fn test_window_in_middle() {
        assert_eq!(numbers(&page_window(6, 20)), "1 ... 4 5 [6] 7 8 ... 20");
    }

    #[test]
    fn test_window_near_end_shifts_left() {
        assert_eq!(numbers(&page_window(10, 10)), "1 ... 6 7 8 9 [10]");
        assert_eq!(numbers(&page_window(9, 10)), "1 ... 6 7 8 [9] 10");
    }

    #[test]
    fn test_no_ellipsis_when_adjacent() {
        assert_eq!(numbers(&page_window(4, 7)), "1 2 3 [4] 5 6 7");
    }

    #[test]
    fn test_current_past_last_page_is_clamped() {
        assert_eq!(numbers(&page_window(10, 3)), "1 2 [3]");
        assert_eq!(numbers(&page_window(0, 3)), "[1] 2 3");
    }

    #[test]
    fn test_record_range_past_end() {
        let page: PageResponse<u8> = PageResponse::new(Vec::new(), 9, 10, 25);
        assert_eq!(record_range(&page), (25, 25));
    }

    #[test]
    fn test_record_range() {
        let page: PageResponse<u8> = PageResponse::new(vec![0; 10], 1, 10, 25);
        assert_eq!(record_range(&page), (11, 20));

        let last: PageResponse<u8> = PageResponse::new(vec![0; 5], 2, 10, 25);
        assert_eq!(record_range(&last), (21, 25));

        let empty: PageResponse<u8> = PageResponse::new(Vec::new(), 0, 10, 0);
        assert_eq!(record_range(&empty), (0, 0));
    }
}
