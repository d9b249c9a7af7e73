//! Selected-page store for paginated documents.
//!
//! The store is the single source of truth for which pages go to the OCR
//! service. The thumbnail grid and the summary view both read from it, and
//! the request builder serializes it into the `pages` query parameter.

use std::collections::BTreeSet;

use thiserror::Error;

/// Errors from parsing a page list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("'{0}' is not a page number")]
    NotANumber(String),

    #[error("page numbers start at 1")]
    ZeroPage,

    #[error("range {0}-{1} runs backwards")]
    ReversedRange(u32, u32),
}

/// One fragment of a page list: a single page or an inclusive range.
///
/// An open range (`"4-"`) runs to the end of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub first: u32,
    pub last: u32,
}

impl PageRange {
    pub fn single(page: u32) -> Self {
        Self {
            first: page,
            last: page,
        }
    }

    fn parse(part: &str) -> Result<Self, SelectionError> {
        let number = |s: &str| -> Result<u32, SelectionError> {
            let page: u32 = s
                .trim()
                .parse()
                .map_err(|_| SelectionError::NotANumber(part.to_string()))?;
            if page == 0 {
                return Err(SelectionError::ZeroPage);
            }
            Ok(page)
        };

        let Some((first, last)) = part.split_once('-') else {
            return Ok(Self::single(number(part)?));
        };
        let first = number(first)?;
        let last = if last.trim().is_empty() {
            u32::MAX
        } else {
            number(last)?
        };
        if first > last {
            return Err(SelectionError::ReversedRange(first, last));
        }
        Ok(Self { first, last })
    }
}

impl From<u32> for PageRange {
    fn from(page: u32) -> Self {
        Self::single(page)
    }
}

/// Set of selected page numbers plus the document's page count.
///
/// Every member is in `[1, total_pages]`. Out-of-range `add`/`remove` calls
/// are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionStore {
    selected: BTreeSet<u32>,
    total_pages: u32,
}

impl SelectionStore {
    /// Create an empty store for a document with `total_pages` pages.
    pub fn new(total_pages: u32) -> Self {
        Self {
            selected: BTreeSet::new(),
            total_pages,
        }
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Record the page count reported by the renderer.
    ///
    /// Members beyond the new count are dropped.
    pub fn set_total_pages(&mut self, total_pages: u32) {
        self.total_pages = total_pages;
        self.selected.retain(|&p| p <= total_pages);
    }

    fn in_range(&self, page: u32) -> bool {
        page >= 1 && page <= self.total_pages
    }

    pub fn add(&mut self, page: u32) {
        if self.in_range(page) {
            self.selected.insert(page);
        }
    }

    pub fn remove(&mut self, page: u32) {
        if self.in_range(page) {
            self.selected.remove(&page);
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Select every page. No-op for an empty document.
    pub fn select_all(&mut self) {
        self.selected = (1..=self.total_pages).collect();
    }

    /// Select `first..=last`, clamped to the document.
    pub fn select_range(&mut self, first: u32, last: u32) {
        let first = first.max(1);
        let last = last.min(self.total_pages);
        if first > last {
            return;
        }
        self.selected.extend(first..=last);
    }

    pub fn contains(&self, page: u32) -> bool {
        self.selected.contains(&page)
    }

    pub fn size(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Selected pages in ascending order.
    pub fn sorted_pages(&self) -> Vec<u32> {
        self.selected.iter().copied().collect()
    }

    /// Wire form: ascending pages joined by `,`, or empty when nothing is
    /// selected.
    pub fn serialize(&self) -> String {
        self.join(",")
    }

    /// Human form shown in the main view after confirming a selection.
    pub fn display_summary(&self) -> String {
        self.join(", ")
    }

    fn join(&self, sep: &str) -> String {
        self.selected
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(sep)
    }

    /// Select every page covered by `ranges`, clamped to the document.
    pub fn select_ranges(&mut self, ranges: &[PageRange]) {
        for range in ranges {
            self.select_range(range.first, range.last);
        }
    }

    /// Parse a comma-separated page list such as `"1-3,5,8-"`.
    ///
    /// Whitespace and empty fragments are ignored, so `"1, 3,,5"` parses.
    pub fn parse(csv: &str) -> Result<Vec<PageRange>, SelectionError> {
        csv.split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PageRange::parse)
            .collect()
    }

    /// Build a store for `total_pages` with the pages from `csv` selected.
    pub fn from_csv(csv: &str, total_pages: u32) -> Result<Self, SelectionError> {
        let mut store = Self::new(total_pages);
        store.select_ranges(&Self::parse(csv)?);
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_pages_ascending_and_unique() {
        let mut store = SelectionStore::new(10);
        for page in [7, 3, 9, 3, 1, 7, 10, 2] {
            store.add(page);
        }
        store.remove(9);
        store.remove(9);
        store.add(9);
        assert_eq!(store.sorted_pages(), vec![1, 2, 3, 7, 9, 10]);

        let pages = store.sorted_pages();
        assert!(pages.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn out_of_range_is_ignored() {
        let mut store = SelectionStore::new(3);
        store.add(0);
        store.add(4);
        store.add(2);
        store.remove(5);
        assert_eq!(store.sorted_pages(), vec![2]);
    }

    #[test]
    fn unloaded_document_never_selects() {
        let mut store = SelectionStore::default();
        store.add(1);
        store.select_all();
        store.select_range(1, 5);
        assert!(store.is_empty());
    }

    #[test]
    fn serialize_empty_is_empty_string() {
        assert_eq!(SelectionStore::new(5).serialize(), "");
    }

    #[test]
    fn serialize_sorts() {
        let mut store = SelectionStore::new(5);
        store.add(3);
        store.add(1);
        store.add(2);
        assert_eq!(store.serialize(), "1,2,3");
        assert_eq!(store.display_summary(), "1, 2, 3");
    }

    #[test]
    fn serialize_round_trips() {
        let mut store = SelectionStore::new(40);
        for page in [40, 1, 17, 5, 23] {
            store.add(page);
        }
        let parsed = SelectionStore::from_csv(&store.serialize(), 40).unwrap();
        assert_eq!(parsed, store);

        let empty = SelectionStore::new(40);
        assert_eq!(SelectionStore::from_csv(&empty.serialize(), 40).unwrap(), empty);
    }

    #[test]
    fn select_all_then_clear_is_empty() {
        for total in [0, 1, 12] {
            let mut store = SelectionStore::new(total);
            store.select_all();
            assert_eq!(store.size(), total as usize);
            store.clear();
            assert!(store.is_empty());
        }
    }

    #[test]
    fn select_range_clamps() {
        let mut store = SelectionStore::new(6);
        store.select_range(0, 3);
        store.select_range(5, 99);
        assert_eq!(store.sorted_pages(), vec![1, 2, 3, 5, 6]);

        store.clear();
        store.select_range(4, 2);
        assert!(store.is_empty());
    }

    #[test]
    fn set_total_pages_drops_out_of_range() {
        let mut store = SelectionStore::new(10);
        store.select_all();
        store.set_total_pages(4);
        assert_eq!(store.sorted_pages(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(
            SelectionStore::parse("1,x"),
            Err(SelectionError::NotANumber("x".to_string()))
        );
        assert_eq!(SelectionStore::parse("0"), Err(SelectionError::ZeroPage));
        assert_eq!(
            SelectionStore::parse(" 1, 3,,5 ").unwrap(),
            vec![PageRange::single(1), PageRange::single(3), PageRange::single(5)]
        );
        assert!(SelectionStore::parse("").unwrap().is_empty());
        assert_eq!(
            SelectionStore::parse("1-x"),
            Err(SelectionError::NotANumber("1-x".to_string()))
        );
        assert_eq!(SelectionStore::parse("0-2"), Err(SelectionError::ZeroPage));
        assert_eq!(
            SelectionStore::parse("5-3"),
            Err(SelectionError::ReversedRange(5, 3))
        );
    }

    #[test]
    fn parse_accepts_ranges() {
        assert_eq!(
            SelectionStore::parse("1-3,5").unwrap(),
            vec![PageRange { first: 1, last: 3 }, PageRange::single(5)]
        );

        let store = SelectionStore::from_csv("1-3,5, 8 - 9", 10).unwrap();
        assert_eq!(store.sorted_pages(), vec![1, 2, 3, 5, 8, 9]);

        let store = SelectionStore::from_csv("2,7-", 9).unwrap();
        assert_eq!(store.sorted_pages(), vec![2, 7, 8, 9]);

        let store = SelectionStore::from_csv("4-20", 6).unwrap();
        assert_eq!(store.serialize(), "4,5,6");
    }
}
