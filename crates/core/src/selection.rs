//! Drag-gesture range selection.
//!
//! The press point is the anchor for the whole gesture. Moves only update the
//! live end; up/left drags are handled by normalizing at read time, never by
//! swapping anchor and end.

use crate::address::CellAddress;
use crate::range::{Range, ReferencePair};

#[derive(Debug, Clone, Default)]
pub struct RangeSelection {
    anchor: Option<CellAddress>,
    end: Option<CellAddress>,
    selecting: bool,
}

impl RangeSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new gesture at `(row, col)`, replacing any previous selection.
    pub fn press(&mut self, row: usize, col: usize) {
        let pos = CellAddress::new(row, col);
        self.anchor = Some(pos);
        self.end = Some(pos);
        self.selecting = true;
    }

    /// Update the live end. Ignored unless a gesture is in progress.
    pub fn drag(&mut self, row: usize, col: usize) {
        if self.selecting && self.anchor.is_some() {
            self.end = Some(CellAddress::new(row, col));
        }
    }

    /// Finish the gesture and return the normalized selection.
    pub fn release(&mut self) -> Option<Range> {
        self.selecting = false;
        self.range()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_selecting(&self) -> bool {
        self.selecting
    }

    /// Raw anchor → end pair, as sampled.
    pub fn raw(&self) -> Option<Range> {
        Some(Range::new(self.anchor?, self.end?))
    }

    /// Current selection, normalized.
    pub fn range(&self) -> Option<Range> {
        self.raw().map(Range::normalize)
    }

    /// `{from, to}` references; a single cell yields `from == to`.
    pub fn result(&self) -> Option<ReferencePair> {
        self.range().map(|r| r.to_reference_pair())
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.range()
            .is_some_and(|r| r.contains(CellAddress::new(row, col)))
    }

    /// True for the top-left cell of the normalized selection.
    pub fn is_start(&self, row: usize, col: usize) -> bool {
        self.range().is_some_and(|r| r.start == CellAddress::new(row, col))
    }

    /// True for the bottom-right cell of the normalized selection.
    pub fn is_end(&self, row: usize, col: usize) -> bool {
        self.range().is_some_and(|r| r.end == CellAddress::new(row, col))
    }

    /// Replay a whole gesture: first sample presses, the rest drag, then release.
    pub fn from_samples<I>(samples: I) -> Option<Range>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut selection = Self::new();
        let mut samples = samples.into_iter();
        let (row, col) = samples.next()?;
        selection.press(row, col);
        for (row, col) in samples {
            selection.drag(row, col);
        }
        selection.release()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_stays_at_press_point() {
        let mut sel = RangeSelection::new();
        sel.press(4, 4);
        sel.drag(6, 6);
        sel.drag(1, 2);
        let raw = sel.raw().unwrap();
        assert_eq!(raw.start, CellAddress::new(4, 4));
        assert_eq!(raw.end, CellAddress::new(1, 2));

        let range = sel.release().unwrap();
        assert_eq!(range.to_string(), "C2:E5");
        assert!(!sel.is_selecting());
    }

    #[test]
    fn test_drag_without_press_is_ignored() {
        let mut sel = RangeSelection::new();
        sel.drag(3, 3);
        assert!(sel.range().is_none());
        assert!(sel.release().is_none());
    }

    #[test]
    fn test_drag_after_release_is_ignored() {
        let mut sel = RangeSelection::new();
        sel.press(0, 0);
        sel.drag(1, 1);
        sel.release();
        sel.drag(9, 9);
        assert_eq!(sel.range().unwrap().to_string(), "A1:B2");
    }

    #[test]
    fn test_single_click_result() {
        let mut sel = RangeSelection::new();
        sel.press(2, 1);
        sel.release();
        let pair = sel.result().unwrap();
        assert_eq!(pair.from, "B3");
        assert_eq!(pair.to, "B3");
    }

    #[test]
    fn test_start_end_and_contains() {
        let mut sel = RangeSelection::new();
        sel.press(3, 3);
        sel.drag(1, 1);
        assert!(sel.is_start(1, 1));
        assert!(sel.is_end(3, 3));
        assert!(sel.contains(2, 2));
        assert!(!sel.contains(0, 2));
        sel.clear();
        assert!(!sel.contains(2, 2));
    }

    #[test]
    fn test_from_samples() {
        let range = RangeSelection::from_samples([(5, 0), (4, 1), (0, 3)]).unwrap();
        assert_eq!(range.to_string(), "A1:D6");
        assert!(RangeSelection::from_samples(std::iter::empty()).is_none());
    }
}
