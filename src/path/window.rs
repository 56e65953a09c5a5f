use std::ops::RangeInclusive;

/// A contiguous, inclusive range of zone indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneWindow {
    /// First zone in the window.
    pub start: usize,
    /// Last zone in the window (inclusive).
    pub finish: usize,
}

impl ZoneWindow {
    /// Creates a window, swapping the ends if they are reversed.
    #[must_use]
    pub fn new(start: usize, finish: usize) -> Self {
        Self {
            start: start.min(finish),
            finish: start.max(finish),
        }
    }

    /// Returns whether `zone` lies inside the window.
    #[must_use]
    pub fn contains(&self, zone: usize) -> bool {
        (self.start..=self.finish).contains(&zone)
    }

    /// Smallest window covering both.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            finish: self.finish.max(other.finish),
        }
    }

    #[must_use]
    pub fn zones(&self) -> RangeInclusive<usize> {
        self.start..=self.finish
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reversed_ends_are_sorted() {
        let w = ZoneWindow::new(7, 3);
        assert_eq!((w.start, w.finish), (3, 7));
        assert_eq!(w.zones().count(), 5);
    }

    #[test]
    fn union_spans_gap() {
        let w = ZoneWindow::new(1, 2).union(ZoneWindow::new(6, 8));
        assert_eq!(w, ZoneWindow::new(1, 8));
        assert!(w.contains(4));
        assert!(!w.contains(9));
    }
}
