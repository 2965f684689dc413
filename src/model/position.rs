//! Positions and ranges in a model tree.
//!
//! A position is a path of offsets from a root element down to a point
//! between (or inside) nodes. Inside an element, a child element occupies
//! one offset unit and a text node occupies one unit per `char`. Positions
//! compare in tree order, which for offset paths is plain lexicographic
//! order (a parent boundary sorts before any point inside it).

use smallvec::SmallVec;

/// Offset path type used by positions.
pub type OffsetPath = SmallVec<[usize; 8]>;

/// A point in a model tree, addressed by ancestor offsets.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub path: OffsetPath,
}

impl Position {
    /// Create a position from an offset path.
    pub fn at(path: impl IntoIterator<Item = usize>) -> Self {
        Self {
            path: path.into_iter().collect(),
        }
    }

    /// The offset in the immediate parent (last path component).
    pub fn offset(&self) -> usize {
        self.path.last().copied().unwrap_or(0)
    }

    /// Position of the parent boundary (path with the last component
    /// dropped). The root position maps to itself.
    pub fn parent(&self) -> Position {
        let mut path = self.path.clone();
        path.pop();
        Position { path }
    }

    /// This position moved forward by `n` offset units in its parent.
    pub fn advanced(&self, n: usize) -> Position {
        let mut path = self.path.clone();
        if let Some(last) = path.last_mut() {
            *last += n;
        }
        Position { path }
    }

    /// Position at offset `n` inside the node this position points at.
    pub fn descended(&self, n: usize) -> Position {
        let mut path = self.path.clone();
        path.push(n);
        Position { path }
    }
}

/// Ordered pair of positions with `start <= end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Create a range; callers must uphold `start <= end`.
    pub fn new(start: Position, end: Position) -> Self {
        debug_assert!(start <= end, "range start must not follow its end");
        Self { start, end }
    }

    /// Collapsed range at the given position.
    pub fn collapsed_at(pos: Position) -> Self {
        Self {
            start: pos.clone(),
            end: pos,
        }
    }

    /// A range is collapsed when its boundaries coincide.
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Check whether a position lies inside this range (start inclusive,
    /// end exclusive).
    pub fn contains(&self, pos: &Position) -> bool {
        &self.start <= pos && pos < &self.end
    }

    /// Smallest range spanning both `self` and `other`.
    pub fn joined(&self, other: &Range) -> Range {
        Range {
            start: self.start.clone().min(other.start.clone()),
            end: self.end.clone().max(other.end.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_order() {
        let a = Position::at([0]);
        let b = Position::at([0, 1]);
        let c = Position::at([1]);
        assert!(a < b, "parent boundary precedes inner point");
        assert!(b < c);
        assert!(a < c);
    }

    #[test]
    fn test_advance_and_descend() {
        let p = Position::at([2, 3]);
        assert_eq!(p.advanced(2), Position::at([2, 5]));
        assert_eq!(p.descended(0), Position::at([2, 3, 0]));
        assert_eq!(p.parent(), Position::at([2]));
        assert_eq!(p.offset(), 3);
    }

    #[test]
    fn test_range_contains() {
        let r = Range::new(Position::at([0, 2]), Position::at([0, 5]));
        assert!(r.contains(&Position::at([0, 2])));
        assert!(r.contains(&Position::at([0, 4])));
        assert!(r.contains(&Position::at([0, 3, 1])));
        assert!(!r.contains(&Position::at([0, 5])));
        assert!(!r.contains(&Position::at([0, 1])));
    }

    #[test]
    fn test_range_join() {
        let a = Range::new(Position::at([0, 0]), Position::at([0, 3]));
        let b = Range::new(Position::at([0, 2]), Position::at([1]));
        let j = a.joined(&b);
        assert_eq!(j.start, Position::at([0, 0]));
        assert_eq!(j.end, Position::at([1]));
    }

    #[test]
    fn test_collapsed() {
        let r = Range::collapsed_at(Position::at([1, 1]));
        assert!(r.is_collapsed());
    }
}
