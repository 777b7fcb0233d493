//! Grid coordinates shared by every board-based consumer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A cell on a rectangular board, `row` first.
///
/// Ordering is row-major, which is also the order candidate cells are
/// enumerated in before any shuffle or pick. Changing that order would
/// change every generated layout, so it is part of the determinism
/// contract.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Returns `true` if `other` is this cell or one of its 8 neighbours.
    pub fn touches(&self, other: Coord) -> bool {
        self.row.abs_diff(other.row) <= 1 && self.col.abs_diff(other.col) <= 1
    }

    /// The in-bounds neighbours of this cell (up to 8), row-major.
    pub fn neighbours(&self, rows: usize, cols: usize) -> impl Iterator<Item = Coord> + use<> {
        let Coord { row, col } = *self;
        let row_lo = row.saturating_sub(1);
        let row_hi = (row + 1).min(rows.saturating_sub(1));
        let col_lo = col.saturating_sub(1);
        let col_hi = (col + 1).min(cols.saturating_sub(1));
        (row_lo..=row_hi)
            .flat_map(move |r| (col_lo..=col_hi).map(move |c| Coord::new(r, c)))
            .filter(move |c| !(c.row == row && c.col == col))
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}
