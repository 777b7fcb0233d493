//! Grid helpers shared by the board games: directions and free-cell scans.

use playfield_random::Coord;
use serde::{Deserialize, Serialize};

/// One of the four grid directions. Row 0 is the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// The neighbouring cell in this direction, or `None` past the edge of
    /// a `rows` × `cols` grid.
    pub fn step(self, from: Coord, rows: usize, cols: usize) -> Option<Coord> {
        let (row, col) = match self {
            Self::Up => (from.row.checked_sub(1)?, from.col),
            Self::Down => (from.row + 1, from.col),
            Self::Left => (from.row, from.col.checked_sub(1)?),
            Self::Right => (from.row, from.col + 1),
        };
        (row < rows && col < cols).then_some(Coord::new(row, col))
    }
}

/// Row-major list of the cells for which `is_empty` holds.
pub(crate) fn empty_cells(
    rows: usize,
    cols: usize,
    is_empty: impl Fn(Coord) -> bool,
) -> Vec<Coord> {
    (0..rows)
        .flat_map(|row| (0..cols).map(move |col| Coord::new(row, col)))
        .filter(|cell| is_empty(*cell))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_stops_at_edges() {
        let corner = Coord::new(0, 0);
        assert_eq!(Direction::Up.step(corner, 3, 3), None);
        assert_eq!(Direction::Left.step(corner, 3, 3), None);
        assert_eq!(Direction::Down.step(corner, 3, 3), Some(Coord::new(1, 0)));

        let far = Coord::new(2, 2);
        assert_eq!(Direction::Right.step(far, 3, 3), None);
        assert_eq!(Direction::Down.step(far, 3, 3), None);
    }

    #[test]
    fn test_empty_cells_are_row_major() {
        let cells = empty_cells(2, 2, |c| c != Coord::new(0, 1));
        assert_eq!(
            cells,
            vec![Coord::new(0, 0), Coord::new(1, 0), Coord::new(1, 1)]
        );
    }
}
