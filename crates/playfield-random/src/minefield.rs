//! Minesweeper mine placement.
//!
//! Mines are laid out only once the player's first click is known. The
//! clicked cell and its neighbours are removed from the candidate pool
//! before shuffling, so the first click always opens a safe area and no
//! rerolling is ever needed.

use crate::{Coord, RandomError, SeededRandom};

/// Returns the first-click safe zone: the clicked cell plus its in-bounds
/// neighbours.
pub fn safe_zone(first_click: Coord, rows: usize, cols: usize) -> Vec<Coord> {
    let mut zone = vec![first_click];
    zone.extend(first_click.neighbours(rows, cols));
    zone.sort_unstable();
    zone
}

/// Places `mines` mines on a `rows` × `cols` board.
///
/// Candidates are every cell outside the safe zone, enumerated row-major.
/// They are shuffled once and the first `mines` become mines, returned in
/// that (draw) order.
///
/// # Errors
/// Returns [`RandomError::InvalidArgument`] if the board is empty, the
/// first click is off the board, or there are more mines than candidate
/// cells (which covers `mines >= rows * cols`).
pub fn mine_layout(
    rows: usize,
    cols: usize,
    mines: usize,
    first_click: Coord,
    rng: &mut SeededRandom,
) -> Result<Vec<Coord>, RandomError> {
    if rows == 0 || cols == 0 {
        return Err(RandomError::InvalidArgument(format!(
            "board must be non-empty, got {rows}x{cols}"
        )));
    }
    if first_click.row >= rows || first_click.col >= cols {
        return Err(RandomError::InvalidArgument(format!(
            "first click {first_click} is outside a {rows}x{cols} board"
        )));
    }

    let candidates: Vec<Coord> = (0..rows)
        .flat_map(|row| (0..cols).map(move |col| Coord::new(row, col)))
        .filter(|cell| !first_click.touches(*cell))
        .collect();

    if mines > candidates.len() {
        return Err(RandomError::InvalidArgument(format!(
            "{mines} mines do not fit in {} cells outside the first-click zone",
            candidates.len()
        )));
    }

    let mut layout = rng.shuffle(&candidates);
    layout.truncate(mines);
    tracing::debug!(rows, cols, mines, %first_click, draws = rng.draws(), "mines placed");
    Ok(layout)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_nine_by_nine_seed_7_click_centre() {
        let mut rng = SeededRandom::new(7);
        let click = Coord::new(4, 4);
        let mines = mine_layout(9, 9, 10, click, &mut rng).unwrap();

        assert_eq!(mines.len(), 10);
        let unique: HashSet<_> = mines.iter().copied().collect();
        assert_eq!(unique.len(), 10);
        for cell in safe_zone(click, 9, 9) {
            assert!(!unique.contains(&cell), "{cell} is in the safe zone");
        }
    }

    #[test]
    fn test_layout_consumes_one_shuffle() {
        let mut rng = SeededRandom::new(7);
        mine_layout(9, 9, 10, Coord::new(4, 4), &mut rng).unwrap();
        // 81 cells minus the 9-cell safe zone.
        assert_eq!(rng.draws(), 71);
    }

    #[test]
    fn test_corner_click_has_four_cell_safe_zone() {
        assert_eq!(safe_zone(Coord::new(0, 0), 9, 9).len(), 4);
        let mut rng = SeededRandom::new(1);
        // 81 - 4 = 77 candidates, so 77 mines is the maximum.
        assert!(mine_layout(9, 9, 77, Coord::new(0, 0), &mut rng).is_ok());
        assert!(mine_layout(9, 9, 78, Coord::new(0, 0), &mut rng).is_err());
    }

    #[test]
    fn test_mines_equal_to_cell_count_is_invalid() {
        let mut rng = SeededRandom::new(1);
        let result = mine_layout(3, 3, 9, Coord::new(1, 1), &mut rng);
        assert!(matches!(result, Err(RandomError::InvalidArgument(_))));
        assert_eq!(rng.draws(), 0, "rejected input must not draw");
    }

    #[test]
    fn test_out_of_bounds_click_is_invalid() {
        let mut rng = SeededRandom::new(1);
        assert!(mine_layout(9, 9, 10, Coord::new(9, 0), &mut rng).is_err());
        assert!(mine_layout(0, 9, 0, Coord::new(0, 0), &mut rng).is_err());
    }

    #[test]
    fn test_zero_mines_is_an_empty_layout() {
        let mut rng = SeededRandom::new(1);
        let mines = mine_layout(4, 4, 0, Coord::new(0, 0), &mut rng).unwrap();
        assert!(mines.is_empty());
    }
}
