//! Spawn generators: new 2048 tiles and Snake food.
//!
//! Both pick from the cells that are empty *right now*. The caller builds
//! the candidate list in row-major order from its board, so the draw
//! depends only on the game state reached so far.

use serde::{Deserialize, Serialize};

use crate::{Coord, SeededRandom};

/// Chance that a spawned 2048 tile is a 4 rather than a 2.
pub const FOUR_PROBABILITY: f64 = 0.1;

/// A tile placed on a 2048 board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSpawn {
    pub at: Coord,
    pub value: u32,
}

/// Spawns a 2048 tile: position first (one draw), then value (one draw).
///
/// Returns `None` without drawing if there is no empty cell.
pub fn spawn_tile(empty: &[Coord], rng: &mut SeededRandom) -> Option<TileSpawn> {
    let at = *rng.pick(empty).ok()?;
    let value = if rng.next() < 1.0 - FOUR_PROBABILITY { 2 } else { 4 };
    Some(TileSpawn { at, value })
}

/// Picks a food cell for Snake (one draw).
///
/// Returns `None` without drawing if there is no empty cell.
pub fn spawn_food(empty: &[Coord], rng: &mut SeededRandom) -> Option<Coord> {
    rng.pick(empty).ok().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(n: usize) -> Vec<Coord> {
        (0..n).map(|c| Coord::new(0, c)).collect()
    }

    #[test]
    fn test_spawn_tile_draws_twice() {
        let mut rng = SeededRandom::new(10);
        let spawn = spawn_tile(&row(16), &mut rng).unwrap();
        assert!(spawn.value == 2 || spawn.value == 4);
        assert!(spawn.at.col < 16);
        assert_eq!(rng.draws(), 2);
    }

    #[test]
    fn test_spawn_on_full_board_draws_nothing() {
        let mut rng = SeededRandom::new(10);
        assert_eq!(spawn_tile(&[], &mut rng), None);
        assert_eq!(spawn_food(&[], &mut rng), None);
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn test_spawn_food_only_picks_candidates() {
        let mut rng = SeededRandom::new(99);
        let empty = vec![Coord::new(3, 3), Coord::new(7, 1)];
        for _ in 0..50 {
            let food = spawn_food(&empty, &mut rng).unwrap();
            assert!(empty.contains(&food));
        }
    }

    #[test]
    fn test_tile_values_are_mostly_twos() {
        let mut rng = SeededRandom::new(2048);
        let cells = row(4);
        let fours = (0..1000)
            .filter_map(|_| spawn_tile(&cells, &mut rng))
            .filter(|t| t.value == 4)
            .count();
        assert!(fours > 40 && fours < 160, "got {fours} fours in 1000 spawns");
    }
}
