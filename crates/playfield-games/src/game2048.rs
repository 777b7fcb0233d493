//! 2048: slide, merge, spawn.
//!
//! A slide that leaves the board unchanged is not a move: nothing is
//! spawned, nothing is drawn, and no undo snapshot is taken. Undo restores
//! the board and score but never rewinds the generator, so the tile that
//! spawns after an undone move is generally a different one.

use std::time::Duration;

use playfield_random::{spawn_tile, Checkpoint, Coord, Fingerprint, TileSpawn};
use serde::{Deserialize, Serialize};

use crate::grid::empty_cells;
use crate::lifecycle::Lifecycle;
use crate::{
    AchievementId, Direction, GameError, GameEvent, GameKind, GameSession, GameStats, GameStatus,
    UndoRing,
};

/// How many moves can be taken back.
pub const UNDO_DEPTH: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Game2048Config {
    /// Board edge length.
    pub size: usize,
    /// Tile value that wins the game.
    pub target: u32,
    /// Keep going after the target tile appears.
    pub keep_playing: bool,
}

impl Default for Game2048Config {
    fn default() -> Self {
        Self {
            size: 4,
            target: 2048,
            keep_playing: false,
        }
    }
}

impl Game2048Config {
    fn validate(&self) -> Result<(), GameError> {
        if self.size < 2 {
            return Err(GameError::InvalidConfig(format!(
                "board size must be at least 2, got {}",
                self.size
            )));
        }
        if self.target < 4 || !self.target.is_power_of_two() {
            return Err(GameError::InvalidConfig(format!(
                "target must be a power of two >= 4, got {}",
                self.target
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Game2048Input {
    Slide(Direction),
    Undo,
}

/// Board and score before a move.
#[derive(Debug, Clone)]
struct Snapshot {
    cells: Box<[u32]>,
    score: u64,
}

/// A 2048 session.
#[derive(Debug, Clone)]
pub struct Game2048 {
    config: Game2048Config,
    life: Lifecycle,
    /// Row-major; 0 is an empty cell.
    cells: Vec<u32>,
    score: u64,
    moves: u32,
    undos: u32,
    target_reached: bool,
    reached_2048: bool,
    undo: UndoRing<Snapshot, UNDO_DEPTH>,
    spawns: Vec<TileSpawn>,
}

impl Game2048 {
    pub fn new(config: Game2048Config, seed: i64) -> Result<Self, GameError> {
        config.validate()?;
        Ok(Self {
            life: Lifecycle::new(GameKind::Game2048, seed),
            cells: vec![0; config.size * config.size],
            score: 0,
            moves: 0,
            undos: 0,
            target_reached: false,
            reached_2048: false,
            undo: UndoRing::new(),
            spawns: Vec::new(),
            config,
        })
    }

    pub fn size(&self) -> usize {
        self.config.size
    }

    pub fn tile(&self, at: Coord) -> u32 {
        self.cells[at.row * self.config.size + at.col]
    }

    /// Rows of the board, top first.
    pub fn rows(&self) -> impl Iterator<Item = &[u32]> {
        self.cells.chunks(self.config.size)
    }

    pub fn max_tile(&self) -> u32 {
        self.cells.iter().copied().max().unwrap_or(0)
    }

    /// Every tile spawned so far, in order.
    pub fn spawn_history(&self) -> &[TileSpawn] {
        &self.spawns
    }

    pub fn undo_available(&self) -> usize {
        self.undo.len()
    }

    fn spawn(&mut self) {
        let n = self.config.size;
        let empty = empty_cells(n, n, |c| self.cells[c.row * n + c.col] == 0);
        if let Some(spawned) = spawn_tile(&empty, &mut self.life.rng) {
            self.cells[spawned.at.row * n + spawned.at.col] = spawned.value;
            let (row, col) = (spawned.at.row as u64, spawned.at.col as u64);
            self.life.artifacts.record(&[row, col, u64::from(spawned.value)]);
            tracing::trace!(at = %spawned.at, value = spawned.value, "tile spawned");
            self.spawns.push(spawned);
        }
    }

    /// Index of the `k`-th cell of `line`, counting from the edge tiles
    /// slide towards.
    fn line_index(&self, direction: Direction, line: usize, k: usize) -> usize {
        let n = self.config.size;
        match direction {
            Direction::Left => line * n + k,
            Direction::Right => line * n + (n - 1 - k),
            Direction::Up => k * n + line,
            Direction::Down => (n - 1 - k) * n + line,
        }
    }

    fn slide(&mut self, direction: Direction) -> bool {
        let n = self.config.size;
        let mut next = self.cells.clone();
        let mut gained = 0u64;
        for line in 0..n {
            let indices: Vec<usize> = (0..n).map(|k| self.line_index(direction, line, k)).collect();
            let tiles: Vec<u32> = indices
                .iter()
                .map(|&i| self.cells[i])
                .filter(|&v| v != 0)
                .collect();
            let (merged, points) = merge_line(&tiles);
            gained += points;
            for (k, &i) in indices.iter().enumerate() {
                next[i] = merged.get(k).copied().unwrap_or(0);
            }
        }
        if next == self.cells {
            return false;
        }

        let previous = std::mem::replace(&mut self.cells, next);
        self.undo.push(Snapshot {
            cells: previous.into_boxed_slice(),
            score: self.score,
        });
        self.score += gained;
        self.moves += 1;
        self.spawn();
        self.after_move();
        true
    }

    fn after_move(&mut self) {
        let max = self.max_tile();
        if !self.reached_2048 && max >= 2048 {
            self.reached_2048 = true;
            self.life.achieve(AchievementId::Tile2048);
        }
        if !self.target_reached && max >= self.config.target {
            self.target_reached = true;
            if !self.config.keep_playing {
                self.end(GameStatus::Won);
                return;
            }
        }
        if !self.has_moves() {
            self.end(GameStatus::Lost);
        }
    }

    fn has_moves(&self) -> bool {
        let n = self.config.size;
        if self.cells.contains(&0) {
            return true;
        }
        (0..n).any(|row| {
            (0..n).any(|col| {
                let v = self.cells[row * n + col];
                (col + 1 < n && self.cells[row * n + col + 1] == v)
                    || (row + 1 < n && self.cells[(row + 1) * n + col] == v)
            })
        })
    }

    fn take_back(&mut self) -> bool {
        let Some(snapshot) = self.undo.pop() else {
            return false;
        };
        self.cells = snapshot.cells.into_vec();
        self.score = snapshot.score;
        self.undos += 1;
        tracing::debug!(undos = self.undos, remaining = self.undo.len(), "move undone");
        true
    }

    fn end(&mut self, outcome: GameStatus) {
        if self.life.finish(outcome) {
            let stats = self.stats();
            self.life.report(stats, self.score, self.score > 0);
        }
    }
}

/// Compacts one line towards index 0, merging each pair of equal
/// neighbours once. Returns the new line and the points earned.
fn merge_line(tiles: &[u32]) -> (Vec<u32>, u64) {
    let mut out = Vec::with_capacity(tiles.len());
    let mut points = 0u64;
    let mut i = 0;
    while i < tiles.len() {
        if i + 1 < tiles.len() && tiles[i] == tiles[i + 1] {
            let merged = tiles[i] * 2;
            out.push(merged);
            points += u64::from(merged);
            i += 2;
        } else {
            out.push(tiles[i]);
            i += 1;
        }
    }
    (out, points)
}

impl GameSession for Game2048 {
    type Input = Game2048Input;

    fn kind(&self) -> GameKind {
        GameKind::Game2048
    }

    fn status(&self) -> GameStatus {
        self.life.status()
    }

    fn start(&mut self) -> bool {
        if !self.life.start() {
            return false;
        }
        self.spawn();
        self.spawn();
        true
    }

    fn pause(&mut self) -> bool {
        self.life.pause()
    }

    fn resume(&mut self) -> bool {
        self.life.resume()
    }

    fn apply(&mut self, input: Game2048Input) -> bool {
        if !self.life.is_playing() {
            return false;
        }
        match input {
            Game2048Input::Slide(direction) => self.slide(direction),
            Game2048Input::Undo => self.take_back(),
        }
    }

    fn tick(&mut self, dt: Duration) -> bool {
        self.life.advance(dt);
        false
    }

    fn score(&self) -> u64 {
        self.score
    }

    fn elapsed(&self) -> Duration {
        self.life.elapsed()
    }

    fn rng_checkpoint(&self) -> Checkpoint {
        self.life.rng.checkpoint()
    }

    fn fingerprint(&self) -> Fingerprint {
        self.life.artifacts
    }

    fn stats(&self) -> GameStats {
        GameStats::Game2048 {
            score: self.score,
            max_tile: self.max_tile(),
            moves: self.moves,
            undos: self.undos,
        }
    }

    fn drain_events(&mut self) -> Vec<GameEvent> {
        self.life.drain_events()
    }
}
