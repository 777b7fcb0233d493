//! Minesweeper with a guaranteed-safe first click.
//!
//! Nothing is drawn at start. The layout is generated on the first
//! `Reveal`, with the clicked cell and its neighbours excluded, so the
//! first click always opens an area.

use std::collections::VecDeque;
use std::time::Duration;

use playfield_random::{mine_layout, Checkpoint, Coord, Fingerprint};
use serde::{Deserialize, Serialize};

use crate::lifecycle::Lifecycle;
use crate::{AchievementId, GameError, GameEvent, GameKind, GameSession, GameStats, GameStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinesweeperConfig {
    pub rows: u16,
    pub cols: u16,
    pub mines: u16,
}

impl Default for MinesweeperConfig {
    fn default() -> Self {
        Self {
            rows: 9,
            cols: 9,
            mines: 10,
        }
    }
}

impl MinesweeperConfig {
    fn validate(&self) -> Result<(), GameError> {
        let (rows, cols) = (usize::from(self.rows), usize::from(self.cols));
        if rows == 0 || cols == 0 {
            return Err(GameError::InvalidConfig(format!(
                "board must be non-empty, got {rows}x{cols}"
            )));
        }
        // The largest possible first-click zone must leave room for every mine.
        let zone = rows.min(3) * cols.min(3);
        if usize::from(self.mines) > rows * cols - zone {
            return Err(GameError::InvalidConfig(format!(
                "{} mines do not fit on a {rows}x{cols} board",
                self.mines
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinesweeperInput {
    Reveal(Coord),
    ToggleFlag(Coord),
    /// Reveal the unflagged neighbours of a satisfied number.
    Chord(Coord),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellState {
    Hidden,
    Flagged,
    Revealed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub mine: bool,
    /// Mines among the neighbours.
    pub adjacent: u8,
    pub state: CellState,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            mine: false,
            adjacent: 0,
            state: CellState::Hidden,
        }
    }
}

/// A Minesweeper session.
#[derive(Debug, Clone)]
pub struct Minesweeper {
    config: MinesweeperConfig,
    life: Lifecycle,
    cells: Vec<Cell>,
    /// Mine positions in draw order; empty until the first reveal.
    layout: Vec<Coord>,
    revealed: u32,
    detonated: Option<Coord>,
    /// Set once any flag sits on a safe cell, even if it is later removed.
    misflagged: bool,
}

impl Minesweeper {
    pub fn new(config: MinesweeperConfig, seed: i64) -> Result<Self, GameError> {
        config.validate()?;
        let size = usize::from(config.rows) * usize::from(config.cols);
        Ok(Self {
            life: Lifecycle::new(GameKind::Minesweeper, seed),
            cells: vec![Cell::default(); size],
            layout: Vec::new(),
            revealed: 0,
            detonated: None,
            misflagged: false,
            config,
        })
    }

    fn rows(&self) -> usize {
        usize::from(self.config.rows)
    }

    fn cols(&self) -> usize {
        usize::from(self.config.cols)
    }

    fn index(&self, at: Coord) -> Option<usize> {
        (at.row < self.rows() && at.col < self.cols()).then(|| at.row * self.cols() + at.col)
    }

    pub fn cell(&self, at: Coord) -> Option<Cell> {
        self.index(at).map(|i| self.cells[i])
    }

    /// Mine positions in the order they were drawn. Empty before the first
    /// reveal.
    pub fn mine_layout(&self) -> &[Coord] {
        &self.layout
    }

    pub fn flags(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| c.state == CellState::Flagged)
            .count()
    }

    pub fn detonated(&self) -> Option<Coord> {
        self.detonated
    }

    fn safe_cells(&self) -> u32 {
        (self.cells.len() - usize::from(self.config.mines)) as u32
    }

    fn lay_mines(&mut self, first_click: Coord) -> Result<(), GameError> {
        let (rows, cols) = (self.rows(), self.cols());
        let layout = mine_layout(
            rows,
            cols,
            usize::from(self.config.mines),
            first_click,
            &mut self.life.rng,
        )?;
        for mine in &layout {
            self.life.artifacts.record_coord(*mine);
            self.cells[mine.row * cols + mine.col].mine = true;
            for n in mine.neighbours(rows, cols) {
                self.cells[n.row * cols + n.col].adjacent += 1;
            }
        }
        self.layout = layout;
        // Flags placed before the layout existed are judged now.
        if self.cells.iter().any(|c| c.state == CellState::Flagged && !c.mine) {
            self.misflagged = true;
        }
        Ok(())
    }

    fn reveal(&mut self, at: Coord) -> bool {
        let Some(i) = self.index(at) else {
            return false;
        };
        if self.cells[i].state != CellState::Hidden {
            return false;
        }
        if self.layout.is_empty() && self.config.mines > 0 {
            if let Err(err) = self.lay_mines(at) {
                tracing::warn!(%at, %err, "mine layout failed");
                return false;
            }
        }
        self.open(at);
        self.check_end();
        true
    }

    /// Reveals `at`, flooding outward from cells with no adjacent mines.
    fn open(&mut self, at: Coord) {
        let (rows, cols) = (self.rows(), self.cols());
        let start = at.row * cols + at.col;
        if self.cells[start].mine {
            self.cells[start].state = CellState::Revealed;
            self.detonated = Some(at);
            return;
        }

        let mut queue = VecDeque::from([at]);
        while let Some(cell) = queue.pop_front() {
            let i = cell.row * cols + cell.col;
            if self.cells[i].state != CellState::Hidden {
                continue;
            }
            self.cells[i].state = CellState::Revealed;
            self.revealed += 1;
            if self.cells[i].adjacent == 0 {
                queue.extend(
                    cell.neighbours(rows, cols)
                        .filter(|n| self.cells[n.row * cols + n.col].state == CellState::Hidden),
                );
            }
        }
    }

    fn toggle_flag(&mut self, at: Coord) -> bool {
        let Some(i) = self.index(at) else {
            return false;
        };
        let layout_known = !self.layout.is_empty() || self.config.mines == 0;
        let cell = &mut self.cells[i];
        cell.state = match cell.state {
            CellState::Hidden => CellState::Flagged,
            CellState::Flagged => CellState::Hidden,
            CellState::Revealed => return false,
        };
        if cell.state == CellState::Flagged && layout_known && !cell.mine {
            self.misflagged = true;
        }
        true
    }

    fn chord(&mut self, at: Coord) -> bool {
        let Some(cell) = self.cell(at) else {
            return false;
        };
        if cell.state != CellState::Revealed || cell.adjacent == 0 {
            return false;
        }
        let (rows, cols) = (self.rows(), self.cols());
        let neighbours: Vec<Coord> = at.neighbours(rows, cols).collect();
        let flagged = neighbours
            .iter()
            .filter(|n| self.cells[n.row * cols + n.col].state == CellState::Flagged)
            .count();
        if flagged != usize::from(cell.adjacent) {
            return false;
        }

        let targets: Vec<Coord> = neighbours
            .into_iter()
            .filter(|n| self.cells[n.row * cols + n.col].state == CellState::Hidden)
            .collect();
        if targets.is_empty() {
            return false;
        }
        for target in targets {
            self.open(target);
            if self.detonated.is_some() {
                break;
            }
        }
        self.check_end();
        true
    }

    fn check_end(&mut self) {
        if let Some(at) = self.detonated {
            tracing::debug!(%at, "mine detonated");
            for cell in self.cells.iter_mut().filter(|c| c.mine) {
                if cell.state == CellState::Hidden {
                    cell.state = CellState::Revealed;
                }
            }
            self.end(GameStatus::Lost);
        } else if self.revealed == self.safe_cells() {
            if !self.misflagged {
                self.life.achieve(AchievementId::MinesweeperFlawless);
            }
            self.end(GameStatus::Won);
        }
    }

    fn end(&mut self, outcome: GameStatus) {
        if self.life.finish(outcome) {
            let stats = self.stats();
            let won = outcome == GameStatus::Won;
            self.life.report(stats, self.score(), won);
        }
    }
}

impl GameSession for Minesweeper {
    type Input = MinesweeperInput;

    fn kind(&self) -> GameKind {
        GameKind::Minesweeper
    }

    fn status(&self) -> GameStatus {
        self.life.status()
    }

    fn start(&mut self) -> bool {
        self.life.start()
    }

    fn pause(&mut self) -> bool {
        self.life.pause()
    }

    fn resume(&mut self) -> bool {
        self.life.resume()
    }

    fn apply(&mut self, input: MinesweeperInput) -> bool {
        if !self.life.is_playing() {
            return false;
        }
        match input {
            MinesweeperInput::Reveal(at) => self.reveal(at),
            MinesweeperInput::ToggleFlag(at) => self.toggle_flag(at),
            MinesweeperInput::Chord(at) => self.chord(at),
        }
    }

    fn tick(&mut self, dt: Duration) -> bool {
        self.life.advance(dt);
        false
    }

    /// Safe cells revealed.
    fn score(&self) -> u64 {
        u64::from(self.revealed)
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
        GameStats::Minesweeper {
            rows: self.config.rows,
            cols: self.config.cols,
            mines: self.config.mines,
            revealed: self.revealed,
            won: self.status() == GameStatus::Won,
            elapsed_ms: self.elapsed().as_millis() as u64,
        }
    }

    fn drain_events(&mut self) -> Vec<GameEvent> {
        self.life.drain_events()
    }
}
