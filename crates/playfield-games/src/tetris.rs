//! Tetris on a 10 × 20 well.
//!
//! Pieces come from a 7-bag ([`BagRandomizer`]), so the piece sequence
//! depends only on the seed: every bag refill is one shuffle, whatever the
//! player does in between. Gravity, line clears, and locking are driven
//! by [`GameSession::tick`] and the drop inputs.
//!
//! ```text
//! start ─→ fill preview ─→ spawn ─→ fall / move / rotate ─→ lock
//!                            ↑                               │
//!                            └──── clear lines, score ───────┘
//! ```
//!
//! A spawned piece that overlaps the stack ends the game. The board is
//! left exactly as it was at that moment.

use std::collections::VecDeque;
use std::time::Duration;

use playfield_random::{BagRandomizer, Checkpoint, Fingerprint};
use serde::{Deserialize, Serialize};

use crate::lifecycle::Lifecycle;
use crate::{AchievementId, GameError, GameEvent, GameKind, GameSession, GameStats, GameStatus};

pub const WIDTH: usize = 10;
pub const HEIGHT: usize = 20;

/// Column of the piece's 4 × 4 bounding box at spawn.
const SPAWN_COL: i32 = 3;

/// Column offsets tried, in order, when a rotation collides.
const KICKS: [i32; 5] = [0, -1, 1, -2, 2];

/// Points per line clear (1..=4 lines), multiplied by the level.
const LINE_SCORES: [u64; 5] = [0, 100, 300, 500, 800];

const LINES_PER_LEVEL: u32 = 10;

// ---------------------------------------------------------------------------
// Pieces
// ---------------------------------------------------------------------------

/// The seven tetrominoes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tetromino {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl Tetromino {
    pub const ALL: [Tetromino; 7] = [
        Tetromino::I,
        Tetromino::O,
        Tetromino::T,
        Tetromino::S,
        Tetromino::Z,
        Tetromino::J,
        Tetromino::L,
    ];

    /// Cells `(row, col)` inside the 4 × 4 box for a rotation state.
    fn shape(self, rotation: u8) -> [(i32, i32); 4] {
        SHAPES[self as usize][usize::from(rotation % 4)]
    }
}

type Shape = [(i32, i32); 4];

#[rustfmt::skip]
const SHAPES: [[Shape; 4]; 7] = [
    // I
    [
        [(1, 0), (1, 1), (1, 2), (1, 3)],
        [(0, 2), (1, 2), (2, 2), (3, 2)],
        [(2, 0), (2, 1), (2, 2), (2, 3)],
        [(0, 1), (1, 1), (2, 1), (3, 1)],
    ],
    // O
    [
        [(0, 1), (0, 2), (1, 1), (1, 2)],
        [(0, 1), (0, 2), (1, 1), (1, 2)],
        [(0, 1), (0, 2), (1, 1), (1, 2)],
        [(0, 1), (0, 2), (1, 1), (1, 2)],
    ],
    // T
    [
        [(0, 1), (1, 0), (1, 1), (1, 2)],
        [(0, 1), (1, 1), (1, 2), (2, 1)],
        [(1, 0), (1, 1), (1, 2), (2, 1)],
        [(0, 1), (1, 0), (1, 1), (2, 1)],
    ],
    // S
    [
        [(0, 1), (0, 2), (1, 0), (1, 1)],
        [(0, 1), (1, 1), (1, 2), (2, 2)],
        [(1, 1), (1, 2), (2, 0), (2, 1)],
        [(0, 0), (1, 0), (1, 1), (2, 1)],
    ],
    // Z
    [
        [(0, 0), (0, 1), (1, 1), (1, 2)],
        [(0, 2), (1, 1), (1, 2), (2, 1)],
        [(1, 0), (1, 1), (2, 1), (2, 2)],
        [(0, 1), (1, 0), (1, 1), (2, 0)],
    ],
    // J
    [
        [(0, 0), (1, 0), (1, 1), (1, 2)],
        [(0, 1), (0, 2), (1, 1), (2, 1)],
        [(1, 0), (1, 1), (1, 2), (2, 2)],
        [(0, 1), (1, 1), (2, 0), (2, 1)],
    ],
    // L
    [
        [(0, 2), (1, 0), (1, 1), (1, 2)],
        [(0, 1), (1, 1), (2, 1), (2, 2)],
        [(1, 0), (1, 1), (1, 2), (2, 0)],
        [(0, 0), (0, 1), (1, 1), (2, 1)],
    ],
];

/// The falling piece. `row`/`col` locate the top-left of its 4 × 4 box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePiece {
    pub kind: Tetromino,
    pub rotation: u8,
    pub row: i32,
    pub col: i32,
}

impl ActivePiece {
    fn spawn(kind: Tetromino) -> Self {
        Self {
            kind,
            rotation: 0,
            row: 0,
            col: SPAWN_COL,
        }
    }

    /// Absolute `(row, col)` of the four cells.
    pub fn cells(&self) -> [(i32, i32); 4] {
        self.kind
            .shape(self.rotation)
            .map(|(r, c)| (self.row + r, self.col + c))
    }

    fn shifted(self, rows: i32, cols: i32) -> Self {
        Self {
            row: self.row + rows,
            col: self.col + cols,
            ..self
        }
    }

    fn rotated(self, quarter_turns: i8) -> Self {
        Self {
            rotation: (self.rotation as i8 + quarter_turns).rem_euclid(4) as u8,
            ..self
        }
    }
}

/// The well, top row first. `None` is an empty cell.
pub type Board = [[Option<Tetromino>; WIDTH]; HEIGHT];

// ---------------------------------------------------------------------------
// Config & input
// ---------------------------------------------------------------------------

/// Tetris options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TetrisConfig {
    /// Upcoming pieces shown to the player.
    pub preview_len: usize,
    /// Lines needed to win. `None` plays until the stack tops out.
    pub line_goal: Option<u32>,
    pub start_level: u32,
}

impl Default for TetrisConfig {
    fn default() -> Self {
        Self {
            preview_len: 3,
            line_goal: None,
            start_level: 1,
        }
    }
}

impl TetrisConfig {
    fn validate(&self) -> Result<(), GameError> {
        if self.start_level == 0 {
            return Err(GameError::InvalidConfig("start level must be at least 1".into()));
        }
        if self.line_goal == Some(0) {
            return Err(GameError::InvalidConfig("line goal must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TetrisInput {
    Left,
    Right,
    RotateCw,
    RotateCcw,
    SoftDrop,
    HardDrop,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A Tetris session.
#[derive(Debug, Clone)]
pub struct Tetris {
    config: TetrisConfig,
    life: Lifecycle,
    bag: BagRandomizer<Tetromino>,
    board: Board,
    active: Option<ActivePiece>,
    preview: VecDeque<Tetromino>,
    /// Every piece taken from the bag, in order.
    history: Vec<Tetromino>,
    score: u64,
    lines: u32,
    pieces: u32,
    gravity: Duration,
}

impl Tetris {
    pub fn new(config: TetrisConfig, seed: i64) -> Result<Self, GameError> {
        config.validate()?;
        Ok(Self {
            life: Lifecycle::new(GameKind::Tetris, seed),
            bag: BagRandomizer::new(Tetromino::ALL.to_vec()),
            board: [[None; WIDTH]; HEIGHT],
            active: None,
            preview: VecDeque::with_capacity(config.preview_len + 1),
            history: Vec::new(),
            score: 0,
            lines: 0,
            pieces: 0,
            gravity: Duration::ZERO,
            config,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn active(&self) -> Option<ActivePiece> {
        self.active
    }

    pub fn preview(&self) -> impl Iterator<Item = Tetromino> + '_ {
        self.preview.iter().copied()
    }

    pub fn piece_history(&self) -> &[Tetromino] {
        &self.history
    }

    pub fn lines(&self) -> u32 {
        self.lines
    }

    pub fn level(&self) -> u32 {
        self.config.start_level + self.lines / LINES_PER_LEVEL
    }

    /// Time between gravity steps at the current level.
    pub fn gravity_interval(&self) -> Duration {
        let reduction = 75 * u64::from(self.level() - 1);
        Duration::from_millis(1000u64.saturating_sub(reduction).max(100))
    }

    fn fits(&self, piece: &ActivePiece) -> bool {
        piece.cells().iter().all(|&(row, col)| {
            (0..HEIGHT as i32).contains(&row)
                && (0..WIDTH as i32).contains(&col)
                && self.board[row as usize][col as usize].is_none()
        })
    }

    fn try_place(&mut self, piece: ActivePiece) -> bool {
        if !self.fits(&piece) {
            return false;
        }
        self.active = Some(piece);
        true
    }

    fn rotate(&mut self, piece: ActivePiece, quarter_turns: i8) -> bool {
        let turned = piece.rotated(quarter_turns);
        KICKS
            .iter()
            .any(|&kick| self.try_place(turned.shifted(0, kick)))
    }

    fn draw_piece(&mut self) {
        let piece = self.bag.next(&mut self.life.rng);
        self.life.artifacts.record(&[piece as u64]);
        self.history.push(piece);
        self.preview.push_back(piece);
    }

    /// Takes the next piece from the preview and tops the preview up.
    fn spawn_next(&mut self) {
        while self.preview.len() <= self.config.preview_len {
            self.draw_piece();
        }
        let Some(kind) = self.preview.pop_front() else {
            return;
        };
        let piece = ActivePiece::spawn(kind);
        if self.fits(&piece) {
            tracing::trace!(?kind, draws = self.life.rng.draws(), "piece spawned");
            self.active = Some(piece);
        } else {
            tracing::debug!(?kind, "spawn blocked");
            self.active = None;
            self.end(GameStatus::Lost);
        }
    }

    fn lock(&mut self, piece: ActivePiece) {
        for (row, col) in piece.cells() {
            self.board[row as usize][col as usize] = Some(piece.kind);
        }
        self.active = None;
        self.pieces += 1;

        let cleared = self.clear_lines();
        if cleared > 0 {
            self.score += LINE_SCORES[cleared] * u64::from(self.level());
            self.lines += cleared as u32;
            if cleared == 4 {
                self.life.achieve(AchievementId::LineClearTetris);
            }
        }

        if self.config.line_goal.is_some_and(|goal| self.lines >= goal) {
            self.end(GameStatus::Won);
            return;
        }
        self.spawn_next();
    }

    /// Removes full rows, shifting the rest down. Returns the count.
    fn clear_lines(&mut self) -> usize {
        let mut next: Board = [[None; WIDTH]; HEIGHT];
        let mut write = HEIGHT;
        for row in self.board.iter().rev() {
            if row.iter().all(Option::is_some) {
                continue;
            }
            write -= 1;
            next[write] = *row;
        }
        self.board = next;
        write
    }

    fn end(&mut self, outcome: GameStatus) {
        if self.life.finish(outcome) {
            let stats = self.stats();
            self.life.report(stats, self.score, self.score > 0);
        }
    }

    fn fall(&mut self) {
        if let Some(piece) = self.active {
            if !self.try_place(piece.shifted(1, 0)) {
                self.lock(piece);
            }
        }
    }
}

impl GameSession for Tetris {
    type Input = TetrisInput;

    fn kind(&self) -> GameKind {
        GameKind::Tetris
    }

    fn status(&self) -> GameStatus {
        self.life.status()
    }

    fn start(&mut self) -> bool {
        if !self.life.start() {
            return false;
        }
        self.spawn_next();
        true
    }

    fn pause(&mut self) -> bool {
        self.life.pause()
    }

    fn resume(&mut self) -> bool {
        self.life.resume()
    }

    fn apply(&mut self, input: TetrisInput) -> bool {
        if !self.life.is_playing() {
            return false;
        }
        let Some(piece) = self.active else {
            return false;
        };
        match input {
            TetrisInput::Left => self.try_place(piece.shifted(0, -1)),
            TetrisInput::Right => self.try_place(piece.shifted(0, 1)),
            TetrisInput::RotateCw => self.rotate(piece, 1),
            TetrisInput::RotateCcw => self.rotate(piece, -1),
            TetrisInput::SoftDrop => {
                if self.try_place(piece.shifted(1, 0)) {
                    self.score += 1;
                } else {
                    self.lock(piece);
                }
                true
            }
            TetrisInput::HardDrop => {
                let mut landed = piece;
                let mut rows = 0u64;
                while self.fits(&landed.shifted(1, 0)) {
                    landed = landed.shifted(1, 0);
                    rows += 1;
                }
                self.score += 2 * rows;
                self.lock(landed);
                true
            }
        }
    }

    fn tick(&mut self, dt: Duration) -> bool {
        if !self.life.advance(dt) {
            return false;
        }
        self.gravity += dt;
        let mut changed = false;
        while self.life.is_playing() && self.gravity >= self.gravity_interval() {
            self.gravity -= self.gravity_interval();
            self.fall();
            changed = true;
        }
        changed
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
        GameStats::Tetris {
            score: self.score,
            lines: self.lines,
            level: self.level(),
            pieces: self.pieces,
        }
    }

    fn drain_events(&mut self) -> Vec<GameEvent> {
        self.life.drain_events()
    }
}
