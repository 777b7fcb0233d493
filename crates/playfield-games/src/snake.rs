//! Snake on a walled grid.
//!
//! The snake advances one cell per step interval. A turn is queued and
//! applied on the next step; turning straight back into the body is
//! refused at input time. Food is placed with one draw from the cells that
//! are empty at that moment.

use std::collections::VecDeque;
use std::time::Duration;

use playfield_random::{spawn_food, Checkpoint, Coord, Fingerprint};
use serde::{Deserialize, Serialize};

use crate::grid::empty_cells;
use crate::lifecycle::Lifecycle;
use crate::{
    AchievementId, Direction, GameError, GameEvent, GameKind, GameSession, GameStats, GameStatus,
};

/// Points per food eaten.
pub const FOOD_POINTS: u64 = 10;

/// Length that earns the long-snake achievement.
const ACHIEVEMENT_LENGTH: usize = 25;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnakeConfig {
    pub rows: usize,
    pub cols: usize,
    pub initial_length: usize,
    pub step_interval_ms: u64,
}

impl Default for SnakeConfig {
    fn default() -> Self {
        Self {
            rows: 20,
            cols: 20,
            initial_length: 3,
            step_interval_ms: 150,
        }
    }
}

impl SnakeConfig {
    pub fn step_interval(&self) -> Duration {
        Duration::from_millis(self.step_interval_ms)
    }

    fn validate(&self) -> Result<(), GameError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(GameError::InvalidConfig(format!(
                "board must be non-empty, got {}x{}",
                self.rows, self.cols
            )));
        }
        if self.initial_length == 0 {
            return Err(GameError::InvalidConfig("snake needs at least one segment".into()));
        }
        // The body starts at the centre and extends left.
        if self.initial_length > self.cols / 2 + 1 {
            return Err(GameError::InvalidConfig(format!(
                "a {}-cell snake does not fit left of centre on {} columns",
                self.initial_length, self.cols
            )));
        }
        if self.step_interval_ms == 0 {
            return Err(GameError::InvalidConfig("step interval must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnakeInput {
    Turn(Direction),
}

/// A Snake session.
#[derive(Debug, Clone)]
pub struct Snake {
    config: SnakeConfig,
    life: Lifecycle,
    /// Head first.
    body: VecDeque<Coord>,
    heading: Direction,
    queued: Option<Direction>,
    food: Option<Coord>,
    food_history: Vec<Coord>,
    score: u64,
    since_step: Duration,
}

impl Snake {
    pub fn new(config: SnakeConfig, seed: i64) -> Result<Self, GameError> {
        config.validate()?;
        Ok(Self {
            life: Lifecycle::new(GameKind::Snake, seed),
            body: VecDeque::new(),
            heading: Direction::Right,
            queued: None,
            food: None,
            food_history: Vec::new(),
            score: 0,
            since_step: Duration::ZERO,
            config,
        })
    }

    pub fn body(&self) -> impl Iterator<Item = Coord> + '_ {
        self.body.iter().copied()
    }

    pub fn head(&self) -> Option<Coord> {
        self.body.front().copied()
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn heading(&self) -> Direction {
        self.heading
    }

    pub fn food(&self) -> Option<Coord> {
        self.food
    }

    /// Every food cell placed so far, in order.
    pub fn food_history(&self) -> &[Coord] {
        &self.food_history
    }

    fn place_food(&mut self) -> bool {
        let body = &self.body;
        let empty = empty_cells(self.config.rows, self.config.cols, |c| !body.contains(&c));
        self.food = spawn_food(&empty, &mut self.life.rng);
        if let Some(food) = self.food {
            self.life.artifacts.record_coord(food);
            self.food_history.push(food);
        }
        self.food.is_some()
    }

    /// Advances one cell.
    fn step(&mut self) {
        if let Some(turn) = self.queued.take() {
            self.heading = turn;
        }
        let Some(head) = self.head() else {
            return;
        };
        let Some(next) = self.heading.step(head, self.config.rows, self.config.cols) else {
            tracing::debug!(%head, heading = ?self.heading, "hit wall");
            self.end(GameStatus::Lost);
            return;
        };

        let eating = self.food == Some(next);
        // The tail moves out of the way unless the snake is growing.
        let solid = if eating { self.body.len() } else { self.body.len() - 1 };
        if self.body.iter().take(solid).any(|&segment| segment == next) {
            tracing::debug!(%next, "hit body");
            self.end(GameStatus::Lost);
            return;
        }

        self.body.push_front(next);
        if !eating {
            self.body.pop_back();
            return;
        }

        self.score += FOOD_POINTS;
        if self.body.len() == ACHIEVEMENT_LENGTH {
            self.life.achieve(AchievementId::SnakeLength25);
        }
        if !self.place_food() {
            self.end(GameStatus::Won);
        }
    }

    fn end(&mut self, outcome: GameStatus) {
        if self.life.finish(outcome) {
            let stats = self.stats();
            self.life.report(stats, self.score, self.score > 0);
        }
    }
}

impl GameSession for Snake {
    type Input = SnakeInput;

    fn kind(&self) -> GameKind {
        GameKind::Snake
    }

    fn status(&self) -> GameStatus {
        self.life.status()
    }

    fn start(&mut self) -> bool {
        if !self.life.start() {
            return false;
        }
        let centre = Coord::new(self.config.rows / 2, self.config.cols / 2);
        self.body = (0..self.config.initial_length)
            .map(|i| Coord::new(centre.row, centre.col - i))
            .collect();
        if !self.place_food() {
            tracing::debug!(len = self.body.len(), "snake fills the board at start");
            self.end(GameStatus::Won);
        }
        true
    }

    fn pause(&mut self) -> bool {
        self.life.pause()
    }

    fn resume(&mut self) -> bool {
        self.life.resume()
    }

    fn apply(&mut self, input: SnakeInput) -> bool {
        if !self.life.is_playing() {
            return false;
        }
        let SnakeInput::Turn(direction) = input;
        // Checked against the heading of the last step, so two quick turns
        // cannot add up to a reversal.
        if direction == self.heading.opposite() || Some(direction) == self.queued {
            return false;
        }
        if direction == self.heading && self.queued.is_none() {
            return false;
        }
        self.queued = Some(direction);
        true
    }

    fn tick(&mut self, dt: Duration) -> bool {
        if !self.life.advance(dt) {
            return false;
        }
        self.since_step += dt;
        let interval = self.config.step_interval();
        let mut changed = false;
        while self.life.is_playing() && self.since_step >= interval {
            self.since_step -= interval;
            self.step();
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
        GameStats::Snake {
            score: self.score,
            length: self.body.len() as u32,
        }
    }

    fn drain_events(&mut self) -> Vec<GameEvent> {
        self.life.drain_events()
    }
}
