//! Deterministic randomness for Playfield.
//!
//! Every "random" thing a mini-game does (the next tetromino, where the
//! mines go, which cell gets the new 2048 tile) is drawn from a
//! [`SeededRandom`]. Two clients that start from the same seed and make
//! the same draws in the same order see exactly the same values, which
//! is what lets two players race on identical boards without a server
//! running the simulation.
//!
//! # Layers
//!
//! ```text
//! SeededRandom (raw stream) → consumers (bag, mine layout, spawns) → game sessions
//! ```
//!
//! - [`SeededRandom`]: the Park–Miller minimal-standard generator.
//! - [`BagRandomizer`]: "7-bag" style balanced draws.
//! - [`mine_layout`]: first-click-safe Minesweeper mines.
//! - [`spawn_tile`] / [`spawn_food`]: picks from the currently empty cells.
//!
//! Consumers never hold a generator of their own. The generator is an
//! owned value passed in explicitly, so two sessions in one process can
//! never share state by accident.

mod bag;
mod coord;
mod error;
mod fingerprint;
mod minefield;
mod seeded;
mod spawn;

pub use bag::BagRandomizer;
pub use coord::Coord;
pub use error::RandomError;
pub use fingerprint::Fingerprint;
pub use minefield::{mine_layout, safe_zone};
pub use seeded::{Checkpoint, SeededRandom, MODULUS, MULTIPLIER};
pub use spawn::{spawn_food, spawn_tile, TileSpawn, FOUR_PROBABILITY};
