//! Time and ownership for Playfield sessions.
//!
//! - [`TickScheduler`]: fixed-rate ticks with a constant `dt`
//! - [`GameDriver`]: owns one session and serializes everything that
//!   touches it
//! - [`Reporter`]: where finished sessions send their stats, scores, and
//!   achievements
//!
//! ```ignore
//! let handle = GameDriver::spawn(snake, DriverConfig::default(), Arc::new(NullReporter));
//! handle.input(SnakeInput::Turn(Direction::Up)).await?;
//! let view = handle.view();
//! let snake = handle.stop().await?;
//! ```

mod driver;
mod report;
mod scheduler;

pub use driver::{DriverConfig, DriverError, DriverHandle, GameDriver};
pub use report::{
    dispatch, LeaderboardEntry, NullReporter, ReportError, Reporter, RetryPolicy,
};
pub use scheduler::{TickConfig, TickInfo, TickPolicy, TickScheduler, TickStats};
