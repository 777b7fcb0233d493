//! Fixed-timestep tick scheduler.
//!
//! Sessions never read the wall clock. The scheduler wakes the driver at a
//! fixed rate and hands it a constant `dt`, so a session's timeline is a
//! pure function of how many ticks it has seen.
//!
//! # Event-driven mode
//!
//! With `tick_rate_hz == 0`, [`TickScheduler::wait_for_tick`] never
//! resolves. A driver for a game with no clock still polls it inside its
//! `select!`; the branch simply never wins.

use std::time::{Duration, Instant};

use playfield_games::GameKind;
use rand::Rng;
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when the driver wakes up late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickPolicy {
    /// Forget the missed ticks and schedule from now.
    #[default]
    Skip,
    /// Fire missed ticks back to back, at most `max_catchup` of them.
    CatchUp { max_catchup: u32 },
    /// Keep the original cadence and accept the lateness.
    Drop,
}

/// Scheduler settings.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Ticks per second. 0 = event-driven.
    pub tick_rate_hz: u32,
    pub policy: TickPolicy,
    /// Fraction of the tick budget above which slow ticks are logged.
    pub budget_warn_threshold: f64,
    /// Up to this many microseconds of random delay before the first tick,
    /// so sessions created together do not tick in lockstep.
    pub initial_jitter_us: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,
            policy: TickPolicy::default(),
            budget_warn_threshold: 0.8,
            initial_jitter_us: 2_000,
        }
    }
}

impl TickConfig {
    pub const MAX_TICK_RATE_HZ: u32 = 128;

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz,
            ..Default::default()
        }
    }

    /// A rate suited to `kind`: fast for the falling and moving games,
    /// slow for the ones whose clock only feeds stats or a countdown.
    pub fn for_game(kind: GameKind) -> Self {
        match kind {
            GameKind::Tetris | GameKind::Snake => Self::with_rate(60),
            GameKind::Game2048 | GameKind::Minesweeper | GameKind::Typing => Self::with_rate(10),
        }
    }

    /// Clamps out-of-range values. Called by [`TickScheduler::new`].
    pub fn validated(mut self) -> Self {
        if self.tick_rate_hz > Self::MAX_TICK_RATE_HZ {
            warn!(
                rate = self.tick_rate_hz,
                max = Self::MAX_TICK_RATE_HZ,
                "tick rate above maximum, clamping"
            );
            self.tick_rate_hz = Self::MAX_TICK_RATE_HZ;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self
    }

    /// Length of one tick, or `None` in event-driven mode.
    pub fn tick_duration(&self) -> Option<Duration> {
        (self.tick_rate_hz > 0).then(|| Duration::from_secs_f64(1.0 / f64::from(self.tick_rate_hz)))
    }
}

/// Returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickInfo {
    /// Starts at 1.
    pub tick: u64,
    /// Always the configured tick duration, never measured time.
    pub dt: Duration,
    pub overrun: bool,
    pub ticks_skipped: u64,
}

/// Counters kept by the scheduler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickStats {
    pub ticks: u64,
    pub overruns: u64,
    pub skipped: u64,
    pub slow_ticks: u64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// One scheduler per driven session.
#[derive(Debug)]
pub struct TickScheduler {
    config: TickConfig,
    tick_duration: Option<Duration>,
    next_tick: Option<TokioInstant>,
    /// Set when a tick fires, taken by `record_tick_end`.
    tick_start: Option<Instant>,
    paused: bool,
    stats: TickStats,
}

impl TickScheduler {
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let tick_duration = config.tick_duration();

        let next_tick = tick_duration.map(|d| {
            let jitter = match config.initial_jitter_us {
                0 => Duration::ZERO,
                max => Duration::from_micros(rand::rng().random_range(0..max)),
            };
            TokioInstant::now() + d + jitter
        });

        match tick_duration {
            None => debug!("tick scheduler is event-driven"),
            Some(d) => debug!(
                rate_hz = config.tick_rate_hz,
                tick_ms = d.as_secs_f64() * 1000.0,
                policy = ?config.policy,
                "tick scheduler created"
            ),
        }

        Self {
            config,
            tick_duration,
            next_tick,
            tick_start: None,
            paused: false,
            stats: TickStats::default(),
        }
    }

    /// Waits for the next tick. Pends forever when paused or event-driven.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let (next, dt) = match (self.next_tick, self.tick_duration) {
            (Some(next), Some(dt)) if !self.paused => (next, dt),
            _ => std::future::pending().await,
        };

        time::sleep_until(next).await;

        let now = TokioInstant::now();
        self.stats.ticks += 1;
        self.tick_start = Some(Instant::now());

        let late_by = now.saturating_duration_since(next);
        let overrun = late_by > dt / 10;
        let behind = (late_by.as_nanos() / dt.as_nanos()) as u64;
        let mut ticks_skipped = 0;

        self.next_tick = Some(match self.config.policy {
            TickPolicy::Skip => {
                if overrun {
                    ticks_skipped = behind;
                }
                now + dt
            }
            TickPolicy::CatchUp { max_catchup } => {
                ticks_skipped = behind.saturating_sub(u64::from(max_catchup));
                if behind <= u64::from(max_catchup) {
                    next + dt
                } else {
                    now + dt
                }
            }
            TickPolicy::Drop => next + dt,
        });

        if overrun {
            self.stats.overruns += 1;
            warn!(
                tick = self.stats.ticks,
                late_ms = late_by.as_secs_f64() * 1000.0,
                skipped = ticks_skipped,
                policy = ?self.config.policy,
                "tick fired late"
            );
        }
        self.stats.skipped += ticks_skipped;
        trace!(tick = self.stats.ticks, "tick");

        TickInfo {
            tick: self.stats.ticks,
            dt,
            overrun,
            ticks_skipped,
        }
    }

    /// Marks the end of the work done for the current tick.
    pub fn record_tick_end(&mut self) {
        let (Some(start), Some(budget)) = (self.tick_start.take(), self.tick_duration) else {
            return;
        };
        let used = start.elapsed().as_secs_f64() / budget.as_secs_f64();
        if used >= self.config.budget_warn_threshold {
            self.stats.slow_ticks += 1;
            warn!(
                tick = self.stats.ticks,
                budget_pct = format!("{:.1}", used * 100.0),
                "tick used most of its budget"
            );
        }
    }

    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(tick = self.stats.ticks, "ticks paused");
        }
    }

    /// Resumes ticking one full tick from now, so time spent paused does
    /// not turn into a burst of ticks.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.next_tick = self.tick_duration.map(|d| TokioInstant::now() + d);
            debug!(tick = self.stats.ticks, "ticks resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_event_driven(&self) -> bool {
        self.tick_duration.is_none()
    }

    pub fn tick_count(&self) -> u64 {
        self.stats.ticks
    }

    pub fn stats(&self) -> &TickStats {
        &self.stats
    }

    pub fn tick_duration(&self) -> Option<Duration> {
        self.tick_duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_jitter(rate: u32) -> TickConfig {
        TickConfig {
            initial_jitter_us: 0,
            ..TickConfig::with_rate(rate)
        }
    }

    #[test]
    fn test_rate_is_clamped() {
        let config = TickConfig::with_rate(1_000).validated();
        assert_eq!(config.tick_rate_hz, TickConfig::MAX_TICK_RATE_HZ);
    }

    #[test]
    fn test_zero_rate_is_event_driven() {
        let scheduler = TickScheduler::new(TickConfig::with_rate(0));
        assert!(scheduler.is_event_driven());
        assert_eq!(scheduler.tick_duration(), None);
    }

    #[test]
    fn test_game_rates() {
        assert_eq!(TickConfig::for_game(GameKind::Tetris).tick_rate_hz, 60);
        assert_eq!(TickConfig::for_game(GameKind::Typing).tick_rate_hz, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_have_fixed_dt() {
        let mut scheduler = TickScheduler::new(no_jitter(20));
        for expected in 1..=3 {
            let info = scheduler.wait_for_tick().await;
            assert_eq!(info.tick, expected);
            assert_eq!(info.dt, Duration::from_millis(50));
            assert!(!info.overrun);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_paused_scheduler_pends() {
        let mut scheduler = TickScheduler::new(no_jitter(20));
        scheduler.wait_for_tick().await;
        scheduler.pause();

        let waited = time::timeout(Duration::from_secs(1), scheduler.wait_for_tick()).await;
        assert!(waited.is_err());

        scheduler.resume();
        assert_eq!(scheduler.wait_for_tick().await.tick, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skip_policy_counts_missed_ticks() {
        let mut scheduler = TickScheduler::new(no_jitter(10));
        scheduler.wait_for_tick().await;

        // Stall for three and a half ticks.
        time::advance(Duration::from_millis(450)).await;
        let info = scheduler.wait_for_tick().await;
        assert!(info.overrun);
        assert_eq!(info.ticks_skipped, 3);
        assert_eq!(scheduler.stats().overruns, 1);
    }
}
