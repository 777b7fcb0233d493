//! Runs one game session on its own Tokio task.
//!
//! The driver owns the session outright. Player input, pause/resume, and
//! ticks all arrive as branches of one `select!` loop, so each mutation
//! finishes before the next one starts and the session never needs a lock.
//!
//! ```text
//!  DriverHandle ─mpsc─→ ┌────── driver task ──────┐
//!                       │ select! {               │
//!                       │   command → apply/pause │ ─watch─→ SessionView
//!                       │   tick    → tick        │
//!                       │   report  → reap        │
//!                       │ }                       │ ─JoinSet─→ Reporter
//!                       └─────────────────────────┘
//! ```
//!
//! Dropping the handle (or calling [`DriverHandle::stop`]) ends the loop,
//! releases the timer, and cancels report deliveries still in flight.

use std::sync::Arc;

use playfield_games::{GameSession, SessionView};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, trace, warn};

use crate::report::{dispatch, Reporter, RetryPolicy};
use crate::scheduler::{TickConfig, TickScheduler};

/// Driver settings.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub tick: TickConfig,
    /// Name attached to leaderboard entries.
    pub nickname: String,
    pub retry: RetryPolicy,
    /// Capacity of the command channel.
    pub channel_size: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick: TickConfig::default(),
            nickname: "anonymous".into(),
            retry: RetryPolicy::default(),
            channel_size: 64,
        }
    }
}

/// Errors returned by [`DriverHandle`].
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("driver task has stopped")]
    Closed,

    #[error("driver task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

enum Command<I> {
    Input { input: I, reply: oneshot::Sender<bool> },
    Pause { reply: oneshot::Sender<bool> },
    Resume { reply: oneshot::Sender<bool> },
    Stop,
}

/// Control side of a running driver.
pub struct DriverHandle<G: GameSession> {
    tx: mpsc::Sender<Command<G::Input>>,
    view: watch::Receiver<SessionView>,
    task: JoinHandle<G>,
}

impl<G: GameSession> DriverHandle<G> {
    async fn request(
        &self,
        make: impl FnOnce(oneshot::Sender<bool>) -> Command<G::Input>,
    ) -> Result<bool, DriverError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(make(reply)).await.map_err(|_| DriverError::Closed)?;
        rx.await.map_err(|_| DriverError::Closed)
    }

    /// Applies one input. Resolves to whether the session changed.
    pub async fn input(&self, input: G::Input) -> Result<bool, DriverError> {
        self.request(|reply| Command::Input { input, reply }).await
    }

    pub async fn pause(&self) -> Result<bool, DriverError> {
        self.request(|reply| Command::Pause { reply }).await
    }

    pub async fn resume(&self) -> Result<bool, DriverError> {
        self.request(|reply| Command::Resume { reply }).await
    }

    /// The latest published view.
    pub fn view(&self) -> SessionView {
        *self.view.borrow()
    }

    /// A receiver that is notified after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    /// Stops the driver and returns the session in its final state.
    pub async fn stop(self) -> Result<G, DriverError> {
        // The task may already be gone; joining tells us either way.
        let _ = self.tx.send(Command::Stop).await;
        Ok(self.task.await?)
    }
}

/// Spawns session drivers.
pub struct GameDriver;

impl GameDriver {
    /// Starts `game` (if still idle) and drives it on a new task.
    pub fn spawn<G, R>(mut game: G, config: DriverConfig, reporter: Arc<R>) -> DriverHandle<G>
    where
        G: GameSession,
        R: Reporter,
    {
        game.start();
        let (tx, rx) = mpsc::channel(config.channel_size.max(1));
        let (view_tx, view) = watch::channel(game.view());
        let task = tokio::spawn(run(game, config, reporter, rx, view_tx));
        DriverHandle { tx, view, task }
    }
}

async fn run<G: GameSession, R: Reporter>(
    mut game: G,
    config: DriverConfig,
    reporter: Arc<R>,
    mut rx: mpsc::Receiver<Command<G::Input>>,
    view_tx: watch::Sender<SessionView>,
) -> G {
    let kind = game.kind();
    let mut scheduler = TickScheduler::new(config.tick.clone());
    let mut reports = JoinSet::new();
    info!(game = %kind, nickname = %config.nickname, "driver started");

    loop {
        let changed = tokio::select! {
            cmd = rx.recv() => match cmd {
                Some(Command::Input { input, reply }) => {
                    trace!(game = %kind, ?input, "input");
                    let changed = game.apply(input);
                    let _ = reply.send(changed);
                    changed
                }
                Some(Command::Pause { reply }) => {
                    let changed = game.pause();
                    if changed {
                        scheduler.pause();
                    }
                    let _ = reply.send(changed);
                    changed
                }
                Some(Command::Resume { reply }) => {
                    let changed = game.resume();
                    if changed {
                        scheduler.resume();
                    }
                    let _ = reply.send(changed);
                    changed
                }
                Some(Command::Stop) | None => break,
            },
            tick = scheduler.wait_for_tick() => {
                game.tick(tick.dt);
                scheduler.record_tick_end();
                // The clock moved even if the board did not.
                true
            }
            Some(done) = reports.join_next(), if !reports.is_empty() => {
                if let Err(err) = done {
                    warn!(game = %kind, %err, "report task failed");
                }
                false
            }
        };

        if changed {
            view_tx.send_replace(game.view());
        }

        let events = game.drain_events();
        if !events.is_empty() {
            debug!(game = %kind, count = events.len(), "forwarding session events");
            dispatch(&mut reports, &reporter, events, &config.nickname, &config.retry);
        }

        if game.status().is_terminal() && !scheduler.is_paused() {
            info!(game = %kind, status = %game.status(), score = game.score(), "session over");
            scheduler.pause();
        }
    }

    if !reports.is_empty() {
        debug!(game = %kind, pending = reports.len(), "cancelling undelivered reports");
    }
    reports.shutdown().await;
    debug!(game = %kind, ticks = scheduler.tick_count(), "driver stopped");
    game
}
