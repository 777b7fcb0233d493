//! Forwarding session events to the persistence collaborators.
//!
//! The stats store, leaderboard, and achievement store live outside this
//! workspace. A [`Reporter`] is the seam: the driver hands it every event a
//! session queues, each on its own task, with a bounded number of retries.
//! A report that still fails is logged and dropped; gameplay never waits
//! on it. The tasks belong to the driver's [`JoinSet`], so stopping the
//! driver cancels whatever is still in flight.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use playfield_games::{AchievementId, GameEvent, GameStats, StatsRecord};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// A leaderboard row: the session's candidate plus who and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub nickname: String,
    pub score: u64,
    pub metrics: GameStats,
    pub timestamp_ms: u64,
}

/// Why a report did not go through.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportError {
    /// The collaborator could not be reached. Worth retrying.
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    /// The collaborator refused the record. Retrying will not help.
    #[error("report rejected: {0}")]
    Rejected(String),
}

impl ReportError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Receives the records a finished session produces.
///
/// Implementations are shared across tasks, so methods take `&self`.
pub trait Reporter: Send + Sync + 'static {
    fn record_stats(
        &self,
        record: StatsRecord,
    ) -> impl Future<Output = Result<(), ReportError>> + Send;

    fn submit_score(
        &self,
        entry: LeaderboardEntry,
    ) -> impl Future<Output = Result<(), ReportError>> + Send;

    fn unlock_achievement(
        &self,
        id: AchievementId,
    ) -> impl Future<Output = Result<(), ReportError>> + Send;
}

/// Accepts everything and keeps nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    async fn record_stats(&self, _record: StatsRecord) -> Result<(), ReportError> {
        Ok(())
    }

    async fn submit_score(&self, _entry: LeaderboardEntry) -> Result<(), ReportError> {
        Ok(())
    }

    async fn unlock_achievement(&self, _id: AchievementId) -> Result<(), ReportError> {
        Ok(())
    }
}

/// Retry settings for [`dispatch`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total tries per event, including the first.
    pub attempts: u32,
    /// Delay before the second try; doubled after each failure.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(200),
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Sends each event to `reporter` on its own task inside `tasks`.
///
/// Leaderboard candidates are completed with `nickname` and the current
/// time. Returns immediately. Deliveries (retries included) live only as
/// long as `tasks`: aborting or dropping the set cancels them.
pub fn dispatch<R: Reporter>(
    tasks: &mut JoinSet<()>,
    reporter: &Arc<R>,
    events: Vec<GameEvent>,
    nickname: &str,
    retry: &RetryPolicy,
) {
    for event in events {
        let reporter = Arc::clone(reporter);
        let retry = retry.clone();
        let nickname = nickname.to_owned();
        tasks.spawn(async move {
            deliver(reporter.as_ref(), event, &nickname, &retry).await;
        });
    }
}

async fn deliver<R: Reporter>(
    reporter: &R,
    event: GameEvent,
    nickname: &str,
    retry: &RetryPolicy,
) {
    let kind = match &event {
        GameEvent::Stats(_) => "stats",
        GameEvent::Leaderboard(_) => "leaderboard",
        GameEvent::Achievement { .. } => "achievement",
    };
    let mut delay = retry.backoff;

    for attempt in 1..=retry.attempts.max(1) {
        let result = match &event {
            GameEvent::Stats(record) => reporter.record_stats(record.clone()).await,
            GameEvent::Leaderboard(candidate) => {
                let entry = LeaderboardEntry {
                    nickname: nickname.to_owned(),
                    score: candidate.score,
                    metrics: candidate.metrics.clone(),
                    timestamp_ms: now_ms(),
                };
                reporter.submit_score(entry).await
            }
            GameEvent::Achievement { id } => reporter.unlock_achievement(*id).await,
        };

        match result {
            Ok(()) => {
                debug!(kind, attempt, "report delivered");
                return;
            }
            Err(err) if err.is_retryable() && attempt < retry.attempts => {
                debug!(kind, attempt, %err, "report failed, retrying");
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(err) => {
                warn!(kind, attempt, %err, "report dropped");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use playfield_games::GameKind;

    use super::*;

    /// Fails the first `failures` calls of each kind with `error`.
    struct Flaky {
        failures: u32,
        error: ReportError,
        calls: AtomicU32,
        stored: Mutex<Vec<String>>,
    }

    impl Flaky {
        fn new(failures: u32, error: ReportError) -> Self {
            Self {
                failures,
                error,
                calls: AtomicU32::new(0),
                stored: Mutex::new(Vec::new()),
            }
        }

        fn attempt(&self, what: String) -> Result<(), ReportError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(self.error.clone());
            }
            self.stored.lock().unwrap().push(what);
            Ok(())
        }
    }

    impl Reporter for Flaky {
        async fn record_stats(&self, record: StatsRecord) -> Result<(), ReportError> {
            self.attempt(format!("stats:{}", record.game_type))
        }

        async fn submit_score(&self, entry: LeaderboardEntry) -> Result<(), ReportError> {
            self.attempt(format!("score:{}:{}", entry.nickname, entry.score))
        }

        async fn unlock_achievement(&self, id: AchievementId) -> Result<(), ReportError> {
            self.attempt(format!("achievement:{id:?}"))
        }
    }

    fn stats_event() -> GameEvent {
        GameEvent::Stats(StatsRecord::from(GameStats::Snake {
            score: 30,
            length: 6,
        }))
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let reporter = Flaky::new(2, ReportError::Unavailable("down".into()));
        deliver(&reporter, stats_event(), "ada", &RetryPolicy::default()).await;

        assert_eq!(reporter.calls.load(Ordering::SeqCst), 3);
        assert_eq!(*reporter.stored.lock().unwrap(), vec!["stats:snake"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_attempts() {
        let reporter = Flaky::new(10, ReportError::Unavailable("down".into()));
        deliver(&reporter, stats_event(), "ada", &RetryPolicy::default()).await;

        assert_eq!(reporter.calls.load(Ordering::SeqCst), 3);
        assert!(reporter.stored.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_is_not_retried() {
        let reporter = Flaky::new(1, ReportError::Rejected("bad".into()));
        deliver(&reporter, stats_event(), "ada", &RetryPolicy::default()).await;
        assert_eq!(reporter.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_aborting_the_set_cancels_retries() {
        let reporter = Arc::new(Flaky::new(10, ReportError::Unavailable("down".into())));
        let mut tasks = JoinSet::new();
        let retry = RetryPolicy {
            attempts: 5,
            backoff: Duration::from_secs(1),
        };
        dispatch(&mut tasks, &reporter, vec![stats_event()], "ada", &retry);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(reporter.calls.load(Ordering::SeqCst), 1);

        tasks.shutdown().await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(reporter.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_candidate_gets_nickname() {
        let reporter = Flaky::new(0, ReportError::Rejected(String::new()));
        let event = GameEvent::Leaderboard(playfield_games::LeaderboardCandidate {
            game: GameKind::Snake,
            score: 30,
            metrics: GameStats::Snake {
                score: 30,
                length: 6,
            },
        });
        deliver(&reporter, event, "ada", &RetryPolicy::default()).await;
        assert_eq!(*reporter.stored.lock().unwrap(), vec!["score:ada:30"]);
    }
}
